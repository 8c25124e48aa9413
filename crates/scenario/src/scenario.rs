//! 시나리오 정의 및 TOML 로딩
//!
//! [`Scenario`]는 토폴로지와 순서 있는 액션 목록을 묶습니다.
//! 파일 형식:
//!
//! ```toml
//! name = "broker-restart"
//! description = "kill and restart one broker"
//!
//! [[services]]
//! name = "zookeeper"
//! image = "confluentinc/cp-zookeeper:5.5.4"
//! port = 2181
//! role = { kind = "coordinator" }
//!
//! [[actions]]
//! kind = "start_and_wait"
//! services = ["zookeeper"]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use stagehand_core::topology::Topology;

use crate::action::Action;
use crate::error::ScenarioError;

/// 시나리오 파일 최대 크기 (1 MiB)
const MAX_SCENARIO_FILE_SIZE: u64 = 1024 * 1024;

/// 토폴로지 + 액션 목록
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// 시나리오 이름
    pub name: String,
    /// 사람이 읽을 설명
    #[serde(default)]
    pub description: String,
    /// 서비스 토폴로지
    pub services: Topology,
    /// 순서대로 실행할 액션
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Scenario {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        services: Topology,
        actions: Vec<Action>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            services,
            actions,
        }
    }

    /// 모든 액션의 참조를 토폴로지에 대해 검증합니다.
    ///
    /// # Errors
    ///
    /// 첫 번째로 잘못된 참조를 `ScenarioError::InvalidScenario`로 반환합니다.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        validate_actions(&self.services, &self.actions)
    }

    /// TOML 문자열에서 시나리오를 파싱하고 검증합니다.
    pub fn from_toml_str(content: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = toml::from_str(content).map_err(|e| ScenarioError::Load {
            path: "<inline>".to_owned(),
            reason: e.to_string(),
        })?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// TOML 파일에서 시나리오를 로드하고 검증합니다.
    ///
    /// # Errors
    ///
    /// - `ScenarioError::Load`: 파일을 읽을 수 없거나 TOML 형식 오류
    /// - `ScenarioError::InvalidScenario`: 액션이 선언되지 않은 서비스를 참조
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        let shown = path.display().to_string();
        let load_err = |reason: String| ScenarioError::Load {
            path: shown.clone(),
            reason,
        };

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| load_err(e.to_string()))?;
        if metadata.len() > MAX_SCENARIO_FILE_SIZE {
            return Err(load_err(format!(
                "file too large: {} bytes (max {MAX_SCENARIO_FILE_SIZE})",
                metadata.len()
            )));
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| load_err(e.to_string()))?;
        let scenario: Scenario =
            toml::from_str(&content).map_err(|e| load_err(e.to_string()))?;
        scenario.validate()?;

        debug!(
            path = shown.as_str(),
            scenario = scenario.name.as_str(),
            services = scenario.services.len(),
            actions = scenario.actions.len(),
            "scenario loaded"
        );
        Ok(scenario)
    }

    /// TOML 문자열로 직렬화합니다.
    pub fn to_toml(&self) -> Result<String, ScenarioError> {
        toml::to_string_pretty(self).map_err(|e| ScenarioError::Load {
            path: self.name.clone(),
            reason: e.to_string(),
        })
    }
}

/// 액션 목록이 토폴로지의 서비스만 참조하는지 검증합니다.
pub(crate) fn validate_actions(
    topology: &Topology,
    actions: &[Action],
) -> Result<(), ScenarioError> {
    for action in actions {
        action.validate(topology)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
name = "single-broker"
description = "start one broker and restart it"

[[services]]
name = "zookeeper"
image = "confluentinc/cp-zookeeper:5.5.4"
port = 2181
role = { kind = "coordinator" }

[[services]]
name = "kafka1"
image = "confluentinc/cp-kafka:5.5.4"
port = 9092
depends_on = ["zookeeper"]
role = { kind = "broker", broker_id = 1, offsets_topic_replication_factor = 1 }

[[actions]]
kind = "start_and_wait"
services = ["zookeeper", "kafka1"]

[[actions]]
kind = "kill"
services = ["kafka1"]
signal = "sigterm"

[[actions]]
kind = "pause"
units = 2

[[actions]]
kind = "start"
services = ["kafka1"]
"#;

    #[test]
    fn parses_sample_scenario() {
        let scenario = Scenario::from_toml_str(SAMPLE).unwrap();
        assert_eq!(scenario.name, "single-broker");
        assert_eq!(scenario.services.len(), 2);
        assert_eq!(scenario.actions.len(), 4);
        assert_eq!(
            scenario.actions[1],
            Action::kill(["kafka1"], stagehand_core::types::Signal::Term)
        );
    }

    #[test]
    fn undeclared_action_target_is_invalid() {
        let content = SAMPLE.replace(r#"services = ["kafka1"]
signal"#, r#"services = ["kafka7"]
signal"#);
        let err = Scenario::from_toml_str(&content).unwrap_err();
        assert!(matches!(err, ScenarioError::InvalidScenario(_)));
        assert!(err.to_string().contains("kafka7"));
    }

    #[test]
    fn undeclared_dependency_is_a_load_error() {
        let content = SAMPLE.replace(r#"depends_on = ["zookeeper"]"#, r#"depends_on = ["zk"]"#);
        let err = Scenario::from_toml_str(&content).unwrap_err();
        match err {
            ScenarioError::Load { reason, .. } => assert!(reason.contains("zk")),
            other => panic!("expected Load error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_toml_is_a_load_error() {
        let err = Scenario::from_toml_str("name = ").unwrap_err();
        assert!(matches!(err, ScenarioError::Load { .. }));
    }

    #[test]
    fn toml_output_parses_back_to_same_scenario() {
        let scenario = Scenario::from_toml_str(SAMPLE).unwrap();
        let rendered = scenario.to_toml().unwrap();
        assert_eq!(Scenario::from_toml_str(&rendered).unwrap(), scenario);
    }

    #[tokio::test]
    async fn from_file_loads_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let scenario = Scenario::from_file(&path).await.unwrap();
        assert_eq!(scenario.actions.len(), 4);
    }

    #[tokio::test]
    async fn from_file_missing_path() {
        let err = Scenario::from_file("/nonexistent/scenario.toml")
            .await
            .unwrap_err();
        match err {
            ScenarioError::Load { path, .. } => assert!(path.contains("nonexistent")),
            other => panic!("expected Load error, got {other:?}"),
        }
    }
}
