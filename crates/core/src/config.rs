//! 설정 관리: stagehand.toml 파싱 및 런타임 설정
//!
//! [`StagehandConfig`]는 모든 크레이트의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`STAGEHAND_SCENARIO_PAUSE_UNIT_MS=10` 형식)
//! 3. 설정 파일 (`stagehand.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), stagehand_core::error::StagehandError> {
//! use stagehand_core::config::StagehandConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = StagehandConfig::load("stagehand.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = StagehandConfig::parse("[scenario]\npause_unit_ms = 10")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, StagehandError};

/// 설정 상한값 상수
const MAX_STARTUP_TIMEOUT_SECS: u64 = 3600;
const MIN_PROBE_INTERVAL_MS: u64 = 10;
const MAX_PROBE_INTERVAL_MS: u64 = 60_000;
const MAX_PAUSE_UNIT_MS: u64 = 60_000;

/// Stagehand 통합 설정
///
/// `stagehand.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StagehandConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 컨테이너 런타임 설정
    #[serde(default)]
    pub runtime: RuntimeConfig,
    /// 시나리오 실행 설정
    #[serde(default)]
    pub scenario: ScenarioConfig,
}

impl StagehandConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, StagehandError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 파일이 없으면 기본값에 환경변수 오버라이드만 적용합니다.
    ///
    /// 파일이 존재하지만 파싱/검증에 실패하면 에러를 반환합니다.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, StagehandError> {
        match Self::load(path.as_ref()).await {
            Err(StagehandError::Config(ConfigError::FileNotFound { path })) => {
                tracing::debug!(path = %path, "config file not found, using defaults");
                let mut config = Self::default();
                config.apply_env_overrides();
                config.validate()?;
                Ok(config)
            }
            other => other,
        }
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, StagehandError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StagehandError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                StagehandError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, StagehandError> {
        toml::from_str(toml_str).map_err(|e| {
            StagehandError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `STAGEHAND_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "STAGEHAND_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "STAGEHAND_GENERAL_LOG_FORMAT");

        // Runtime
        override_string(
            &mut self.runtime.docker_socket,
            "STAGEHAND_RUNTIME_DOCKER_SOCKET",
        );
        override_string(&mut self.runtime.project, "STAGEHAND_RUNTIME_PROJECT");
        override_bool(&mut self.runtime.pull_images, "STAGEHAND_RUNTIME_PULL_IMAGES");

        // Scenario
        override_u64(
            &mut self.scenario.startup_timeout_secs,
            "STAGEHAND_SCENARIO_STARTUP_TIMEOUT_SECS",
        );
        override_u64(
            &mut self.scenario.probe_interval_ms,
            "STAGEHAND_SCENARIO_PROBE_INTERVAL_MS",
        );
        override_u64(
            &mut self.scenario.pause_unit_ms,
            "STAGEHAND_SCENARIO_PAUSE_UNIT_MS",
        );
        override_string(
            &mut self.scenario.scripts_dir,
            "STAGEHAND_SCENARIO_SCRIPTS_DIR",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), StagehandError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.runtime.docker_socket.is_empty() {
            return Err(invalid(
                "runtime.docker_socket",
                "must not be empty".to_owned(),
            ));
        }

        // 프로젝트명은 컨테이너/네트워크 이름 접두어로 쓰임
        let project = &self.runtime.project;
        if project.is_empty()
            || !project
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        {
            return Err(invalid(
                "runtime.project",
                "must be non-empty and contain only [a-z0-9_-]".to_owned(),
            ));
        }

        let scenario = &self.scenario;
        if scenario.startup_timeout_secs == 0
            || scenario.startup_timeout_secs > MAX_STARTUP_TIMEOUT_SECS
        {
            return Err(invalid(
                "scenario.startup_timeout_secs",
                format!("must be 1-{MAX_STARTUP_TIMEOUT_SECS}"),
            ));
        }

        if scenario.probe_interval_ms < MIN_PROBE_INTERVAL_MS
            || scenario.probe_interval_ms > MAX_PROBE_INTERVAL_MS
        {
            return Err(invalid(
                "scenario.probe_interval_ms",
                format!("must be {MIN_PROBE_INTERVAL_MS}-{MAX_PROBE_INTERVAL_MS}"),
            ));
        }

        if scenario.pause_unit_ms == 0 || scenario.pause_unit_ms > MAX_PAUSE_UNIT_MS {
            return Err(invalid(
                "scenario.pause_unit_ms",
                format!("must be 1-{MAX_PAUSE_UNIT_MS}"),
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: String) -> StagehandError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 컨테이너 런타임 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Docker 소켓 경로
    pub docker_socket: String,
    /// 컨테이너/네트워크 이름 접두어
    pub project: String,
    /// 로컬에 없는 이미지를 pull 할지 여부
    pub pull_images: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            docker_socket: "/var/run/docker.sock".to_owned(),
            project: "stagehand".to_owned(),
            pull_images: true,
        }
    }
}

/// 시나리오 실행 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// start-and-wait 준비 대기 상한 (초)
    pub startup_timeout_secs: u64,
    /// TCP 준비 상태 확인 주기 (밀리초)
    pub probe_interval_ms: u64,
    /// pause 액션 1단위의 길이 (밀리초)
    pub pause_unit_ms: u64,
    /// 테스트 스크립트 디렉토리 (테스트 드라이버에 마운트)
    pub scripts_dir: String,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            startup_timeout_secs: 120,
            probe_interval_ms: 500,
            pause_unit_ms: 1000,
            scripts_dir: ".".to_owned(),
        }
    }
}

impl ScenarioConfig {
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }

    pub fn pause_unit(&self) -> Duration {
        Duration::from_millis(self.pause_unit_ms)
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
