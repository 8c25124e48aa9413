//! 내장 워크플로우 레지스트리
//!
//! 워크플로우는 [`WorkflowContext`]를 받아 [`Scenario`]를 만드는 빌더 함수입니다.
//! CLI의 `run`, `list`, `validate`, `down` 명령이 이 레지스트리를 조회합니다.

pub mod kafka_multi_broker;

use std::path::{Path, PathBuf};

use stagehand_core::error::TopologyError;

use crate::error::ScenarioError;
use crate::scenario::Scenario;

/// 워크플로우 빌더 함수 타입
pub type WorkflowBuilder = fn(&WorkflowContext) -> Result<Scenario, TopologyError>;

/// 워크플로우 빌드에 필요한 외부 입력
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowContext {
    /// 테스트 드라이버에 마운트할 스크립트 디렉토리 (호스트 경로)
    pub scripts_dir: PathBuf,
}

impl WorkflowContext {
    pub fn new(scripts_dir: impl Into<PathBuf>) -> Self {
        Self {
            scripts_dir: scripts_dir.into(),
        }
    }

    pub fn scripts_dir(&self) -> &Path {
        &self.scripts_dir
    }
}

impl Default for WorkflowContext {
    fn default() -> Self {
        Self::new(".")
    }
}

/// 레지스트리 항목
#[derive(Debug, Clone, Copy)]
pub struct WorkflowEntry {
    /// 워크플로우 이름
    pub name: &'static str,
    /// 한 줄 설명
    pub description: &'static str,
    builder: WorkflowBuilder,
}

/// 이름으로 워크플로우를 찾는 레지스트리
#[derive(Debug, Clone, Default)]
pub struct WorkflowRegistry {
    entries: Vec<WorkflowEntry>,
}

impl WorkflowRegistry {
    /// 빈 레지스트리
    pub fn new() -> Self {
        Self::default()
    }

    /// 내장 워크플로우가 등록된 레지스트리
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(
            kafka_multi_broker::NAME,
            kafka_multi_broker::DESCRIPTION,
            kafka_multi_broker::build,
        );
        registry
    }

    /// 워크플로우를 등록합니다. 같은 이름이 있으면 교체합니다.
    pub fn register(
        &mut self,
        name: &'static str,
        description: &'static str,
        builder: WorkflowBuilder,
    ) {
        let entry = WorkflowEntry {
            name,
            description,
            builder,
        };
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// 등록 순서대로 이름을 반환합니다.
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.name).collect()
    }

    pub fn entries(&self) -> &[WorkflowEntry] {
        &self.entries
    }

    /// 워크플로우를 빌드하고 액션 참조까지 검증합니다.
    ///
    /// # Errors
    ///
    /// - `ScenarioError::UnknownWorkflow`: 등록되지 않은 이름
    /// - `ScenarioError::InvalidScenario`: 빌더가 만든 토폴로지/액션이 유효하지 않음
    pub fn build(&self, name: &str, ctx: &WorkflowContext) -> Result<Scenario, ScenarioError> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| ScenarioError::UnknownWorkflow(name.to_owned()))?;
        let scenario = (entry.builder)(ctx)?;
        scenario.validate()?;
        Ok(scenario)
    }
}
