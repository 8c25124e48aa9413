//! 시나리오 에러 타입
//!
//! [`ScenarioError`]는 시나리오 정의, 로딩, 실행 중 발생하는 모든 에러를 나타냅니다.
//!
//! # 에러 카테고리
//!
//! - **정의 오류** (컨테이너 시작 전 검출): `InvalidScenario`, `UnknownWorkflow`, `Load`
//! - **실행 실패**: `StartupTimeout`, `CommandFailed`, `ServiceNotRunning`, `Runtime`
//! - **위치 정보**: `Step`이 실행 실패를 감싸 몇 번째 액션에서 실패했는지 알려줍니다.

use stagehand_core::error::{StagehandError, TopologyError};
use stagehand_runtime::RuntimeError;

/// 시나리오 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// 토폴로지 또는 액션 참조가 유효하지 않음
    #[error("invalid scenario: {0}")]
    InvalidScenario(#[from] TopologyError),

    /// 서비스가 제한 시간 내에 TCP 연결을 받지 않음
    #[error("service '{service}' was not reachable within {timeout_secs}s")]
    StartupTimeout {
        /// 대상 서비스
        service: String,
        /// 적용된 제한 시간 (초)
        timeout_secs: u64,
    },

    /// 일회성 클라이언트가 0이 아닌 코드로 종료
    #[error("command on '{service}' exited with code {exit_code}")]
    CommandFailed {
        /// 클라이언트 서비스
        service: String,
        /// 종료 코드
        exit_code: i64,
    },

    /// kill 대상 서비스가 실행 중이 아님
    #[error("service is not running: {0}")]
    ServiceNotRunning(String),

    /// 컨테이너 런타임 에러
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// 등록되지 않은 워크플로우 이름
    #[error("unknown workflow: {0}")]
    UnknownWorkflow(String),

    /// 시나리오 파일 로딩 실패
    #[error("failed to load scenario {path}: {reason}")]
    Load {
        /// 파일 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 특정 단계에서 발생한 실패
    #[error("step {step} ({action}) failed: {source}")]
    Step {
        /// 1부터 시작하는 단계 번호
        step: usize,
        /// 액션 설명
        action: String,
        /// 원인 에러
        source: Box<ScenarioError>,
    },
}

impl ScenarioError {
    /// `Step` 래핑을 벗겨낸 원인 에러를 반환합니다.
    pub fn root_cause(&self) -> &ScenarioError {
        let mut current = self;
        while let Self::Step { source, .. } = current {
            current = source;
        }
        current
    }

    /// 실패한 단계 번호 (`Step`으로 감싸진 경우)
    pub fn step(&self) -> Option<usize> {
        match self {
            Self::Step { step, .. } => Some(*step),
            _ => None,
        }
    }
}

impl From<ScenarioError> for StagehandError {
    fn from(err: ScenarioError) -> Self {
        match err.root_cause() {
            ScenarioError::InvalidScenario(topology) => StagehandError::Topology(topology.clone()),
            ScenarioError::Runtime(_) => StagehandError::Runtime(err.to_string()),
            _ => StagehandError::Scenario(err.to_string()),
        }
    }
}
