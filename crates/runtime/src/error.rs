//! 컨테이너 런타임 에러 타입
//!
//! [`RuntimeError`]는 런타임 구현(Docker, mock) 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<RuntimeError> for StagehandError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use stagehand_core::error::StagehandError;

/// 컨테이너 런타임 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// Docker API 호출 실패
    #[error("docker api error: {0}")]
    Docker(String),

    /// Docker 데몬 연결 실패
    #[error("docker connection error: {0}")]
    Connection(String),

    /// 서비스 컨테이너가 존재하지 않음
    #[error("service container not found: {0}")]
    NotFound(String),

    /// 서비스가 실행 중이 아님
    #[error("service is not running: {0}")]
    NotRunning(String),

    /// 컨테이너 이름으로 사용할 수 없는 서비스 이름
    #[error("invalid service name '{name}': {reason}")]
    InvalidName {
        /// 문제가 된 서비스 이름
        name: String,
        /// 거부 사유
        reason: String,
    },
}

impl From<RuntimeError> for StagehandError {
    fn from(err: RuntimeError) -> Self {
        StagehandError::Runtime(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_running_display() {
        let err = RuntimeError::NotRunning("kafka1".to_owned());
        assert_eq!(err.to_string(), "service is not running: kafka1");
    }

    #[test]
    fn invalid_name_display() {
        let err = RuntimeError::InvalidName {
            name: "Kafka 1".to_owned(),
            reason: "contains invalid characters".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Kafka 1"));
        assert!(msg.contains("invalid characters"));
    }

    #[test]
    fn converts_to_stagehand_error() {
        let err: StagehandError = RuntimeError::Connection("socket not found".to_owned()).into();
        assert!(matches!(err, StagehandError::Runtime(ref msg) if msg.contains("socket not found")));
    }
}
