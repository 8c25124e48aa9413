//! 에러 타입: 도메인별 에러 정의

/// Stagehand 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum StagehandError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 토폴로지/시나리오 정의 에러
    #[error("topology error: {0}")]
    Topology(#[from] TopologyError),

    /// 컨테이너 런타임 에러
    #[error("runtime error: {0}")]
    Runtime(String),

    /// 시나리오 실행 에러
    #[error("scenario error: {0}")]
    Scenario(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 토폴로지 및 액션 참조 에러
///
/// 컨테이너를 하나라도 시작하기 전에 검출되어야 하는 정의 오류입니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopologyError {
    /// 서비스 이름이 비어 있음
    #[error("service name must not be empty")]
    EmptyName,

    /// 컨테이너/네트워크 이름으로 쓸 수 없는 서비스 이름
    #[error("invalid service name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// 중복된 서비스 이름
    #[error("duplicate service name: {0}")]
    DuplicateService(String),

    /// 선언되지 않은 서비스를 참조
    #[error("'{referrer}' references undeclared service '{name}'")]
    UnknownReference { referrer: String, name: String },

    /// 중복된 브로커 ID
    #[error("broker id {broker_id} is used by both '{first}' and '{second}'")]
    DuplicateBrokerId {
        broker_id: u32,
        first: String,
        second: String,
    },

    /// 토폴로지에 없는 서비스
    #[error("unknown service: {0}")]
    UnknownService(String),

    /// 대상 서비스 목록이 비어 있음
    #[error("action '{action}' has no target services")]
    EmptyTargets { action: String },

    /// 데몬으로 실행할 수 없는 일회성 서비스를 대상으로 지정
    #[error("action '{action}' cannot target one-shot service '{service}'")]
    OneShotTarget { action: String, service: String },

    /// 알 수 없는 시그널 이름
    #[error("unknown signal: {0}")]
    InvalidSignal(String),
}
