//! 도메인 타입: 서비스 선언, 역할, 상태, 시그널
//!
//! 토폴로지를 구성하는 [`ServiceSpec`]과 각 서비스의 [`ServiceRole`]을 정의합니다.
//! 런타임과 시나리오 크레이트는 이 타입들을 공유합니다.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TopologyError;

/// 서비스 역할
///
/// 역할별 파라미터(브로커 ID, 의존 브로커 목록, 엔트리포인트 등)를 함께 담습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServiceRole {
    /// 코디네이션 노드 (ZooKeeper)
    Coordinator,
    /// 메시지 브로커
    Broker {
        /// 클러스터 내 고유 브로커 ID
        broker_id: u32,
        /// offsets 토픽 복제 계수
        offsets_topic_replication_factor: u16,
    },
    /// 스키마 레지스트리
    SchemaRegistry {
        /// 의존하는 브로커 서비스 이름 목록
        kafka_servers: Vec<String>,
    },
    /// 테스트 대상 처리 엔진
    ProcessingEngine,
    /// 일회성 테스트 드라이버 클라이언트
    TestDriver {
        /// 고정 엔트리포인트 (실행 파일 + 공통 플래그)
        entrypoint: Vec<String>,
    },
}

impl ServiceRole {
    /// 로그/메트릭용 고정 역할명을 반환합니다.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Coordinator => "coordinator",
            Self::Broker { .. } => "broker",
            Self::SchemaRegistry { .. } => "schema_registry",
            Self::ProcessingEngine => "processing_engine",
            Self::TestDriver { .. } => "test_driver",
        }
    }
}

impl fmt::Display for ServiceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Broker { broker_id, .. } => write!(f, "broker(id={broker_id})"),
            other => f.write_str(other.kind_name()),
        }
    }
}

/// 서비스 선언
///
/// 토폴로지에 포함되는 컨테이너 하나를 기술합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    /// 고유 서비스 이름 (네트워크 alias로도 사용)
    pub name: String,
    /// 컨테이너 이미지
    pub image: String,
    /// 역할 및 역할별 파라미터
    pub role: ServiceRole,
    /// 준비 상태 확인에 사용하는 TCP 포트
    #[serde(default)]
    pub port: Option<u16>,
    /// 환경변수
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
    /// 컨테이너 추가 인자
    #[serde(default)]
    pub command: Vec<String>,
    /// 바인드 마운트 (`host:container`)
    #[serde(default)]
    pub volumes: Vec<String>,
    /// 컨테이너 작업 디렉토리
    #[serde(default)]
    pub working_dir: Option<String>,
    /// 의존 서비스 이름
    ///
    /// 토폴로지 생성 시 참조 검증에만 쓰입니다. 실행기는 의존 서비스를
    /// 자동으로 시작하지 않으므로 시작 순서는 액션 목록에 명시해야 합니다.
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl ServiceSpec {
    /// 기본값으로 서비스 선언을 생성합니다.
    pub fn new(name: impl Into<String>, image: impl Into<String>, role: ServiceRole) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            role,
            port: None,
            environment: BTreeMap::new(),
            command: Vec::new(),
            volumes: Vec::new(),
            working_dir: None,
            depends_on: Vec::new(),
        }
    }

    /// 준비 상태 확인 포트를 설정합니다.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// 환경변수를 추가합니다.
    pub fn with_env(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.environment.insert(key.into(), value.to_string());
        self
    }

    /// 컨테이너 인자를 설정합니다.
    pub fn with_command<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command = args.into_iter().map(Into::into).collect();
        self
    }

    /// 바인드 마운트를 추가합니다.
    pub fn with_volume(mut self, bind: impl Into<String>) -> Self {
        self.volumes.push(bind.into());
        self
    }

    /// 작업 디렉토리를 설정합니다.
    pub fn with_working_dir(mut self, dir: impl Into<String>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// 의존 서비스를 추가합니다 (참조 검증 전용).
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.depends_on.push(name.into());
        self
    }

    /// 일회성 실행 전용 서비스인지 여부
    pub fn is_one_shot(&self) -> bool {
        matches!(self.role, ServiceRole::TestDriver { .. })
    }

    /// 일회성 실행 시 사용할 엔트리포인트
    pub fn entrypoint(&self) -> &[String] {
        match &self.role {
            ServiceRole::TestDriver { entrypoint } => entrypoint,
            _ => &[],
        }
    }

    /// 이 서비스가 이름으로 참조하는 모든 서비스
    pub fn references(&self) -> impl Iterator<Item = &str> {
        let servers: &[String] = match &self.role {
            ServiceRole::SchemaRegistry { kafka_servers } => kafka_servers,
            _ => &[],
        };
        self.depends_on
            .iter()
            .chain(servers.iter())
            .map(String::as_str)
    }
}

/// 서비스 이름 최대 길이 (컨테이너 이름 접두어 포함 시에도 DNS 레이블 한도 유지)
pub const MAX_SERVICE_NAME_LEN: usize = 63;

/// 서비스 이름 규칙을 검증합니다.
///
/// 서비스 이름은 컨테이너 이름과 네트워크 alias에 그대로 쓰이므로
/// 1-63자이며 `[a-z0-9]`로 시작하고 `[a-z0-9_.-]`만 포함해야 합니다.
pub fn validate_service_name(name: &str) -> Result<(), TopologyError> {
    let invalid = |reason: &str| TopologyError::InvalidName {
        name: name.to_owned(),
        reason: reason.to_owned(),
    };

    if name.is_empty() || name.len() > MAX_SERVICE_NAME_LEN {
        return Err(invalid("length must be 1-63"));
    }
    let mut chars = name.chars();
    if !chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    {
        return Err(invalid("must start with [a-z0-9]"));
    }
    if !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "_.-".contains(c)) {
        return Err(invalid("contains characters outside [a-z0-9_.-]"));
    }
    Ok(())
}

/// 런타임에서 관측한 서비스 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    /// 실행 중
    Running,
    /// 생성되었으나 정지됨 (종료/kill 포함)
    Stopped,
    /// 컨테이너가 존재하지 않음
    Missing,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
            Self::Missing => write!(f, "missing"),
        }
    }
}

/// 컨테이너에 전달할 종료 시그널
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Signal {
    Kill,
    Term,
    Int,
    Hup,
    Quit,
    Stop,
    Usr1,
    Usr2,
}

impl Signal {
    /// `SIGKILL` 형식의 시그널 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kill => "SIGKILL",
            Self::Term => "SIGTERM",
            Self::Int => "SIGINT",
            Self::Hup => "SIGHUP",
            Self::Quit => "SIGQUIT",
            Self::Stop => "SIGSTOP",
            Self::Usr1 => "SIGUSR1",
            Self::Usr2 => "SIGUSR2",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Signal {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let bare = upper.strip_prefix("SIG").unwrap_or(&upper);
        match bare {
            "KILL" => Ok(Self::Kill),
            "TERM" => Ok(Self::Term),
            "INT" => Ok(Self::Int),
            "HUP" => Ok(Self::Hup),
            "QUIT" => Ok(Self::Quit),
            "STOP" => Ok(Self::Stop),
            "USR1" => Ok(Self::Usr1),
            "USR2" => Ok(Self::Usr2),
            _ => Err(TopologyError::InvalidSignal(s.to_owned())),
        }
    }
}

impl TryFrom<String> for Signal {
    type Error = TopologyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Signal> for String {
    fn from(signal: Signal) -> Self {
        signal.as_str().to_owned()
    }
}
