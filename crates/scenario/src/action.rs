//! 시나리오 액션 정의
//!
//! [`Action`]은 토폴로지에 대해 순서대로 실행되는 생명주기 단계 하나를 나타냅니다.
//! TOML 시나리오 파일에서는 `kind` 태그로 구분됩니다.
//!
//! ```toml
//! [[actions]]
//! kind = "kill"
//! services = ["kafka1"]
//! signal = "SIGKILL"
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use stagehand_core::error::TopologyError;
use stagehand_core::topology::Topology;
use stagehand_core::types::Signal;

fn default_signal() -> Signal {
    Signal::Kill
}

/// 시나리오 액션
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// 서비스를 시작하고 각 서비스가 TCP 연결을 받을 때까지 대기
    StartAndWait {
        /// 대상 서비스
        services: Vec<String>,
    },
    /// 서비스를 일회성 클라이언트로 실행하고 종료를 대기
    RunCommand {
        /// 클라이언트 서비스
        service: String,
        /// 엔트리포인트 뒤에 붙을 인자 (공백으로 분리)
        command: String,
    },
    /// 실행 중인 서비스에 시그널 전송
    Kill {
        /// 대상 서비스
        services: Vec<String>,
        /// 전송할 시그널 (기본: SIGKILL)
        #[serde(default = "default_signal")]
        signal: Signal,
    },
    /// 준비 상태 대기 없이 서비스를 (재)시작
    Start {
        /// 대상 서비스
        services: Vec<String>,
    },
    /// `units × pause_unit` 동안 대기
    Pause {
        /// 대기 단위 수
        units: u32,
    },
}

fn to_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names.into_iter().map(Into::into).collect()
}

impl Action {
    pub fn start_and_wait<I, S>(services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::StartAndWait {
            services: to_names(services),
        }
    }

    pub fn run_command(service: impl Into<String>, command: impl Into<String>) -> Self {
        Self::RunCommand {
            service: service.into(),
            command: command.into(),
        }
    }

    pub fn kill<I, S>(services: I, signal: Signal) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Kill {
            services: to_names(services),
            signal,
        }
    }

    pub fn start<I, S>(services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Start {
            services: to_names(services),
        }
    }

    pub fn pause(units: u32) -> Self {
        Self::Pause { units }
    }

    /// 로그/메트릭 레이블용 고정 액션명
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::StartAndWait { .. } => "start_and_wait",
            Self::RunCommand { .. } => "run_command",
            Self::Kill { .. } => "kill",
            Self::Start { .. } => "start",
            Self::Pause { .. } => "pause",
        }
    }

    /// 이 액션이 참조하는 서비스 이름
    pub fn targets(&self) -> &[String] {
        match self {
            Self::StartAndWait { services }
            | Self::Kill { services, .. }
            | Self::Start { services } => services,
            Self::RunCommand { service, .. } => std::slice::from_ref(service),
            Self::Pause { .. } => &[],
        }
    }

    /// `RunCommand`의 인자를 공백 기준으로 분리합니다.
    pub fn command_args(&self) -> Vec<String> {
        match self {
            Self::RunCommand { command, .. } => {
                command.split_whitespace().map(str::to_owned).collect()
            }
            _ => Vec::new(),
        }
    }

    /// 모든 참조가 토폴로지에 존재하는지 검증합니다.
    ///
    /// 서비스 목록을 받는 액션은 최소 한 개의 대상을 가져야 하며,
    /// 일회성 서비스는 `RunCommand`로만 실행할 수 있습니다.
    pub fn validate(&self, topology: &Topology) -> Result<(), TopologyError> {
        if self.targets().is_empty() && !matches!(self, Self::Pause { .. }) {
            return Err(TopologyError::EmptyTargets {
                action: self.kind_name().to_owned(),
            });
        }
        let daemon_only = !matches!(self, Self::RunCommand { .. });
        for name in self.targets() {
            let spec = topology.require(name)?;
            if daemon_only && spec.is_one_shot() {
                return Err(TopologyError::OneShotTarget {
                    action: self.kind_name().to_owned(),
                    service: name.clone(),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartAndWait { services } => {
                write!(f, "start-and-wait {}", services.join(", "))
            }
            Self::RunCommand { service, command } => {
                write!(f, "run-command {service}: {command}")
            }
            Self::Kill { services, signal } => {
                write!(f, "kill {} ({signal})", services.join(", "))
            }
            Self::Start { services } => write!(f, "start {}", services.join(", ")),
            Self::Pause { units } => write!(f, "pause {units}"),
        }
    }
}
