//! In-memory 컨테이너 런타임
//!
//! [`MockRuntime`]은 Docker 없이 시나리오를 실행하기 위한 구현입니다.
//! 모든 상태 변경 호출을 [`RecordedCall`]로 기록하며, 타임스탬프는
//! `tokio::time::Instant`를 사용하므로 `start_paused` 테스트에서 결정적입니다.
//!
//! 준비 상태 probe는 호출 빈도가 높아 기록 대신 서비스별 횟수만 셉니다.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use stagehand_core::types::{ServiceSpec, ServiceState, Signal};

use crate::docker::ContainerRuntime;
use crate::error::RuntimeError;

/// 기록된 런타임 호출 종류
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeCall {
    /// 서비스 시작
    Start(String),
    /// 시그널 전송
    Kill {
        /// 대상 서비스
        service: String,
        /// 전송한 시그널
        signal: Signal,
    },
    /// 일회성 클라이언트 실행
    RunOneshot {
        /// 클라이언트 서비스
        service: String,
        /// 엔트리포인트 뒤에 붙은 인자
        args: Vec<String>,
    },
    /// 서비스 제거
    Remove(String),
}

impl RuntimeCall {
    /// 호출 대상 서비스 이름
    pub fn service(&self) -> &str {
        match self {
            Self::Start(name) | Self::Remove(name) => name,
            Self::Kill { service, .. } | Self::RunOneshot { service, .. } => service,
        }
    }
}

/// 시각 정보가 붙은 호출 기록
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// 호출 시작 시각
    pub at: Instant,
    /// 호출 완료 시각
    pub done: Instant,
    /// 호출 내용
    pub call: RuntimeCall,
}

#[derive(Default)]
struct MockState {
    services: HashMap<String, ServiceState>,
    started_at: HashMap<String, Instant>,
    ready_after: HashMap<String, Duration>,
    never_ready: HashSet<String>,
    exit_codes: HashMap<String, i64>,
    oneshot_duration: Duration,
    fail_ping: bool,
    calls: Vec<RecordedCall>,
    probes: HashMap<String, u32>,
}

/// 테스트용 in-memory 런타임
///
/// 기본 동작:
/// - 시작된 서비스는 즉시 준비 상태가 됨
/// - 일회성 실행은 즉시 exit code 0으로 끝남
///
/// 빌더 메서드로 준비 지연, 실패 exit code 등을 구성합니다.
#[derive(Default)]
pub struct MockRuntime {
    state: Mutex<MockState>,
}

impl MockRuntime {
    /// 빈 런타임을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 이미 실행 중인 서비스를 등록합니다.
    pub fn with_running(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        let state = self.state.get_mut();
        state.started_at.insert(name.clone(), Instant::now());
        state.services.insert(name, ServiceState::Running);
        self
    }

    /// 이미 생성되었지만 정지된 서비스를 등록합니다.
    pub fn with_stopped(mut self, name: impl Into<String>) -> Self {
        self.state
            .get_mut()
            .services
            .insert(name.into(), ServiceState::Stopped);
        self
    }

    /// 인자 중 `marker`를 포함하는 일회성 실행이 `code`로 종료되도록 설정합니다.
    pub fn with_exit_code(mut self, marker: impl Into<String>, code: i64) -> Self {
        self.state.get_mut().exit_codes.insert(marker.into(), code);
        self
    }

    /// 서비스가 시작 후 `delay`가 지나야 probe에 응답하도록 설정합니다.
    pub fn with_ready_after(mut self, name: impl Into<String>, delay: Duration) -> Self {
        self.state.get_mut().ready_after.insert(name.into(), delay);
        self
    }

    /// 서비스가 절대 준비 상태가 되지 않도록 설정합니다.
    pub fn with_never_ready(mut self, name: impl Into<String>) -> Self {
        self.state.get_mut().never_ready.insert(name.into());
        self
    }

    /// 일회성 실행에 걸리는 시간을 설정합니다.
    pub fn with_oneshot_duration(mut self, duration: Duration) -> Self {
        self.state.get_mut().oneshot_duration = duration;
        self
    }

    /// ping이 실패하도록 설정합니다.
    pub fn with_failing_ping(mut self) -> Self {
        self.state.get_mut().fail_ping = true;
        self
    }

    /// 지금까지 기록된 호출 (시간순)
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().await.calls.clone()
    }

    /// 지금까지 기록된 호출 내용만 반환합니다.
    pub async fn call_log(&self) -> Vec<RuntimeCall> {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .map(|c| c.call.clone())
            .collect()
    }

    /// 서비스별 probe 횟수
    pub async fn probe_count(&self, name: &str) -> u32 {
        self.state
            .lock()
            .await
            .probes
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    /// 현재 서비스 상태
    pub async fn state_of(&self, name: &str) -> ServiceState {
        self.state
            .lock()
            .await
            .services
            .get(name)
            .copied()
            .unwrap_or(ServiceState::Missing)
    }

    async fn record(&self, at: Instant, call: RuntimeCall) {
        self.state.lock().await.calls.push(RecordedCall {
            at,
            done: Instant::now(),
            call,
        });
    }
}

impl ContainerRuntime for MockRuntime {
    async fn ping(&self) -> Result<(), RuntimeError> {
        if self.state.lock().await.fail_ping {
            return Err(RuntimeError::Connection("mock ping failure".to_owned()));
        }
        Ok(())
    }

    async fn start_service(&self, spec: &ServiceSpec) -> Result<(), RuntimeError> {
        let at = Instant::now();
        {
            let mut state = self.state.lock().await;
            let previous = state.services.insert(spec.name.clone(), ServiceState::Running);
            if previous != Some(ServiceState::Running) {
                state.started_at.insert(spec.name.clone(), at);
            }
        }
        self.record(at, RuntimeCall::Start(spec.name.clone())).await;
        Ok(())
    }

    async fn service_state(&self, name: &str) -> Result<ServiceState, RuntimeError> {
        Ok(self.state_of(name).await)
    }

    async fn probe_tcp(&self, name: &str, _port: u16) -> Result<bool, RuntimeError> {
        let mut state = self.state.lock().await;
        *state.probes.entry(name.to_owned()).or_default() += 1;

        if state.never_ready.contains(name)
            || state.services.get(name) != Some(&ServiceState::Running)
        {
            return Ok(false);
        }
        let delay = state.ready_after.get(name).copied().unwrap_or_default();
        Ok(state
            .started_at
            .get(name)
            .is_some_and(|started| started.elapsed() >= delay))
    }

    async fn kill_service(&self, name: &str, signal: Signal) -> Result<(), RuntimeError> {
        let at = Instant::now();
        {
            let mut state = self.state.lock().await;
            match state.services.get(name).copied() {
                Some(ServiceState::Running) => {
                    state.services.insert(name.to_owned(), ServiceState::Stopped);
                    state.started_at.remove(name);
                }
                Some(ServiceState::Stopped) => {
                    return Err(RuntimeError::NotRunning(name.to_owned()));
                }
                Some(ServiceState::Missing) | None => {
                    return Err(RuntimeError::NotFound(name.to_owned()));
                }
            }
        }
        self.record(
            at,
            RuntimeCall::Kill {
                service: name.to_owned(),
                signal,
            },
        )
        .await;
        Ok(())
    }

    async fn run_oneshot(&self, spec: &ServiceSpec, args: &[String]) -> Result<i64, RuntimeError> {
        let at = Instant::now();
        let (duration, code) = {
            let state = self.state.lock().await;
            let code = state
                .exit_codes
                .iter()
                .find(|(marker, _)| args.iter().any(|a| a.contains(marker.as_str())))
                .map_or(0, |(_, code)| *code);
            (state.oneshot_duration, code)
        };

        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
        self.record(
            at,
            RuntimeCall::RunOneshot {
                service: spec.name.clone(),
                args: args.to_vec(),
            },
        )
        .await;
        Ok(code)
    }

    async fn remove_service(&self, name: &str) -> Result<(), RuntimeError> {
        let at = Instant::now();
        {
            let mut state = self.state.lock().await;
            state.services.remove(name);
            state.started_at.remove(name);
        }
        self.record(at, RuntimeCall::Remove(name.to_owned())).await;
        Ok(())
    }
}
