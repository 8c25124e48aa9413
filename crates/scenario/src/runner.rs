//! 시나리오 실행기
//!
//! [`ScenarioRunner`]는 액션 목록을 토폴로지에 대해 순서대로 실행합니다.
//!
//! # 실행 규칙
//!
//! - 컨테이너를 하나라도 건드리기 전에 모든 액션 참조를 검증합니다.
//! - 액션은 하나씩 await되며 절대 spawn되지 않습니다. N+1번째 액션은
//!   N번째 액션이 끝난 뒤에만 시작합니다.
//! - 재시도는 없습니다. 첫 실패가 시나리오 전체를 중단하며
//!   `ScenarioError::Step`으로 실패 위치를 알려줍니다.
//! - 실패 시 정리하지 않습니다. 컨테이너 제거는 [`ScenarioRunner::teardown`]이 담당합니다.
//!
//! # 대기 지점
//!
//! ```text
//! start_and_wait ── probe_tcp ── sleep(probe_interval) ── ... (timeout: startup_timeout)
//! run_command ───── run_oneshot (클라이언트 종료까지)
//! pause ─────────── sleep(units × pause_unit)
//! ```

use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, histogram};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use stagehand_core::config::ScenarioConfig;
use stagehand_core::metrics::{
    LABEL_ACTION, LABEL_RESULT, SCENARIO_ACTION_DURATION_SECONDS, SCENARIO_ACTIONS_TOTAL,
    SCENARIO_RUNS_TOTAL,
};
use stagehand_core::topology::Topology;
use stagehand_core::types::{ServiceState, Signal};
use stagehand_runtime::{ContainerRuntime, RuntimeError};

use crate::action::Action;
use crate::error::ScenarioError;
use crate::report::{ScenarioReport, StepReport};
use crate::scenario::{Scenario, validate_actions};

/// 이름 없이 실행된 액션 목록의 보고서 이름
const ADHOC_SCENARIO_NAME: &str = "adhoc";

/// 실행기 타이밍 설정
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    /// 서비스별 준비 상태 대기 한도
    pub startup_timeout: Duration,
    /// 준비 상태 probe 간격
    pub probe_interval: Duration,
    /// pause 한 단위의 길이
    pub pause_unit: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self::from(&ScenarioConfig::default())
    }
}

impl From<&ScenarioConfig> for RunnerConfig {
    fn from(config: &ScenarioConfig) -> Self {
        Self {
            startup_timeout: config.startup_timeout(),
            probe_interval: config.probe_interval(),
            pause_unit: config.pause_unit(),
        }
    }
}

/// 시나리오 실행기
///
/// 런타임은 `Arc<R>`로 공유되며, 실행기 자체는 액션 목록 내 위치 외의
/// 상태를 갖지 않습니다.
pub struct ScenarioRunner<R: ContainerRuntime> {
    runtime: Arc<R>,
    config: RunnerConfig,
}

impl<R: ContainerRuntime> ScenarioRunner<R> {
    /// 새 실행기를 생성합니다.
    pub fn new(runtime: Arc<R>, config: RunnerConfig) -> Self {
        Self { runtime, config }
    }

    /// 공유 중인 런타임
    pub fn runtime(&self) -> &Arc<R> {
        &self.runtime
    }

    /// 적용 중인 타이밍 설정
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// 액션 목록을 토폴로지에 대해 순서대로 실행합니다.
    ///
    /// # Errors
    ///
    /// - `ScenarioError::InvalidScenario`: 참조 오류 (어떤 컨테이너도 건드리지 않음)
    /// - `ScenarioError::Step`: 실행 중 첫 번째 실패와 그 단계 번호
    pub async fn run(
        &self,
        topology: &Topology,
        actions: &[Action],
    ) -> Result<ScenarioReport, ScenarioError> {
        self.execute(ADHOC_SCENARIO_NAME, topology, actions).await
    }

    /// [`Scenario`]를 실행합니다. 보고서에는 시나리오 이름이 기록됩니다.
    pub async fn run_scenario(&self, scenario: &Scenario) -> Result<ScenarioReport, ScenarioError> {
        self.execute(&scenario.name, &scenario.services, &scenario.actions)
            .await
    }

    /// 토폴로지의 모든 데몬 서비스 컨테이너를 역순으로 제거합니다.
    ///
    /// 이미 없는 컨테이너는 무시합니다. 제거를 요청한 서비스 수를 반환합니다.
    pub async fn teardown(&self, topology: &Topology) -> Result<usize, ScenarioError> {
        let daemons: Vec<&str> = topology.daemons().map(|s| s.name.as_str()).collect();
        for name in daemons.iter().rev() {
            self.runtime.remove_service(name).await?;
        }
        info!(services = daemons.len(), "topology torn down");
        Ok(daemons.len())
    }

    async fn execute(
        &self,
        name: &str,
        topology: &Topology,
        actions: &[Action],
    ) -> Result<ScenarioReport, ScenarioError> {
        if let Err(e) = validate_actions(topology, actions) {
            error!(scenario = name, error = %e, "scenario rejected before execution");
            counter!(SCENARIO_RUNS_TOTAL, LABEL_RESULT => "invalid").increment(1);
            return Err(e);
        }

        info!(
            scenario = name,
            services = topology.len(),
            actions = actions.len(),
            "starting scenario"
        );
        let started = Instant::now();
        let mut steps = Vec::with_capacity(actions.len());

        for (idx, action) in actions.iter().enumerate() {
            let step = idx + 1;
            info!(step, action = %action, "executing action");

            let action_started = Instant::now();
            let result = self.execute_action(topology, action).await;
            let elapsed = action_started.elapsed();

            histogram!(SCENARIO_ACTION_DURATION_SECONDS, LABEL_ACTION => action.kind_name())
                .record(elapsed.as_secs_f64());
            let outcome = if result.is_ok() { "success" } else { "failure" };
            counter!(
                SCENARIO_ACTIONS_TOTAL,
                LABEL_ACTION => action.kind_name(),
                LABEL_RESULT => outcome
            )
            .increment(1);

            if let Err(e) = result {
                error!(step, action = %action, error = %e, "action failed, aborting scenario");
                counter!(SCENARIO_RUNS_TOTAL, LABEL_RESULT => "failure").increment(1);
                return Err(ScenarioError::Step {
                    step,
                    action: action.to_string(),
                    source: Box::new(e),
                });
            }

            let elapsed_ms = duration_ms(elapsed);
            info!(step, action = %action, elapsed_ms, "action completed");
            steps.push(StepReport {
                index: step,
                kind: action.kind_name().to_owned(),
                description: action.to_string(),
                elapsed_ms,
            });
        }

        let total_elapsed_ms = duration_ms(started.elapsed());
        counter!(SCENARIO_RUNS_TOTAL, LABEL_RESULT => "success").increment(1);
        info!(scenario = name, total_elapsed_ms, "scenario completed");

        Ok(ScenarioReport {
            scenario: name.to_owned(),
            steps,
            total_elapsed_ms,
        })
    }

    /// 단일 액션을 실행합니다 (재시도 없음).
    async fn execute_action(
        &self,
        topology: &Topology,
        action: &Action,
    ) -> Result<(), ScenarioError> {
        match action {
            Action::StartAndWait { services } => {
                for name in services {
                    self.runtime.start_service(topology.require(name)?).await?;
                }
                for name in services {
                    if let Some(port) = topology.require(name)?.port {
                        self.wait_until_reachable(name, port).await?;
                    } else {
                        debug!(service = name.as_str(), "no port declared, not waiting");
                    }
                }
                Ok(())
            }
            Action::RunCommand { service, .. } => {
                let spec = topology.require(service)?;
                let args = action.command_args();
                let exit_code = self.runtime.run_oneshot(spec, &args).await?;
                if exit_code != 0 {
                    return Err(ScenarioError::CommandFailed {
                        service: service.clone(),
                        exit_code,
                    });
                }
                info!(service = service.as_str(), "client exited successfully");
                Ok(())
            }
            Action::Kill { services, signal } => self.kill_all(services, *signal).await,
            Action::Start { services } => {
                for name in services {
                    self.runtime.start_service(topology.require(name)?).await?;
                }
                Ok(())
            }
            Action::Pause { units } => {
                let duration = self.config.pause_unit * *units;
                info!(units, duration_ms = duration_ms(duration), "pausing");
                tokio::time::sleep(duration).await;
                Ok(())
            }
        }
    }

    /// 모든 대상이 실행 중인지 확인한 뒤에만 시그널을 보냅니다.
    async fn kill_all(&self, services: &[String], signal: Signal) -> Result<(), ScenarioError> {
        for name in services {
            let state = self.runtime.service_state(name).await?;
            if state != ServiceState::Running {
                warn!(service = name.as_str(), state = %state, "kill target is not running");
                return Err(ScenarioError::ServiceNotRunning(name.clone()));
            }
        }

        for name in services {
            self.runtime
                .kill_service(name, signal)
                .await
                .map_err(|e| match e {
                    RuntimeError::NotRunning(name) | RuntimeError::NotFound(name) => {
                        ScenarioError::ServiceNotRunning(name)
                    }
                    other => ScenarioError::Runtime(other),
                })?;
        }
        Ok(())
    }

    /// 서비스가 TCP 연결을 받을 때까지 `probe_interval` 간격으로 확인합니다.
    async fn wait_until_reachable(&self, name: &str, port: u16) -> Result<(), ScenarioError> {
        match tokio::time::timeout(self.config.startup_timeout, self.probe_until_ready(name, port))
            .await
        {
            Ok(result) => result,
            Err(_elapsed) => Err(ScenarioError::StartupTimeout {
                service: name.to_owned(),
                timeout_secs: self.config.startup_timeout.as_secs(),
            }),
        }
    }

    async fn probe_until_ready(&self, name: &str, port: u16) -> Result<(), ScenarioError> {
        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            if self.runtime.probe_tcp(name, port).await? {
                info!(service = name, port, attempts, "service reachable");
                return Ok(());
            }
            debug!(service = name, port, attempts, "service not reachable yet");
            tokio::time::sleep(self.config.probe_interval).await;
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
