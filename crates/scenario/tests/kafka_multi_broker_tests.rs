//! 통합 테스트 -- 내장 kafka-multi-broker 워크플로우를 MockRuntime으로 실행
//!
//! 시간은 `start_paused`로 멈춰 두고 mock의 호출 타임스탬프로
//! 순서와 대기 시간을 검증합니다.

use std::sync::Arc;
use std::time::Duration;

use stagehand_core::types::{ServiceState, Signal};
use stagehand_runtime::{MockRuntime, RuntimeCall};
use stagehand_scenario::{
    Action, RunnerConfig, ScenarioError, ScenarioRunner, WorkflowContext, WorkflowRegistry,
};

const PAUSE_UNIT: Duration = Duration::from_secs(1);

fn config() -> RunnerConfig {
    RunnerConfig {
        startup_timeout: Duration::from_secs(120),
        probe_interval: Duration::from_millis(500),
        pause_unit: PAUSE_UNIT,
    }
}

fn scenario() -> stagehand_scenario::Scenario {
    WorkflowRegistry::builtin()
        .build("kafka-multi-broker", &WorkflowContext::new("/scripts"))
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn full_workflow_succeeds_against_mock() {
    let runtime = Arc::new(MockRuntime::new());
    let runner = ScenarioRunner::new(Arc::clone(&runtime), config());

    let report = runner.run_scenario(&scenario()).await.unwrap();

    assert_eq!(report.scenario, "kafka-multi-broker");
    assert_eq!(report.steps.len(), 9);
    // 모든 서비스가 즉시 준비되므로 총 소요 시간은 pause 30단위
    assert_eq!(report.total_elapsed_ms, 30_000);
    assert_eq!(report.steps_of_kind("pause").count(), 3);

    let oneshots: Vec<Vec<String>> = runtime
        .call_log()
        .await
        .into_iter()
        .filter_map(|c| match c {
            RuntimeCall::RunOneshot { args, .. } => Some(args),
            _ => None,
        })
        .collect();
    assert_eq!(
        oneshots,
        vec![
            vec!["--kafka-addr=kafka2", "01-init.td"],
            vec!["--kafka-addr=kafka2,kafka3", "--no-reset", "02-after-leave.td"],
            vec!["--kafka-addr=kafka1", "--no-reset", "03-after-join.td"],
        ]
    );
    assert_eq!(runtime.state_of("kafka1").await, ServiceState::Running);
}

#[tokio::test(start_paused = true)]
async fn kafka1_is_killed_between_scripts_one_and_two_and_restarted_before_three() {
    let runtime = Arc::new(MockRuntime::new());
    let runner = ScenarioRunner::new(Arc::clone(&runtime), config());
    runner.run_scenario(&scenario()).await.unwrap();

    let log = runtime.call_log().await;
    let position = |pred: &dyn Fn(&RuntimeCall) -> bool| log.iter().position(pred).unwrap();

    let script = |name: &'static str| {
        move |c: &RuntimeCall| {
            matches!(c, RuntimeCall::RunOneshot { args, .. } if args.iter().any(|a| a == name))
        }
    };
    let first = position(&script("01-init.td"));
    let second = position(&script("02-after-leave.td"));
    let third = position(&script("03-after-join.td"));
    let kill = position(&|c: &RuntimeCall| {
        *c == RuntimeCall::Kill {
            service: "kafka1".to_owned(),
            signal: Signal::Kill,
        }
    });
    let restart = log
        .iter()
        .rposition(|c| *c == RuntimeCall::Start("kafka1".to_owned()))
        .unwrap();

    assert!(first < kill && kill < second);
    assert!(second < restart && restart < third);
    // kafka1 시작은 초기 start-and-wait와 재시작 두 번
    assert_eq!(
        log.iter()
            .filter(|c| **c == RuntimeCall::Start("kafka1".to_owned()))
            .count(),
        2
    );
}

#[tokio::test(start_paused = true)]
async fn each_call_starts_after_the_previous_one_completes() {
    let runtime = Arc::new(
        MockRuntime::new()
            .with_oneshot_duration(Duration::from_secs(7))
            .with_ready_after("kafka3", Duration::from_secs(2)),
    );
    let runner = ScenarioRunner::new(Arc::clone(&runtime), config());
    let report = runner.run_scenario(&scenario()).await.unwrap();

    let calls = runtime.calls().await;
    for pair in calls.windows(2) {
        assert!(
            pair[1].at >= pair[0].done,
            "{:?} started before {:?} completed",
            pair[1].call,
            pair[0].call
        );
    }

    // 10초 간격: 스크립트 1 완료 → kill → 스크립트 2 시작
    let kill = calls
        .iter()
        .find(|c| matches!(c.call, RuntimeCall::Kill { .. }))
        .unwrap();
    let scripts: Vec<_> = calls
        .iter()
        .filter(|c| matches!(c.call, RuntimeCall::RunOneshot { .. }))
        .collect();
    assert_eq!(kill.at - scripts[0].done, 10 * PAUSE_UNIT);
    assert_eq!(scripts[1].at - kill.done, 10 * PAUSE_UNIT);

    // 3 × 7초 스크립트 + 30초 pause + kafka3 준비 2초
    assert_eq!(report.total_elapsed_ms, 21_000 + 30_000 + 2_000);
}

#[tokio::test(start_paused = true)]
async fn failing_second_script_aborts_before_restart() {
    let runtime = Arc::new(MockRuntime::new().with_exit_code("02-after-leave.td", 1));
    let runner = ScenarioRunner::new(Arc::clone(&runtime), config());

    let err = runner.run_scenario(&scenario()).await.unwrap_err();

    assert_eq!(err.step(), Some(6));
    assert!(matches!(
        err.root_cause(),
        ScenarioError::CommandFailed { service, exit_code: 1 } if service == "testdrive"
    ));
    // 재시작(step 7)은 실행되지 않았으므로 kafka1은 정지 상태로 남음
    assert_eq!(runtime.state_of("kafka1").await, ServiceState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn unreachable_broker_times_out_in_first_step() {
    let runtime = Arc::new(MockRuntime::new().with_never_ready("kafka2"));
    let runner = ScenarioRunner::new(Arc::clone(&runtime), config());

    let err = runner.run_scenario(&scenario()).await.unwrap_err();

    assert_eq!(err.step(), Some(1));
    assert!(matches!(
        err.root_cause(),
        ScenarioError::StartupTimeout { service, timeout_secs: 120 } if service == "kafka2"
    ));
    assert!(
        !runtime
            .call_log()
            .await
            .iter()
            .any(|c| matches!(c, RuntimeCall::RunOneshot { .. }))
    );
}

#[tokio::test]
async fn undeclared_reference_fails_before_any_container_call() {
    let runtime = Arc::new(MockRuntime::new());
    let runner = ScenarioRunner::new(Arc::clone(&runtime), config());
    let scenario = scenario();

    let mut actions = scenario.actions.clone();
    actions.push(Action::kill(["kafka4"], Signal::Kill));

    let err = runner.run(&scenario.services, &actions).await.unwrap_err();

    assert!(matches!(err, ScenarioError::InvalidScenario(_)));
    assert!(runtime.calls().await.is_empty());
}

#[tokio::test]
async fn kill_of_stopped_broker_signals_nothing() {
    let runtime = Arc::new(MockRuntime::new().with_running("kafka2"));
    let runner = ScenarioRunner::new(Arc::clone(&runtime), config());

    let err = runner
        .run(
            &scenario().services,
            &[Action::kill(["kafka2", "kafka1"], Signal::Kill)],
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err.root_cause(),
        ScenarioError::ServiceNotRunning(name) if name == "kafka1"
    ));
    assert!(runtime.calls().await.is_empty());
    assert_eq!(runtime.state_of("kafka2").await, ServiceState::Running);
}
