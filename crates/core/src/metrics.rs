//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 크레이트는 이 상수를 사용하여 `metrics::counter!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `stagehand_`
//! - 모듈명: `scenario_`, `runtime_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(stagehand_core::metrics::SCENARIO_RUNS_TOTAL, "result" => "success").increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 액션 종류 레이블 키 (start_and_wait, run_command, kill, start, pause)
pub const LABEL_ACTION: &str = "action";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

/// 서비스 역할 레이블 키 (broker, coordinator, ...)
pub const LABEL_ROLE: &str = "role";

// ─── Scenario 메트릭 ────────────────────────────────────────────────

/// Scenario: 실행된 시나리오 수 (counter, label: result)
pub const SCENARIO_RUNS_TOTAL: &str = "stagehand_scenario_runs_total";

/// Scenario: 실행된 액션 수 (counter, labels: action, result)
pub const SCENARIO_ACTIONS_TOTAL: &str = "stagehand_scenario_actions_total";

/// Scenario: 액션 소요 시간 (histogram, 초, label: action)
pub const SCENARIO_ACTION_DURATION_SECONDS: &str = "stagehand_scenario_action_duration_seconds";

// ─── Runtime 메트릭 ─────────────────────────────────────────────────

/// Runtime: 시작된 서비스 컨테이너 수 (counter, label: role)
pub const RUNTIME_SERVICES_STARTED_TOTAL: &str = "stagehand_runtime_services_started_total";

/// Runtime: 실행된 일회성 컨테이너 수 (counter, label: result)
pub const RUNTIME_ONESHOT_RUNS_TOTAL: &str = "stagehand_runtime_oneshot_runs_total";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 레코더가 설치되지 않은 상태에서도 안전하게 호출할 수 있습니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(SCENARIO_RUNS_TOTAL, "Total number of scenario runs by result");
    describe_counter!(
        SCENARIO_ACTIONS_TOTAL,
        "Total number of scenario actions executed by kind and result"
    );
    describe_histogram!(
        SCENARIO_ACTION_DURATION_SECONDS,
        "Wall-clock duration of a single scenario action in seconds"
    );
    describe_counter!(
        RUNTIME_SERVICES_STARTED_TOTAL,
        "Total number of service containers started"
    );
    describe_counter!(
        RUNTIME_ONESHOT_RUNS_TOTAL,
        "Total number of one-shot client containers run"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_METRIC_NAMES: &[&str] = &[
        SCENARIO_RUNS_TOTAL,
        SCENARIO_ACTIONS_TOTAL,
        SCENARIO_ACTION_DURATION_SECONDS,
        RUNTIME_SERVICES_STARTED_TOTAL,
        RUNTIME_ONESHOT_RUNS_TOTAL,
    ];

    #[test]
    fn all_metrics_start_with_stagehand_prefix() {
        for name in ALL_METRIC_NAMES {
            assert!(
                name.starts_with("stagehand_"),
                "Metric '{}' does not start with 'stagehand_' prefix",
                name
            );
        }
    }

    #[test]
    fn describe_all_does_not_panic() {
        describe_all();
    }

    #[test]
    fn label_keys_are_lowercase() {
        for label in [LABEL_ACTION, LABEL_RESULT, LABEL_ROLE] {
            assert_eq!(label.to_lowercase(), label);
        }
    }
}
