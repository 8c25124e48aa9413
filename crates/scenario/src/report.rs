//! 시나리오 실행 결과

use serde::Serialize;

/// 완료된 단계 하나의 기록
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// 1부터 시작하는 단계 번호
    pub index: usize,
    /// 액션 종류 (`start_and_wait`, `run_command`, ...)
    pub kind: String,
    /// 액션 설명
    pub description: String,
    /// 소요 시간 (밀리초)
    pub elapsed_ms: u64,
}

/// 성공한 시나리오 실행 보고서
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioReport {
    /// 시나리오 이름
    pub scenario: String,
    /// 단계별 기록 (실행 순서)
    pub steps: Vec<StepReport>,
    /// 전체 소요 시간 (밀리초)
    pub total_elapsed_ms: u64,
}

impl ScenarioReport {
    /// 특정 종류의 단계들만 반환합니다.
    pub fn steps_of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a StepReport> {
        self.steps.iter().filter(move |s| s.kind == kind)
    }
}
