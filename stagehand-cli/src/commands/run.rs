//! `stagehand run` command handler

use std::io::Write;
use std::sync::Arc;

use tracing::info;

use stagehand_core::config::StagehandConfig;
use stagehand_runtime::ContainerRuntime;
use stagehand_scenario::{RunnerConfig, Scenario, ScenarioReport, ScenarioRunner};

use crate::cli::ScenarioArgs;
use crate::commands::{connect_runtime, resolve_scenario};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `run` command against the local Docker daemon.
///
/// The scenario is resolved and validated before connecting, so a broken
/// definition never reaches the runtime.
pub async fn execute(
    args: &ScenarioArgs,
    config: &StagehandConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let scenario = resolve_scenario(args, config).await?;
    let runtime = Arc::new(connect_runtime(config).await?);
    let report = run_scenario(runtime, &scenario, config).await?;
    writer.render(&report)?;
    Ok(())
}

/// Run a resolved scenario with any runtime.
///
/// # Errors
///
/// Step failures map to `CliError::ScenarioFailed` (exit code 3).
pub async fn run_scenario<R: ContainerRuntime>(
    runtime: Arc<R>,
    scenario: &Scenario,
    config: &StagehandConfig,
) -> Result<ScenarioReport, CliError> {
    info!(
        scenario = scenario.name.as_str(),
        actions = scenario.actions.len(),
        "running scenario"
    );
    let runner = ScenarioRunner::new(runtime, RunnerConfig::from(&config.scenario));
    Ok(runner.run_scenario(scenario).await?)
}

impl Render for ScenarioReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Scenario: {}", self.scenario.bold())?;
        writeln!(w)?;
        writeln!(w, "{:<5} {:<16} {:>10}  DESCRIPTION", "STEP", "ACTION", "ELAPSED")?;
        for step in &self.steps {
            writeln!(
                w,
                "{:<5} {:<16} {:>10}  {}",
                step.index,
                step.kind,
                format_ms(step.elapsed_ms),
                step.description
            )?;
        }
        writeln!(w)?;
        writeln!(
            w,
            "  Result: {} ({} steps in {})",
            "PASSED".green().bold(),
            self.steps.len(),
            format_ms(self.total_elapsed_ms)
        )?;
        Ok(())
    }
}

fn format_ms(ms: u64) -> String {
    if ms >= 1000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        format!("{ms}ms")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagehand_scenario::StepReport;

    #[test]
    fn test_format_ms() {
        assert_eq!(format_ms(250), "250ms");
        assert_eq!(format_ms(10_000), "10.0s");
        assert_eq!(format_ms(1_500), "1.5s");
    }

    #[test]
    fn test_scenario_report_render_text() {
        let report = ScenarioReport {
            scenario: "broker-restart".to_owned(),
            steps: vec![StepReport {
                index: 1,
                kind: "kill".to_owned(),
                description: "kill kafka1 (SIGKILL)".to_owned(),
                elapsed_ms: 12,
            }],
            total_elapsed_ms: 12,
        };

        let mut buffer = Vec::new();
        report
            .render_text(&mut buffer)
            .expect("text rendering should succeed");

        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("broker-restart"));
        assert!(output.contains("kill kafka1 (SIGKILL)"));
        assert!(output.contains("PASSED"));
        assert!(output.contains("1 steps in 12ms"));
    }
}
