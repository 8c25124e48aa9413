//! `stagehand down` command handler

use std::io::Write;
use std::sync::Arc;

use serde::Serialize;

use stagehand_core::config::StagehandConfig;
use stagehand_runtime::ContainerRuntime;
use stagehand_scenario::{RunnerConfig, Scenario, ScenarioRunner};

use crate::cli::ScenarioArgs;
use crate::commands::{connect_runtime, resolve_scenario};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `down` command.
///
/// Removes the daemon containers of the scenario. Used after a failed run,
/// since the runner leaves containers in place for inspection.
pub async fn execute(
    args: &ScenarioArgs,
    config: &StagehandConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let scenario = resolve_scenario(args, config).await?;
    let runtime = Arc::new(connect_runtime(config).await?);
    let report = tear_down(runtime, &scenario, config).await?;
    writer.render(&report)?;
    Ok(())
}

/// Remove every daemon service of `scenario` using `runtime`.
pub async fn tear_down<R: ContainerRuntime>(
    runtime: Arc<R>,
    scenario: &Scenario,
    config: &StagehandConfig,
) -> Result<DownReport, CliError> {
    let runner = ScenarioRunner::new(runtime, RunnerConfig::from(&config.scenario));
    let removed = runner.teardown(&scenario.services).await?;
    Ok(DownReport {
        scenario: scenario.name.clone(),
        project: config.runtime.project.clone(),
        removed,
    })
}

#[derive(Debug, Serialize)]
pub struct DownReport {
    pub scenario: String,
    pub project: String,
    pub removed: usize,
}

impl Render for DownReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(
            w,
            "Removed {} service container(s) of {} (project: {})",
            self.removed.to_string().bold(),
            self.scenario.bold(),
            self.project
        )
    }
}
