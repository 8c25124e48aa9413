//! `stagehand validate` command handler

use std::io::Write;

use serde::Serialize;
use tracing::info;

use stagehand_core::config::StagehandConfig;
use stagehand_scenario::Scenario;

use crate::cli::ScenarioArgs;
use crate::commands::{resolve_scenario, scenario_source};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `validate` command.
///
/// Resolves the scenario without connecting to any runtime and reports the
/// topology and action list. An invalid scenario is still rendered before
/// the error is returned.
pub async fn execute(
    args: &ScenarioArgs,
    config: &StagehandConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let source = scenario_source(args);
    info!(source = source.as_str(), "validating scenario");

    match resolve_scenario(args, config).await {
        Ok(scenario) => {
            writer.render(&ScenarioValidationReport::valid(source, &scenario))?;
            Ok(())
        }
        Err(e) => {
            writer.render(&ScenarioValidationReport::invalid(source, &e))?;
            Err(e)
        }
    }
}

/// Scenario validation report.
#[derive(Debug, Serialize)]
pub struct ScenarioValidationReport {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    pub valid: bool,
    pub services: Vec<ServiceLine>,
    pub actions: Vec<String>,
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ServiceLine {
    pub name: String,
    pub role: String,
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl ScenarioValidationReport {
    pub fn valid(source: String, scenario: &Scenario) -> Self {
        Self {
            source,
            scenario: Some(scenario.name.clone()),
            valid: true,
            services: scenario
                .services
                .iter()
                .map(|s| ServiceLine {
                    name: s.name.clone(),
                    role: s.role.to_string(),
                    image: s.image.clone(),
                    port: s.port,
                })
                .collect(),
            actions: scenario.actions.iter().map(ToString::to_string).collect(),
            errors: Vec::new(),
        }
    }

    pub fn invalid(source: String, error: &CliError) -> Self {
        Self {
            source,
            scenario: None,
            valid: false,
            services: Vec::new(),
            actions: Vec::new(),
            errors: vec![error.to_string()],
        }
    }
}

impl Render for ScenarioValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Scenario Validation: {}", self.source.bold())?;

        if !self.valid {
            writeln!(w, "  Result: {}", "INVALID".red().bold())?;
            for err in &self.errors {
                writeln!(w, "  Error: {}", err.red())?;
            }
            return Ok(());
        }

        if let Some(ref name) = self.scenario {
            writeln!(w, "  Name: {name}")?;
        }
        writeln!(w, "  Services ({}):", self.services.len())?;
        for svc in &self.services {
            let port = svc.port.map(|p| format!(":{p}")).unwrap_or_default();
            writeln!(w, "    {:<18} {:<20} {}{}", svc.name, svc.role, svc.image, port)?;
        }
        writeln!(w, "  Actions ({}):", self.actions.len())?;
        for (idx, action) in self.actions.iter().enumerate() {
            writeln!(w, "    {:>2}. {action}", idx + 1)?;
        }
        writeln!(w, "  Result: {}", "VALID".green().bold())?;
        Ok(())
    }
}
