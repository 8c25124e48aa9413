//! `stagehand list` command handler

use std::io::Write;

use serde::Serialize;

use stagehand_core::config::StagehandConfig;
use stagehand_scenario::{WorkflowContext, WorkflowRegistry};

use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `list` command.
pub fn execute(config: &StagehandConfig, writer: &OutputWriter) -> Result<(), CliError> {
    let list = list_workflows(&WorkflowRegistry::builtin(), config)?;
    writer.render(&list)?;
    Ok(())
}

/// Summarise every workflow in the registry.
///
/// Each workflow is built once with the configured scripts directory so the
/// counts reflect what `run` would execute.
pub fn list_workflows(
    registry: &WorkflowRegistry,
    config: &StagehandConfig,
) -> Result<WorkflowList, CliError> {
    let ctx = WorkflowContext::new(&config.scenario.scripts_dir);
    let workflows = registry
        .entries()
        .iter()
        .map(|entry| -> Result<WorkflowSummary, CliError> {
            let scenario = registry.build(entry.name, &ctx)?;
            Ok(WorkflowSummary {
                name: entry.name.to_owned(),
                description: entry.description.to_owned(),
                services: scenario.services.len(),
                actions: scenario.actions.len(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(WorkflowList { workflows })
}

#[derive(Serialize)]
pub struct WorkflowList {
    pub workflows: Vec<WorkflowSummary>,
}

#[derive(Serialize)]
pub struct WorkflowSummary {
    pub name: String,
    pub description: String,
    pub services: usize,
    pub actions: usize,
}

impl Render for WorkflowList {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if self.workflows.is_empty() {
            writeln!(w, "No workflows registered.")?;
            return Ok(());
        }

        writeln!(
            w,
            "{:<24} {:>8} {:>8}  DESCRIPTION",
            "NAME", "SERVICES", "ACTIONS"
        )?;
        for wf in &self.workflows {
            writeln!(
                w,
                "{} {:>8} {:>8}  {}",
                format!("{:<24}", wf.name).bold(),
                wf.services,
                wf.actions,
                wf.description
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_builtin_workflows() {
        let list =
            list_workflows(&WorkflowRegistry::builtin(), &StagehandConfig::default()).unwrap();
        assert_eq!(list.workflows.len(), 1);
        let wf = &list.workflows[0];
        assert_eq!(wf.name, "kafka-multi-broker");
        assert_eq!(wf.services, 7);
        assert_eq!(wf.actions, 9);
    }

    #[test]
    fn test_empty_list_render_text() {
        let list = WorkflowList {
            workflows: Vec::new(),
        };
        let mut buffer = Vec::new();
        list.render_text(&mut buffer).unwrap();
        assert!(String::from_utf8(buffer).unwrap().contains("No workflows"));
    }

    #[test]
    fn test_list_json_serialization() {
        let list =
            list_workflows(&WorkflowRegistry::builtin(), &StagehandConfig::default()).unwrap();
        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(json["workflows"][0]["name"], "kafka-multi-broker");
        assert_eq!(json["workflows"][0]["actions"], 9);
    }
}
