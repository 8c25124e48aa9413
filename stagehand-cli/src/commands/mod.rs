//! Command handlers -- one module per subcommand

pub mod config;
pub mod down;
pub mod list;
pub mod run;
pub mod validate;

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use stagehand_core::config::StagehandConfig;
use stagehand_runtime::{BollardRuntime, ContainerRuntime};
use stagehand_scenario::{Scenario, WorkflowContext, WorkflowRegistry};

use crate::cli::{Commands, ScenarioArgs};
use crate::error::CliError;
use crate::output::OutputWriter;

/// Route a parsed subcommand to its handler.
pub async fn dispatch(
    command: Commands,
    config: &StagehandConfig,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match command {
        Commands::Run(args) => run::execute(&args, config, writer).await,
        Commands::List => list::execute(config, writer),
        Commands::Validate(args) => validate::execute(&args, config, writer).await,
        Commands::Down(args) => down::execute(&args, config, writer).await,
        Commands::Config(args) => config::execute(args, config_path, writer).await,
    }
}

/// Where a resolved scenario came from, for reports.
pub fn scenario_source(args: &ScenarioArgs) -> String {
    match (&args.file, &args.workflow) {
        (Some(path), _) => path.display().to_string(),
        (None, Some(name)) => format!("workflow:{name}"),
        (None, None) => "<none>".to_owned(),
    }
}

/// Resolve `--file` or a workflow name into a validated scenario.
///
/// Workflows get an absolute scripts directory since it is bind-mounted
/// into the test driver container.
pub async fn resolve_scenario(
    args: &ScenarioArgs,
    config: &StagehandConfig,
) -> Result<Scenario, CliError> {
    if let Some(path) = &args.file {
        debug!(path = %path.display(), "loading scenario file");
        return Ok(Scenario::from_file(path).await?);
    }

    let name = args.workflow.as_deref().ok_or_else(|| {
        CliError::Command("either a workflow name or --file is required".to_owned())
    })?;

    let scripts_dir = match &args.scripts {
        Some(dir) => dir.clone(),
        None => PathBuf::from(&config.scenario.scripts_dir),
    };
    let scripts_dir = std::path::absolute(&scripts_dir)?;
    // `host:container` bind syntax has no escaping for ':'
    if scripts_dir.to_string_lossy().contains(':') {
        return Err(CliError::Config(format!(
            "scripts directory '{}' cannot be bind-mounted: path contains ':'",
            scripts_dir.display()
        )));
    }
    debug!(workflow = name, scripts_dir = %scripts_dir.display(), "building workflow");

    let ctx = WorkflowContext::new(scripts_dir);
    Ok(WorkflowRegistry::builtin().build(name, &ctx)?)
}

/// Connect to the Docker daemon from `[runtime]` and make sure it answers.
pub async fn connect_runtime(config: &StagehandConfig) -> Result<BollardRuntime, CliError> {
    let runtime = BollardRuntime::connect_with_socket(
        &config.runtime.docker_socket,
        config.runtime.project.clone(),
        config.runtime.pull_images,
    )?;
    runtime.ping().await?;
    info!(
        socket = config.runtime.docker_socket.as_str(),
        project = config.runtime.project.as_str(),
        "connected to container runtime"
    );
    Ok(runtime)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(workflow: Option<&str>, file: Option<&str>) -> ScenarioArgs {
        ScenarioArgs {
            workflow: workflow.map(str::to_owned),
            file: file.map(PathBuf::from),
            scripts: None,
        }
    }

    #[test]
    fn scenario_source_prefers_file() {
        assert_eq!(scenario_source(&args(None, Some("s.toml"))), "s.toml");
        assert_eq!(
            scenario_source(&args(Some("kafka-multi-broker"), None)),
            "workflow:kafka-multi-broker"
        );
    }

    #[tokio::test]
    async fn resolve_unknown_workflow_is_command_error() {
        let err = resolve_scenario(&args(Some("nope"), None), &StagehandConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("nope"));
    }

    #[tokio::test]
    async fn resolve_rejects_scripts_dir_with_colon() {
        let args = ScenarioArgs {
            workflow: Some("kafka-multi-broker".to_owned()),
            file: None,
            scripts: Some(PathBuf::from("/tmp/run:1/scripts")),
        };
        let err = resolve_scenario(&args, &StagehandConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("/tmp/run:1/scripts"));
    }

    #[tokio::test]
    async fn resolve_workflow_uses_absolute_scripts_dir() {
        let scenario = resolve_scenario(
            &args(Some("kafka-multi-broker"), None),
            &StagehandConfig::default(),
        )
        .await
        .unwrap();
        let driver = scenario.services.get("testdrive").unwrap();
        let host = driver.volumes[0].split(':').next().unwrap();
        assert!(Path::new(host).is_absolute(), "got {host}");
    }
}
