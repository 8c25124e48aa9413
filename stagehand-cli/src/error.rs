//! CLI-specific error types and exit code mapping

use stagehand_core::error::StagehandError;
use stagehand_runtime::RuntimeError;
use stagehand_scenario::ScenarioError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration or scenario definition failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// The scenario ran and one of its actions failed.
    #[error("scenario failed: {0}")]
    ScenarioFailed(String),

    /// Cannot reach the container runtime.
    #[error("container runtime not reachable: {0}")]
    RuntimeUnavailable(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from stagehand-core.
    #[error("{0}")]
    Core(#[from] StagehandError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                  |
    /// |------|------------------------------------------|
    /// | 0    | Success                                  |
    /// | 1    | General / command error                  |
    /// | 2    | Configuration error                      |
    /// | 3    | Scenario failed                          |
    /// | 4    | Container runtime unreachable            |
    /// | 10   | IO error                                 |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::ScenarioFailed(_) => 3,
            Self::RuntimeUnavailable(_) => 4,
            Self::Io(_) => 10,
            Self::Core(StagehandError::Config(_) | StagehandError::Topology(_)) => 2,
            Self::Core(StagehandError::Io(_)) => 10,
            Self::JsonSerialize(_) | Self::Command(_) | Self::Core(_) => 1,
        }
    }
}

impl From<RuntimeError> for CliError {
    fn from(e: RuntimeError) -> Self {
        match e {
            RuntimeError::Connection(_) => Self::RuntimeUnavailable(e.to_string()),
            other => Self::Command(other.to_string()),
        }
    }
}

impl From<ScenarioError> for CliError {
    fn from(e: ScenarioError) -> Self {
        match e.root_cause() {
            ScenarioError::InvalidScenario(_) | ScenarioError::Load { .. } => {
                Self::Config(e.to_string())
            }
            ScenarioError::StartupTimeout { .. }
            | ScenarioError::CommandFailed { .. }
            | ScenarioError::ServiceNotRunning(_) => Self::ScenarioFailed(e.to_string()),
            ScenarioError::Runtime(RuntimeError::Connection(_)) => {
                Self::RuntimeUnavailable(e.to_string())
            }
            ScenarioError::Runtime(_)
            | ScenarioError::UnknownWorkflow(_)
            | ScenarioError::Step { .. } => Self::Command(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagehand_core::error::{ConfigError, TopologyError};

    #[test]
    fn test_exit_code_config_error() {
        let err = CliError::Config("test error".to_owned());
        assert_eq!(err.exit_code(), 2, "config error should return exit code 2");
    }

    #[test]
    fn test_exit_code_scenario_failed() {
        let err = CliError::ScenarioFailed("step 2 failed".to_owned());
        assert_eq!(err.exit_code(), 3, "scenario failure should return exit code 3");
    }

    #[test]
    fn test_exit_code_runtime_unavailable() {
        let err = CliError::RuntimeUnavailable("no socket".to_owned());
        assert_eq!(err.exit_code(), 4, "runtime unavailable should return exit code 4");
    }

    #[test]
    fn test_exit_code_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = CliError::Io(io_err);
        assert_eq!(err.exit_code(), 10, "io error should return exit code 10");
    }

    #[test]
    fn test_exit_code_command_error() {
        let err = CliError::Command("test error".to_owned());
        assert_eq!(err.exit_code(), 1, "command error should return exit code 1");
    }

    #[test]
    fn test_exit_code_core_config_error() {
        let err: CliError = StagehandError::Config(ConfigError::FileNotFound {
            path: "stagehand.toml".to_owned(),
        })
        .into();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_from_scenario_error_command_failed() {
        let err: CliError = ScenarioError::Step {
            step: 6,
            action: "run-command testdrive".to_owned(),
            source: Box::new(ScenarioError::CommandFailed {
                service: "testdrive".to_owned(),
                exit_code: 1,
            }),
        }
        .into();
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("step 6"));
    }

    #[test]
    fn test_from_scenario_error_invalid_scenario() {
        let err: CliError =
            ScenarioError::InvalidScenario(TopologyError::UnknownService("kafka9".to_owned()))
                .into();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_from_scenario_error_runtime_connection() {
        let err: CliError = ScenarioError::Step {
            step: 1,
            action: "start-and-wait zookeeper".to_owned(),
            source: Box::new(ScenarioError::Runtime(RuntimeError::Connection(
                "refused".to_owned(),
            ))),
        }
        .into();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_from_runtime_error() {
        let unreachable: CliError = RuntimeError::Connection("refused".to_owned()).into();
        assert_eq!(unreachable.exit_code(), 4);

        let other: CliError = RuntimeError::Docker("500".to_owned()).into();
        assert_eq!(other.exit_code(), 1);
    }

    #[test]
    fn test_unknown_workflow_is_command_error() {
        let err: CliError = ScenarioError::UnknownWorkflow("nope".to_owned()).into();
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.to_string(), "unknown workflow: nope");
    }

    #[test]
    fn test_error_display_config() {
        let err = CliError::Config("invalid TOML syntax".to_owned());
        let display_str = format!("{}", err);
        assert!(display_str.contains("configuration error"));
        assert!(display_str.contains("invalid TOML syntax"));
    }
}
