//! Stagehand 시나리오 크레이트
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`ScenarioError`)
//! - [`action`]: Lifecycle actions (`Action`)
//! - [`scenario`]: Topology + actions, TOML loading (`Scenario`)
//! - [`runner`]: Sequential executor (`ScenarioRunner`, `RunnerConfig`)
//! - [`report`]: Run results (`ScenarioReport`, `StepReport`)
//! - [`services`]: Service presets (zookeeper, kafka, schema registry, ...)
//! - [`workflows`]: Built-in workflow registry (`WorkflowRegistry`)
//!
//! # Architecture
//!
//! ```text
//! WorkflowRegistry.build() ──┐
//!                            ├──> Scenario ──> ScenarioRunner.run_scenario()
//! Scenario::from_file() ─────┘                      │
//!                                          ContainerRuntime (trait)
//!                                                   │
//!                                            ScenarioReport
//! ```

pub mod action;
pub mod error;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod services;
pub mod workflows;

// --- Public API Re-exports ---

pub use action::Action;
pub use error::ScenarioError;
pub use report::{ScenarioReport, StepReport};
pub use runner::{RunnerConfig, ScenarioRunner};
pub use scenario::Scenario;
pub use workflows::{WorkflowContext, WorkflowEntry, WorkflowRegistry};
