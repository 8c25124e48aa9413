//! Container runtime layer for stagehand.
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`RuntimeError`)
//! - [`docker`]: Runtime abstraction (`ContainerRuntime` trait, `BollardRuntime`)
//! - `mock`: In-memory runtime that records every call (feature `mock`)
//!
//! # Architecture
//!
//! ```text
//! ScenarioRunner --> ContainerRuntime::start_service / probe_tcp
//!                                      kill_service / run_oneshot
//!                          |
//!                    BollardRuntime --> Docker daemon
//! ```

pub mod docker;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

// --- Public API Re-exports ---

// Runtime
pub use docker::{BollardRuntime, ContainerRuntime};

// Error
pub use error::RuntimeError;

// Mock
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockRuntime, RecordedCall, RuntimeCall};
