//! Stagehand CLI library
//!
//! Exposes argument parsing, command handlers and output rendering so the
//! `stagehand` binary stays a thin entry point and handlers can be driven
//! from integration tests with a mock runtime.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;
