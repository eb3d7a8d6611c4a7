//! Library interface for the intellisense-check CLI
//!
//! This module exposes the command implementations for integration testing
//! while keeping argument parsing and output in main.rs.

pub mod commands;

pub use anyhow::Result;
pub use commands::{check_fixture, run_fixture, RunSummary, WorkspaceRun};
pub use intellisense_check_core::config::Config;
