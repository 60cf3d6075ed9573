//! Tooling & Integration Layer
//!
//! Command-line front end over the sync orchestrator and the local state file.

pub mod cli;

pub use cli::{Cli, CliContext, Commands, StatusOutput};
