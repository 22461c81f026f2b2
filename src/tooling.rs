//! Tooling & Integration Layer
//!
//! The `leafsync` command-line interface and its text rendering.

pub mod cli;
pub mod format;

pub use cli::{Cli, CliContext, Commands, ConfigCommands};
