//! Tooling & Integration Layer
//!
//! Command-line access to a store.

pub mod cli;

pub use cli::{Cli, CliContext, CliError, Commands};
