//! CLI module for llmstack - command-line interface and subcommands.

pub mod commands;
pub mod output;

pub use commands::{BANNER, Cli, Commands, normalize_args};
