//! CLI module for toolset - command-line interface and subcommands.
//!
//! Provides `describe` for inspecting a contract and `dispatch` for running a
//! composite request against the built-in calculator toolset.

pub mod calculator;
pub mod commands;

pub use commands::Cli;
