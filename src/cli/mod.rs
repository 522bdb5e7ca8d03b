//! Command-line interface.
//!
//! Argument parsing with clap and the command implementation that runs
//! the research pipeline.

pub mod commands;
pub mod parser;

pub use commands::execute;
pub use parser::Cli;
