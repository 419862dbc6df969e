//! Command-line interface: clap command tree, context wiring, and output.

pub mod commands;
pub mod context;
pub mod display;
pub mod output;
pub mod types;

use colored::Colorize;

pub use context::AppContext;
pub use types::{Cli, Commands};

/// Print the error chain and exit non-zero.
///
/// Errors go to stderr in both modes so stdout only ever carries command
/// output.
pub fn handle_error(err: &anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let body = serde_json::json!({ "error": format!("{err:#}") });
        eprintln!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("{} {err:#}", "Error:".red().bold());
    }
    std::process::exit(1)
}
