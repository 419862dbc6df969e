//! Status color mapping for CLI output.
//!
//! All coloring respects `NO_COLOR` via the `colored` crate.

use colored::Colorize;

use crate::domain::models::StageStatus;

/// Returns a colored string for file, batch, and validation statuses.
///
/// - Green:  completed, valid, success
/// - Yellow: processing
/// - Blue:   pending
/// - Red:    error, failed, invalid
pub fn colorize_status(status: &str) -> colored::ColoredString {
    match status.to_lowercase().as_str() {
        "completed" | "complete" | "valid" | "success" | "signed" | "saved" => {
            status.green().bold()
        }
        "processing" | "active" => status.yellow(),
        "pending" | "ready" => status.blue(),
        "error" | "failed" | "invalid" => status.red().bold(),
        _ => status.white(),
    }
}

/// Marker shown in front of a pipeline step.
pub fn stage_marker(status: StageStatus) -> colored::ColoredString {
    match status {
        StageStatus::Completed => "\u{2713}".green().bold(),
        StageStatus::Active => "\u{25b6}".yellow().bold(),
        StageStatus::Pending => "\u{00b7}".dimmed(),
    }
}

/// Yes/no cell.
pub fn colorize_bool(value: bool) -> colored::ColoredString {
    if value {
        "yes".green()
    } else {
        "no".red()
    }
}

/// Styled label for detail views (bold + dimmed colon).
pub fn label(name: &str) -> String {
    format!("{}{}", name.bold(), ":".dimmed())
}
