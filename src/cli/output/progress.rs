//! Progress bar utilities using indicatif for terminal output
//!
//! Bars here measure percentages (0-100), which is what the backend reports
//! per file. Everything draws to stderr so `--json` output on stdout stays
//! parseable.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

const PERCENT_TEMPLATE: &str = "{prefix:>28.bold} {bar:30.cyan/blue} {pos:>3}% {msg}";
const SPINNER_TEMPLATE: &str = "[{elapsed_precise}] {spinner:.green} {msg}";

const PROGRESS_CHARS: &str = "█▓▒░ ";
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

fn percent_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(PERCENT_TEMPLATE)
        .map_or_else(|_| ProgressStyle::default_bar(), |s| s.progress_chars(PROGRESS_CHARS))
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template(SPINNER_TEMPLATE)
        .map_or_else(|_| ProgressStyle::default_spinner(), |s| s.tick_chars(SPINNER_CHARS))
}

/// A 0-100 bar labelled with `prefix`.
pub fn create_percent_bar(prefix: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new(100);
    pb.set_style(percent_style());
    pb.set_prefix(prefix.into());
    pb
}

/// Spinner for requests without measurable progress.
pub fn create_spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(spinner_style());
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Extension trait for ProgressBar to add common utility methods
pub trait ProgressBarExt {
    /// Finish with a success message (green checkmark)
    fn finish_success(&self, message: impl Into<String>);

    /// Finish with an error message (red X)
    fn finish_error(&self, message: impl Into<String>);

    /// Finish with a warning message (yellow !)
    fn finish_warning(&self, message: impl Into<String>);

    /// Update progress and message in one call
    fn set_progress(&self, position: u64, message: impl Into<String>);
}

impl ProgressBarExt for ProgressBar {
    fn finish_success(&self, message: impl Into<String>) {
        self.finish_with_message(format!("✓ {}", message.into()));
    }

    fn finish_error(&self, message: impl Into<String>) {
        self.finish_with_message(format!("✗ {}", message.into()));
    }

    fn finish_warning(&self, message: impl Into<String>) {
        self.finish_with_message(format!("! {}", message.into()));
    }

    fn set_progress(&self, position: u64, message: impl Into<String>) {
        self.set_position(position);
        self.set_message(message.into());
    }
}

/// Several bars drawn together on stderr.
pub struct MultiProgressManager {
    multi: MultiProgress,
}

impl MultiProgressManager {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::with_draw_target(ProgressDrawTarget::stderr()),
        }
    }

    /// Nothing is drawn. Used for JSON mode and tests.
    pub fn hidden() -> Self {
        Self {
            multi: MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
        }
    }

    pub fn add_percent_bar(&self, prefix: impl Into<String>) -> ProgressBar {
        self.multi.add(create_percent_bar(prefix))
    }

    /// Print a line above the bars without tearing them.
    pub fn println(&self, line: impl AsRef<str>) {
        self.multi.println(line).ok();
    }

    pub fn inner(&self) -> &MultiProgress {
        &self.multi
    }

    pub fn clear(&self) {
        self.multi.clear().ok();
    }
}

impl Default for MultiProgressManager {
    fn default() -> Self {
        Self::new()
    }
}
