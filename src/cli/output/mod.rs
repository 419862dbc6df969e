//! Terminal output helpers: progress bars and the live batch view.

pub mod progress;
pub mod workflow_view;

pub use progress::{create_percent_bar, create_spinner, MultiProgressManager, ProgressBarExt};
pub use workflow_view::{stage_lines, WorkflowView};
