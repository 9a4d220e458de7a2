//! TUI Widgets

mod diff;
mod progress;

pub use diff::render_diff;
pub use progress::{render_progress, truncate_string};
