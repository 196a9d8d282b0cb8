//! Progress bar for `session run`.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const PIPELINE_TEMPLATE: &str = "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>3}% {msg}";
const PROGRESS_CHARS: &str = "█▓▒░ ";

/// A 0-100 bar driven by session progress.
pub fn create_pipeline_bar() -> ProgressBar {
    let pb = ProgressBar::new(100);
    if let Ok(style) = ProgressStyle::default_bar().template(PIPELINE_TEMPLATE) {
        pb.set_style(style.progress_chars(PROGRESS_CHARS));
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
