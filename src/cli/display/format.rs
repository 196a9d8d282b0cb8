//! Small formatting helpers for session fields.

use chrono::{DateTime, Utc};
use console::{style, StyledObject};

use crate::domain::models::ScanStatus;

/// Status colored by lifecycle stage: queued blue, processing yellow, done green, failed red.
pub fn colorize_status(status: ScanStatus) -> StyledObject<&'static str> {
    let text = style(status.as_str());
    match status {
        ScanStatus::Queued => text.blue(),
        ScanStatus::Processing => text.yellow(),
        ScanStatus::Done => text.green().bold(),
        ScanStatus::Failed => text.red().bold(),
    }
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Dimmed, padded field label for detail views.
pub fn label(name: &str) -> String {
    style(format!("{name:<16}")).dim().to_string()
}
