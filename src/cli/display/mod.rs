//! Display primitives shared by command output: tables, status colors and
//! the pipeline progress bar.

pub mod format;
pub mod progress;
pub mod table;

pub use format::{colorize_status, format_timestamp, label};
pub use progress::create_pipeline_bar;
pub use table::{list_table, render_list};
