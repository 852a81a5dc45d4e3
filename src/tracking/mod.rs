//! Opening-line tracking on top of upstream quotes.

pub mod line_tracker;

pub use line_tracker::{decimal_to_american, merge_lines, LineQuote, LineTracker};
