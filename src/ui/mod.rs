// UI and formatting module

pub mod formatters;
pub mod report;

// Re-export commonly used items for cleaner imports
pub use formatters::{format_bytes, format_millis, format_score, format_value};
pub use report::{print_metrics, print_score};
