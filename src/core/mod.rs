// Core collector logic

pub mod config;
pub mod perf_monitor;

// Re-export commonly used items
pub use config::CollectorConfig;
pub use perf_monitor::{PerformanceMonitor, PerformanceScore};
