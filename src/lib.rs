// vitalwatch library - public API

// Re-export error types
pub mod error;
pub use error::{Result, VitalsError};

// Module declarations
pub mod commands;
pub mod core;
pub mod platform;
pub mod ui;

// Re-export commonly used types
pub use core::config::CollectorConfig;
pub use core::perf_monitor::{
    install_ctrlc_handler, register_exit_hooks, CollectorState, DeviceProfile, ExitHooks,
    MetricsSnapshot, PerformanceMonitor, PerformanceScore, Sample, SampleValue,
};

// Initialize logging
pub fn init_logging() {
    // RUST_LOG, when set, overrides the info default
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
