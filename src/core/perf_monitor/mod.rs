//! Client-side performance collection.
//!
//! Sources feed a bounded [`MetricStore`]; the [`PerformanceMonitor`] owns the
//! whole pipeline and the [`scorer`] turns a snapshot into a health score.

pub mod metrics;
mod profile;
pub mod reporter;
mod runtime;
pub mod scorer;
mod store;
pub mod tasks;

pub use metrics::{keys, MemoryReading, Sample, SampleValue, VisibilityRecord};
pub use profile::DeviceProfile;
pub use reporter::{ReportError, ReportPayload, Reporter};
pub use runtime::{
    install_ctrlc_handler, register_exit_hooks, CollectorState, ExitHooks, PerformanceMonitor,
};
pub use scorer::{score, PerformanceScore, Vital};
pub use store::{
    MetricStore, MetricsSnapshot, DEFAULT_MAX_RESOURCE_SAMPLES, DEFAULT_MAX_VITAL_SAMPLES,
};
pub use tasks::{MetricSink, Source, SourceKind, StopHandle};
