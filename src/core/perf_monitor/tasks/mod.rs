//! Observation sources.
//!
//! Each source wraps one host capability, runs in its own task and only ever
//! writes through a [`MetricSink`]. Starting a source hands back a
//! [`StopHandle`]; the runtime keeps every handle and fires them on teardown.

mod memory;
mod network_battery;
mod paint;
mod resources;
mod visibility;

pub use memory::{MemoryPolicy, MemorySource};
pub use network_battery::NetworkBatterySource;
pub use paint::{LayoutShiftTotal, PaintSource};
pub use resources::ResourceSource;
pub use visibility::VisibilitySource;

use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::broadcast;

use super::metrics::{keys, Sample, SampleValue};
use super::reporter::Reporter;
use super::store::MetricStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Paint,
    Resources,
    Memory,
    NetworkBattery,
    Visibility,
}

impl SourceKind {
    pub fn name(self) -> &'static str {
        match self {
            SourceKind::Paint => "paint",
            SourceKind::Resources => "resources",
            SourceKind::Memory => "memory",
            SourceKind::NetworkBattery => "network-battery",
            SourceKind::Visibility => "visibility",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An observation source the runtime can start.
pub trait Source: Send {
    fn kind(&self) -> SourceKind;

    /// Subscribe and begin recording. A source whose capability is absent
    /// returns a no-op handle.
    fn start(self: Box<Self>, sink: MetricSink) -> StopHandle;
}

/// Idempotent stop action. Dropping the handle stops as well.
#[must_use = "dropping a StopHandle stops the source right away"]
pub struct StopHandle {
    label: &'static str,
    stop: Option<Box<dyn FnOnce() + Send>>,
}

impl StopHandle {
    pub fn new(label: &'static str, stop: impl FnOnce() + Send + 'static) -> Self {
        Self {
            label,
            stop: Some(Box::new(stop)),
        }
    }

    pub fn noop(label: &'static str) -> Self {
        Self { label, stop: None }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// False once stopped, or if nothing was started
    pub fn is_active(&self) -> bool {
        self.stop.is_some()
    }

    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop();
        }
    }
}

impl Drop for StopHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for StopHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StopHandle")
            .field("label", &self.label)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Write path shared by every source.
///
/// Records are dropped once the owning monitor is no longer running.
#[derive(Clone)]
pub struct MetricSink {
    store: Arc<Mutex<MetricStore>>,
    alive: Arc<AtomicBool>,
    reporter: Option<Reporter>,
}

impl MetricSink {
    pub fn new(
        store: Arc<Mutex<MetricStore>>,
        alive: Arc<AtomicBool>,
        reporter: Option<Reporter>,
    ) -> Self {
        Self {
            store,
            alive,
            reporter,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Record a sample; vitals are also forwarded to the reporter.
    pub fn record(&self, key: &str, value: impl Into<SampleValue>) -> bool {
        let reporter = self
            .reporter
            .as_ref()
            .filter(|_| keys::REPORTED_VITALS.contains(&key));
        self.write(key, value.into(), reporter)
    }

    /// Record a sample and forward it to the reporter whatever its key.
    pub fn record_and_report(&self, key: &str, value: impl Into<SampleValue>) -> bool {
        self.write(key, value.into(), self.reporter.as_ref())
    }

    fn write(&self, key: &str, value: SampleValue, reporter: Option<&Reporter>) -> bool {
        let forwarded = reporter.map(|_| value.clone());

        let accepted = {
            let mut store = self.store.lock();
            // Checked under the lock so nothing lands after teardown clears the store
            if !self.is_alive() {
                return false;
            }
            store.record(key, Sample::now(value))
        };

        if accepted {
            if let (Some(reporter), Some(value)) = (reporter, forwarded) {
                reporter.report(key, value);
            }
        }

        accepted
    }
}

/// Spawn a source task with its own shutdown channel.
pub(crate) fn spawn_source<F, Fut>(kind: SourceKind, task: F) -> StopHandle
where
    F: FnOnce(broadcast::Receiver<()>) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    let Ok(runtime) = Handle::try_current() else {
        log::warn!("{} source needs an async runtime, not started", kind);
        return StopHandle::noop(kind.name());
    };

    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
    let handle = runtime.spawn(task(shutdown_rx));

    StopHandle::new(kind.name(), move || {
        // No receiver left just means the task already ended
        let _ = shutdown_tx.send(());
        handle.abort();
    })
}

#[cfg(test)]
pub(crate) fn test_sink() -> (MetricSink, Arc<Mutex<MetricStore>>) {
    let store = Arc::new(Mutex::new(MetricStore::new()));
    let sink = MetricSink::new(Arc::clone(&store), Arc::new(AtomicBool::new(true)), None);
    (sink, store)
}
