//! Lifecycle controller for the collector.
//!
//! [`PerformanceMonitor`] owns the store, starts every observation source on
//! [`init`](PerformanceMonitor::init) and tears them all down on
//! [`destroy`](PerformanceMonitor::destroy). Destroyed is terminal: a
//! destroyed monitor never collects again.

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::metrics::SampleValue;
use super::profile::DeviceProfile;
use super::reporter::Reporter;
use super::scorer::{self, PerformanceScore};
use super::store::{MetricStore, MetricsSnapshot};
use super::tasks::{
    MemoryPolicy, MemorySource, MetricSink, NetworkBatterySource, PaintSource, ResourceSource,
    Source, StopHandle, VisibilitySource,
};
use crate::core::config::CollectorConfig;
use crate::error::{Result, VitalsError};
use crate::platform::{Host, IntersectionObserver};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorState {
    Uninitialized,
    Running,
    Destroyed,
}

struct Lifecycle {
    state: CollectorState,
    stops: Vec<StopHandle>,
    intersection: Option<Arc<dyn IntersectionObserver>>,
}

pub struct PerformanceMonitor {
    host: Arc<dyn Host>,
    config: CollectorConfig,
    store: Arc<Mutex<MetricStore>>,
    /// Recording gate shared with every sink; true only while running
    alive: Arc<AtomicBool>,
    reporter: Option<Reporter>,
    profile: OnceCell<DeviceProfile>,
    lifecycle: Mutex<Lifecycle>,
    /// Flips to true once on teardown
    torn_down: watch::Sender<bool>,
}

impl PerformanceMonitor {
    /// Build a monitor. Nothing is observed until [`init`](Self::init).
    ///
    /// An unusable endpoint disables reporting; collection still works.
    pub fn new(host: Arc<dyn Host>, config: CollectorConfig) -> Self {
        let reporter = build_reporter(&host, &config);
        let store =
            MetricStore::with_capacities(config.max_vital_samples, config.max_resource_samples);

        Self {
            host,
            config,
            store: Arc::new(Mutex::new(store)),
            alive: Arc::new(AtomicBool::new(false)),
            reporter,
            profile: OnceCell::new(),
            lifecycle: Mutex::new(Lifecycle {
                state: CollectorState::Uninitialized,
                stops: Vec::new(),
                intersection: None,
            }),
            torn_down: watch::Sender::new(false),
        }
    }

    pub fn state(&self) -> CollectorState {
        self.lifecycle.lock().state
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    pub fn is_reporting(&self) -> bool {
        self.reporter.is_some()
    }

    /// Device profile, detected from host hints on first use.
    pub fn device_profile(&self) -> DeviceProfile {
        *self
            .profile
            .get_or_init(|| DeviceProfile::detect(&self.host.device_hints()))
    }

    /// Start every source the host supports. Calling it again is a no-op.
    pub fn init(&self) {
        let mut lifecycle = self.lifecycle.lock();
        match lifecycle.state {
            CollectorState::Running => {
                log::debug!("Performance monitor already running");
                return;
            }
            CollectorState::Destroyed => {
                log::warn!("Performance monitor was destroyed; create a new one to collect again");
                return;
            }
            CollectorState::Uninitialized => {}
        }

        let profile = self.device_profile();
        if profile.is_low_end_device {
            log::info!("Low-end device detected, memory polling slowed down");
        }

        self.alive.store(true, Ordering::Release);
        let sink = self.sink();
        let intersection = self.host.intersection();

        let sources: Vec<Box<dyn Source>> = vec![
            Box::new(PaintSource::new(self.host.paint_events())),
            Box::new(ResourceSource::new(self.host.resource_events())),
            Box::new(MemorySource::new(
                self.host.memory_probe(),
                MemoryPolicy::from_config(&self.config, &profile),
            )),
            Box::new(NetworkBatterySource::new(
                self.host.connection_events(),
                self.host.battery_events(),
            )),
            Box::new(VisibilitySource::new(intersection.clone())),
        ];

        for source in sources {
            let kind = source.kind();
            let handle = source.start(sink.clone());
            if handle.is_active() {
                log::debug!("{} source started", kind);
            } else {
                log::debug!("{} source unavailable on this host", kind);
            }
            lifecycle.stops.push(handle);
        }

        let active = lifecycle.stops.iter().filter(|h| h.is_active()).count();
        lifecycle.intersection = intersection;
        lifecycle.state = CollectorState::Running;

        log::info!(
            "Performance monitor started ({} of {} sources active)",
            active,
            lifecycle.stops.len()
        );
    }

    /// Stop every source, drop all samples and refuse further recording.
    /// Safe to call any number of times.
    pub fn destroy(&self) {
        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.state == CollectorState::Destroyed {
            return;
        }

        self.alive.store(false, Ordering::Release);
        for mut handle in lifecycle.stops.drain(..) {
            handle.stop();
        }
        lifecycle.intersection = None;
        lifecycle.state = CollectorState::Destroyed;

        self.store.lock().clear();
        self.torn_down.send_replace(true);
        log::info!("Performance monitor destroyed");
    }

    /// Resolves once [`destroy`](Self::destroy) has run, from any thread or
    /// hook. Resolves immediately if it already has.
    pub async fn destroyed(&self) {
        let mut torn_down = self.torn_down.subscribe();
        // The sender lives in `self`, so the channel cannot close while borrowed
        let _ = torn_down.wait_for(|done| *done).await;
    }

    /// Detached copy of the store
    pub fn get_metrics(&self) -> MetricsSnapshot {
        self.store.lock().snapshot()
    }

    pub fn get_performance_score(&self) -> PerformanceScore {
        scorer::score(&self.get_metrics(), &self.device_profile())
    }

    /// Time a synchronous unit of work and record its duration in
    /// milliseconds under `name`. The result is returned unchanged.
    pub fn measure<T>(&self, name: &str, work: impl FnOnce() -> T) -> T {
        let started = Instant::now();
        let result = work();
        self.record_duration(name, started.elapsed());
        result
    }

    /// Async counterpart of [`measure`](Self::measure). Errors in the output
    /// are passed through; the duration is recorded either way.
    pub async fn measure_async<F: Future>(&self, name: &str, work: F) -> F::Output {
        let started = Instant::now();
        let output = work.await;
        self.record_duration(name, started.elapsed());
        output
    }

    /// Record a custom metric and forward it to the endpoint.
    pub fn track(&self, name: &str, value: impl Into<SampleValue>) -> bool {
        self.sink().record_and_report(name, value)
    }

    /// Start watching a target for viewport intersection.
    pub fn observe_element(&self, target: &str) -> bool {
        let lifecycle = self.lifecycle.lock();
        match (&lifecycle.state, &lifecycle.intersection) {
            (CollectorState::Running, Some(observer)) => {
                observer.observe(target);
                true
            }
            _ => false,
        }
    }

    pub fn unobserve_element(&self, target: &str) -> bool {
        let lifecycle = self.lifecycle.lock();
        match (&lifecycle.state, &lifecycle.intersection) {
            (CollectorState::Running, Some(observer)) => {
                observer.unobserve(target);
                true
            }
            _ => false,
        }
    }

    fn record_duration(&self, name: &str, elapsed: Duration) {
        let millis = elapsed.as_secs_f64() * 1000.0;
        log::debug!("{} took {:.2}ms", name, millis);
        self.sink().record(name, millis);
    }

    fn sink(&self) -> MetricSink {
        MetricSink::new(
            Arc::clone(&self.store),
            Arc::clone(&self.alive),
            self.reporter.clone(),
        )
    }
}

fn build_reporter(host: &Arc<dyn Host>, config: &CollectorConfig) -> Option<Reporter> {
    let endpoint = match config.endpoint() {
        Ok(Some(endpoint)) => endpoint,
        Ok(None) => return None,
        Err(e) => {
            log::warn!("Reporting disabled: {}", e);
            return None;
        }
    };

    match Reporter::new(endpoint, config.report_timeout(), Arc::clone(host)) {
        Ok(reporter) => Some(reporter.with_namespace(config.namespace.clone())),
        Err(e) => {
            log::warn!("Reporting disabled: {}", e);
            None
        }
    }
}

/// Handle to the task started by [`register_exit_hooks`].
///
/// The task runs detached: dropping this handle leaves the hooks in place.
/// Call [`stop`](Self::stop) to remove them.
#[derive(Debug)]
pub struct ExitHooks {
    task: Option<JoinHandle<()>>,
}

impl ExitHooks {
    fn inactive() -> Self {
        Self { task: None }
    }

    /// False when nothing was registered, after `stop`, or once the hook fired
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Destroy the monitor when the host signals the page is going away.
///
/// Only a weak reference is held, so the hook never keeps the monitor alive.
pub fn register_exit_hooks(monitor: &Arc<PerformanceMonitor>) -> ExitHooks {
    let Some(mut transitions) = monitor.host.lifecycle_events() else {
        log::debug!("Host has no page lifecycle events, teardown is manual");
        return ExitHooks::inactive();
    };
    let Ok(runtime) = Handle::try_current() else {
        log::warn!("Exit hooks need an async runtime, not registered");
        return ExitHooks::inactive();
    };

    let monitor: Weak<PerformanceMonitor> = Arc::downgrade(monitor);
    let task = runtime.spawn(async move {
        loop {
            match transitions.recv().await {
                Ok(transition) if transition.is_exit() => {
                    if let Some(monitor) = monitor.upgrade() {
                        log::info!("Page lifecycle {:?}, tearing down", transition);
                        monitor.destroy();
                    }
                    break;
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("Missed {} page lifecycle transitions", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    ExitHooks { task: Some(task) }
}

/// Destroy the monitor on Ctrl+C.
///
/// Await [`PerformanceMonitor::destroyed`] to react to the interrupt.
pub fn install_ctrlc_handler(monitor: &Arc<PerformanceMonitor>) -> Result<()> {
    let monitor = Arc::downgrade(monitor);
    ctrlc::set_handler(move || {
        if let Some(monitor) = monitor.upgrade() {
            log::info!("Interrupted, tearing down");
            monitor.destroy();
        }
    })
    .map_err(|e| VitalsError::other(format!("Failed to set Ctrl+C handler: {}", e)))
}
