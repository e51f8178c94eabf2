//! Channel-backed host.
//!
//! The embedding application pushes platform notifications in through the
//! `emit_*` methods (for example from a webview bridge). Each capability can
//! be switched off to model hosts where the hook does not exist.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::broadcast;

use super::{
    BatteryStatus, ConnectionInfo, DeviceHints, HeapUsage, Host, IntersectionEntry,
    IntersectionObserver, MemoryProbe, PageContext, PageLifecycle, PaintEvent, ResourceTiming,
};
use crate::error::{Result, VitalsError};

const CHANNEL_CAPACITY: usize = 256;

/// Which hooks a [`ManualHost`] exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostCapabilities {
    pub paint: bool,
    pub resources: bool,
    pub memory: bool,
    pub connection: bool,
    pub battery: bool,
    pub intersection: bool,
    pub lifecycle: bool,
}

impl HostCapabilities {
    pub fn all() -> Self {
        Self {
            paint: true,
            resources: true,
            memory: true,
            connection: true,
            battery: true,
            intersection: true,
            lifecycle: true,
        }
    }

    pub fn none() -> Self {
        Self {
            paint: false,
            resources: false,
            memory: false,
            connection: false,
            battery: false,
            intersection: false,
            lifecycle: false,
        }
    }
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self::all()
    }
}

pub struct ManualHost {
    hints: DeviceHints,
    context: Mutex<PageContext>,
    paint: Option<broadcast::Sender<PaintEvent>>,
    resources: Option<broadcast::Sender<ResourceTiming>>,
    heap: Option<Arc<Mutex<Option<HeapUsage>>>>,
    connection: Option<broadcast::Sender<ConnectionInfo>>,
    battery: Option<broadcast::Sender<BatteryStatus>>,
    intersection: Option<Arc<ManualIntersectionObserver>>,
    lifecycle: Option<broadcast::Sender<PageLifecycle>>,
}

impl ManualHost {
    pub fn new(capabilities: HostCapabilities) -> Self {
        fn channel<T: Clone>(enabled: bool) -> Option<broadcast::Sender<T>> {
            enabled.then(|| broadcast::channel(CHANNEL_CAPACITY).0)
        }

        Self {
            hints: DeviceHints::default(),
            context: Mutex::new(PageContext::default()),
            paint: channel(capabilities.paint),
            resources: channel(capabilities.resources),
            heap: capabilities.memory.then(|| Arc::new(Mutex::new(None))),
            connection: channel(capabilities.connection),
            battery: channel(capabilities.battery),
            intersection: capabilities
                .intersection
                .then(|| Arc::new(ManualIntersectionObserver::new())),
            lifecycle: channel(capabilities.lifecycle),
        }
    }

    /// Host with every capability enabled
    pub fn with_all() -> Self {
        Self::new(HostCapabilities::all())
    }

    pub fn with_hints(mut self, hints: DeviceHints) -> Self {
        self.hints = hints;
        self
    }

    pub fn with_context(self, context: PageContext) -> Self {
        *self.context.lock() = context;
        self
    }

    pub fn set_context(&self, context: PageContext) {
        *self.context.lock() = context;
    }

    // Emitters return whether at least one subscriber received the notification.

    pub fn emit_paint(&self, event: PaintEvent) -> bool {
        send(&self.paint, event)
    }

    pub fn emit_resource(&self, entry: ResourceTiming) -> bool {
        send(&self.resources, entry)
    }

    pub fn emit_connection(&self, info: ConnectionInfo) -> bool {
        send(&self.connection, info)
    }

    pub fn emit_battery(&self, status: BatteryStatus) -> bool {
        send(&self.battery, status)
    }

    pub fn emit_lifecycle(&self, transition: PageLifecycle) -> bool {
        send(&self.lifecycle, transition)
    }

    /// Report an intersection change. Dropped unless the target is observed.
    pub fn emit_intersection(&self, entry: IntersectionEntry) -> bool {
        match &self.intersection {
            Some(observer) => observer.emit(entry),
            None => false,
        }
    }

    /// Set the value the memory probe returns on its next read.
    pub fn set_heap_usage(&self, usage: HeapUsage) -> bool {
        match &self.heap {
            Some(slot) => {
                *slot.lock() = Some(usage);
                true
            }
            None => false,
        }
    }

    pub fn intersection_observer(&self) -> Option<Arc<ManualIntersectionObserver>> {
        self.intersection.clone()
    }
}

fn send<T>(sender: &Option<broadcast::Sender<T>>, value: T) -> bool {
    sender
        .as_ref()
        .map(|tx| tx.send(value).is_ok())
        .unwrap_or(false)
}

impl Host for ManualHost {
    fn device_hints(&self) -> DeviceHints {
        self.hints.clone()
    }

    fn page_context(&self) -> PageContext {
        self.context.lock().clone()
    }

    fn paint_events(&self) -> Option<broadcast::Receiver<PaintEvent>> {
        self.paint.as_ref().map(|tx| tx.subscribe())
    }

    fn resource_events(&self) -> Option<broadcast::Receiver<ResourceTiming>> {
        self.resources.as_ref().map(|tx| tx.subscribe())
    }

    fn memory_probe(&self) -> Option<Box<dyn MemoryProbe>> {
        self.heap.as_ref().map(|slot| {
            Box::new(SharedHeapProbe {
                slot: Arc::clone(slot),
            }) as Box<dyn MemoryProbe>
        })
    }

    fn connection_events(&self) -> Option<broadcast::Receiver<ConnectionInfo>> {
        self.connection.as_ref().map(|tx| tx.subscribe())
    }

    fn battery_events(&self) -> Option<broadcast::Receiver<BatteryStatus>> {
        self.battery.as_ref().map(|tx| tx.subscribe())
    }

    fn intersection(&self) -> Option<Arc<dyn IntersectionObserver>> {
        self.intersection
            .as_ref()
            .map(|observer| Arc::clone(observer) as Arc<dyn IntersectionObserver>)
    }

    fn lifecycle_events(&self) -> Option<broadcast::Receiver<PageLifecycle>> {
        self.lifecycle.as_ref().map(|tx| tx.subscribe())
    }
}

struct SharedHeapProbe {
    slot: Arc<Mutex<Option<HeapUsage>>>,
}

impl MemoryProbe for SharedHeapProbe {
    fn read(&mut self) -> Result<HeapUsage> {
        (*self.slot.lock()).ok_or_else(|| VitalsError::host("no heap usage published yet"))
    }
}

/// Intersection observer that only forwards entries for observed targets.
pub struct ManualIntersectionObserver {
    observed: Mutex<HashSet<String>>,
    tx: broadcast::Sender<IntersectionEntry>,
}

impl ManualIntersectionObserver {
    fn new() -> Self {
        Self {
            observed: Mutex::new(HashSet::new()),
            tx: broadcast::channel(CHANNEL_CAPACITY).0,
        }
    }

    pub fn is_observing(&self, target: &str) -> bool {
        self.observed.lock().contains(target)
    }

    pub fn observed_count(&self) -> usize {
        self.observed.lock().len()
    }

    fn emit(&self, entry: IntersectionEntry) -> bool {
        if !self.is_observing(&entry.target) {
            return false;
        }
        self.tx.send(entry).is_ok()
    }
}

impl IntersectionObserver for ManualIntersectionObserver {
    fn observe(&self, target: &str) {
        self.observed.lock().insert(target.to_string());
    }

    fn unobserve(&self, target: &str) {
        self.observed.lock().remove(target);
    }

    fn disconnect(&self) {
        self.observed.lock().clear();
    }

    fn entries(&self) -> broadcast::Receiver<IntersectionEntry> {
        self.tx.subscribe()
    }
}
