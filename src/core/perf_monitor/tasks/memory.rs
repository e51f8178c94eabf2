//! Heap pressure polling.

use tokio::sync::broadcast;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};

use super::{spawn_source, MetricSink, Source, SourceKind, StopHandle};
use crate::core::config::CollectorConfig;
use crate::core::perf_monitor::metrics::{keys, MemoryReading};
use crate::core::perf_monitor::profile::DeviceProfile;
use crate::platform::{HeapUsage, MemoryProbe};

/// How often to poll and which readings are worth keeping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryPolicy {
    pub interval: Duration,
    pub record_ratio: f64,
    pub critical_ratio: f64,
}

impl Default for MemoryPolicy {
    fn default() -> Self {
        Self::from_config(&CollectorConfig::default(), &DeviceProfile::default())
    }
}

impl MemoryPolicy {
    /// Low-end devices poll less often.
    pub fn from_config(config: &CollectorConfig, profile: &DeviceProfile) -> Self {
        let mut interval = config.memory_poll_interval();
        if profile.is_low_end_device {
            interval *= config.low_end_poll_multiplier.max(1);
        }

        Self {
            interval,
            record_ratio: config.memory_record_ratio,
            critical_ratio: config.memory_critical_ratio,
        }
    }

    /// Reading to record for this usage, if any.
    pub fn assess(&self, usage: HeapUsage) -> Option<MemoryReading> {
        let ratio = usage.ratio()?;
        if ratio <= self.record_ratio {
            return None;
        }

        Some(MemoryReading {
            used_bytes: usage.used_bytes,
            limit_bytes: usage.limit_bytes,
            ratio,
            critical: ratio > self.critical_ratio,
        })
    }
}

pub struct MemorySource {
    probe: Option<Box<dyn MemoryProbe>>,
    policy: MemoryPolicy,
}

impl MemorySource {
    pub fn new(probe: Option<Box<dyn MemoryProbe>>, policy: MemoryPolicy) -> Self {
        Self { probe, policy }
    }
}

impl Source for MemorySource {
    fn kind(&self) -> SourceKind {
        SourceKind::Memory
    }

    fn start(self: Box<Self>, sink: MetricSink) -> StopHandle {
        let policy = self.policy;
        match self.probe {
            Some(probe) => spawn_source(SourceKind::Memory, |shutdown| {
                memory_task(probe, policy, sink, shutdown)
            }),
            None => StopHandle::noop(SourceKind::Memory.name()),
        }
    }
}

/// Polls the probe every `policy.interval`; the first reading is taken one
/// full interval after start.
async fn memory_task(
    mut probe: Box<dyn MemoryProbe>,
    policy: MemoryPolicy,
    sink: MetricSink,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = interval_at(Instant::now() + policy.interval, policy.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let usage = match probe.read() {
                    Ok(usage) => usage,
                    Err(e) => {
                        log::debug!("Heap usage unavailable: {}", e);
                        continue;
                    }
                };

                if let Some(reading) = policy.assess(usage) {
                    if reading.critical {
                        log::warn!(
                            "Memory pressure critical: {:.0}% of the heap limit in use",
                            reading.ratio * 100.0
                        );
                    }
                    sink.record(keys::MEMORY_PRESSURE, reading);
                }
            }
            _ = shutdown.recv() => break,
        }
    }
}
