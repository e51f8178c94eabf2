//! Native process host.
//!
//! Backs the collector with what a plain process can observe: CPU count and
//! system memory through `sysinfo`, battery changes through the `battery`
//! crate. Paint, resource, connection, intersection and lifecycle hooks do
//! not exist natively and are reported as absent.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};
use tokio::sync::broadcast;

use super::{BatteryStatus, DeviceHints, HeapUsage, Host, MemoryProbe, PageContext};
use crate::error::{Result, VitalsError};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

pub struct SystemHost {
    hints: DeviceHints,
    context: PageContext,
    battery: Option<BatteryWatch>,
}

/// Polling thread that turns battery readings into change notifications.
///
/// The thread is the host's own emitter and lives as long as the
/// [`SystemHost`]. It skips the hardware read while no monitor subscribes,
/// so a destroyed monitor leaves it idle.
struct BatteryWatch {
    tx: broadcast::Sender<BatteryStatus>,
    // Dropping this sender wakes the thread and ends it.
    _stop: mpsc::Sender<()>,
}

impl SystemHost {
    /// Create a host; battery polling starts only if a battery is present.
    pub fn new(battery_poll_interval: Duration) -> Self {
        let hints = collect_hints();
        let context = PageContext {
            url: format!(
                "app://{}",
                System::host_name().unwrap_or_else(|| "localhost".to_string())
            ),
            user_agent: format!(
                "vitalwatch/{} ({} {})",
                env!("CARGO_PKG_VERSION"),
                System::name().unwrap_or_else(|| "unknown".to_string()),
                System::os_version().unwrap_or_default()
            ),
            viewport: None,
            connection: None,
        };

        let battery = if battery_present() {
            match spawn_battery_watch(battery_poll_interval) {
                Ok(watch) => Some(watch),
                Err(e) => {
                    log::warn!("Battery watch unavailable: {}", e);
                    None
                }
            }
        } else {
            log::debug!("No battery detected, battery notifications disabled");
            None
        };

        Self {
            hints,
            context,
            battery,
        }
    }
}

impl Host for SystemHost {
    fn device_hints(&self) -> DeviceHints {
        self.hints.clone()
    }

    fn page_context(&self) -> PageContext {
        self.context.clone()
    }

    fn memory_probe(&self) -> Option<Box<dyn MemoryProbe>> {
        Some(Box::new(SystemMemoryProbe::new()))
    }

    fn battery_events(&self) -> Option<broadcast::Receiver<BatteryStatus>> {
        self.battery.as_ref().map(|watch| watch.tx.subscribe())
    }
}

fn collect_hints() -> DeviceHints {
    let system = System::new_with_specifics(
        RefreshKind::nothing()
            .with_cpu(CpuRefreshKind::nothing())
            .with_memory(MemoryRefreshKind::nothing().with_ram()),
    );

    let logical_cpus = match system.cpus().len() {
        0 => thread::available_parallelism().ok().map(|n| n.get()),
        n => Some(n),
    };

    let total_memory = system.total_memory();
    let device_memory_gb = (total_memory > 0).then(|| total_memory as f64 / BYTES_PER_GB);

    DeviceHints {
        logical_cpus,
        device_memory_gb,
        effective_connection: None,
        viewport_width: None,
        prefers_reduced_motion: false,
    }
}

/// Heap usage approximated by system RAM usage.
struct SystemMemoryProbe {
    system: System,
}

impl SystemMemoryProbe {
    fn new() -> Self {
        Self {
            system: System::new_with_specifics(
                RefreshKind::nothing().with_memory(MemoryRefreshKind::nothing().with_ram()),
            ),
        }
    }
}

impl MemoryProbe for SystemMemoryProbe {
    fn read(&mut self) -> Result<HeapUsage> {
        self.system.refresh_memory();

        let limit_bytes = self.system.total_memory();
        if limit_bytes == 0 {
            return Err(VitalsError::host("total memory not reported"));
        }

        Ok(HeapUsage {
            used_bytes: self.system.used_memory(),
            limit_bytes,
        })
    }
}

fn battery_present() -> bool {
    battery::Manager::new()
        .and_then(|manager| manager.batteries().map(|mut batteries| batteries.next().is_some()))
        .unwrap_or(false)
}

fn read_battery(manager: &battery::Manager) -> Option<BatteryStatus> {
    let battery = manager.batteries().ok()?.flatten().next()?;

    Some(BatteryStatus {
        level: f64::from(battery.state_of_charge().value),
        charging: matches!(battery.state(), battery::State::Charging | battery::State::Full),
    })
}

/// One polling round. Returns whether a change was delivered.
fn poll_battery(
    read: impl FnOnce() -> Option<BatteryStatus>,
    events: &broadcast::Sender<BatteryStatus>,
    last_delivered: &mut Option<BatteryStatus>,
) -> bool {
    if events.receiver_count() == 0 {
        // Nobody listening; the next subscriber gets a fresh reading
        *last_delivered = None;
        return false;
    }

    let Some(status) = read() else {
        return false;
    };
    if *last_delivered == Some(status) {
        return false;
    }
    // Only mark as delivered once somebody received it
    let delivered = events.send(status).is_ok();
    if delivered {
        *last_delivered = Some(status);
    }
    delivered
}

fn spawn_battery_watch(interval: Duration) -> Result<BatteryWatch> {
    let (tx, _) = broadcast::channel(16);
    let (stop_tx, stop_rx) = mpsc::channel::<()>();
    let events = tx.clone();

    // The battery manager is not Send, so it lives on its own thread.
    thread::Builder::new()
        .name("battery-watch".to_string())
        .spawn(move || {
            let manager = match battery::Manager::new() {
                Ok(manager) => manager,
                Err(e) => {
                    log::debug!("Battery manager failed to start: {}", e);
                    return;
                }
            };

            let mut last_delivered: Option<BatteryStatus> = None;

            loop {
                poll_battery(|| read_battery(&manager), &events, &mut last_delivered);

                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => continue,
                    _ => break,
                }
            }
        })?;

    Ok(BatteryWatch { tx, _stop: stop_tx })
}
