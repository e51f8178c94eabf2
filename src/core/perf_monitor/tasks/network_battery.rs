//! Connection quality and battery state.
//!
//! Both signals are change notifications and share one task. Either may be
//! missing; the task ends once every channel it listens on has closed.

use tokio::sync::broadcast::{self, error::RecvError};

use super::{spawn_source, MetricSink, Source, SourceKind, StopHandle};
use crate::core::perf_monitor::metrics::keys;
use crate::platform::{BatteryStatus, ConnectionInfo};

pub struct NetworkBatterySource {
    connection: Option<broadcast::Receiver<ConnectionInfo>>,
    battery: Option<broadcast::Receiver<BatteryStatus>>,
}

impl NetworkBatterySource {
    pub fn new(
        connection: Option<broadcast::Receiver<ConnectionInfo>>,
        battery: Option<broadcast::Receiver<BatteryStatus>>,
    ) -> Self {
        Self {
            connection,
            battery,
        }
    }
}

impl Source for NetworkBatterySource {
    fn kind(&self) -> SourceKind {
        SourceKind::NetworkBattery
    }

    fn start(self: Box<Self>, sink: MetricSink) -> StopHandle {
        if self.connection.is_none() && self.battery.is_none() {
            return StopHandle::noop(SourceKind::NetworkBattery.name());
        }

        let Self {
            connection,
            battery,
        } = *self;

        spawn_source(SourceKind::NetworkBattery, |shutdown| {
            network_battery_task(connection, battery, sink, shutdown)
        })
    }
}

async fn network_battery_task(
    mut connection: Option<broadcast::Receiver<ConnectionInfo>>,
    mut battery: Option<broadcast::Receiver<BatteryStatus>>,
    sink: MetricSink,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut connection_open = connection.is_some();
    let mut battery_open = battery.is_some();

    while connection_open || battery_open {
        tokio::select! {
            received = next_change(&mut connection), if connection_open => match received {
                Ok(info) => {
                    sink.record(keys::CONNECTION, info);
                }
                Err(RecvError::Lagged(skipped)) => {
                    log::debug!("Skipped {} connection changes", skipped);
                }
                Err(RecvError::Closed) => connection_open = false,
            },
            received = next_change(&mut battery), if battery_open => match received {
                Ok(status) => {
                    sink.record(keys::BATTERY, status);
                }
                Err(RecvError::Lagged(skipped)) => {
                    log::debug!("Skipped {} battery changes", skipped);
                }
                Err(RecvError::Closed) => battery_open = false,
            },
            _ = shutdown.recv() => break,
        }
    }
}

async fn next_change<T: Clone>(
    receiver: &mut Option<broadcast::Receiver<T>>,
) -> Result<T, RecvError> {
    match receiver {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}
