//! Resource-load source. Only image and video entries are kept.

use tokio::sync::broadcast::{self, error::RecvError};

use super::{spawn_source, MetricSink, Source, SourceKind, StopHandle};
use crate::core::perf_monitor::metrics::keys;
use crate::platform::ResourceTiming;

pub struct ResourceSource {
    events: Option<broadcast::Receiver<ResourceTiming>>,
}

impl ResourceSource {
    pub fn new(events: Option<broadcast::Receiver<ResourceTiming>>) -> Self {
        Self { events }
    }
}

impl Source for ResourceSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Resources
    }

    fn start(self: Box<Self>, sink: MetricSink) -> StopHandle {
        match self.events {
            Some(events) => spawn_source(SourceKind::Resources, |shutdown| {
                resource_task(events, sink, shutdown)
            }),
            None => StopHandle::noop(SourceKind::Resources.name()),
        }
    }
}

async fn resource_task(
    mut events: broadcast::Receiver<ResourceTiming>,
    sink: MetricSink,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            received = events.recv() => match received {
                Ok(entry) => {
                    record_resource(entry, &sink);
                }
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("Resource source fell behind, {} entries skipped", skipped);
                }
                Err(RecvError::Closed) => break,
            },
            _ = shutdown.recv() => break,
        }
    }
}

fn record_resource(entry: ResourceTiming, sink: &MetricSink) -> bool {
    if !entry.kind.is_media() {
        return false;
    }
    sink.record(keys::RESOURCE_LOAD, entry)
}
