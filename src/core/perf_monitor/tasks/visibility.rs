//! Element visibility via the host's intersection observer.

use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};

use super::{spawn_source, MetricSink, Source, SourceKind, StopHandle};
use crate::core::perf_monitor::metrics::{keys, VisibilityRecord};
use crate::platform::{IntersectionEntry, IntersectionObserver};

pub struct VisibilitySource {
    observer: Option<Arc<dyn IntersectionObserver>>,
}

impl VisibilitySource {
    pub fn new(observer: Option<Arc<dyn IntersectionObserver>>) -> Self {
        Self { observer }
    }
}

impl Source for VisibilitySource {
    fn kind(&self) -> SourceKind {
        SourceKind::Visibility
    }

    /// Targets are attached later through the monitor. Stopping disconnects
    /// the observer so every target is released.
    fn start(self: Box<Self>, sink: MetricSink) -> StopHandle {
        let Some(observer) = self.observer else {
            return StopHandle::noop(SourceKind::Visibility.name());
        };

        let entries = observer.entries();
        let mut task = spawn_source(SourceKind::Visibility, |shutdown| {
            visibility_task(entries, sink, shutdown)
        });

        StopHandle::new(SourceKind::Visibility.name(), move || {
            observer.disconnect();
            task.stop();
        })
    }
}

async fn visibility_task(
    mut entries: broadcast::Receiver<IntersectionEntry>,
    sink: MetricSink,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            received = entries.recv() => match received {
                Ok(entry) => record_entry(entry, &sink),
                Err(RecvError::Lagged(skipped)) => {
                    log::debug!("Skipped {} intersection entries", skipped);
                }
                Err(RecvError::Closed) => break,
            },
            _ = shutdown.recv() => break,
        }
    }
}

fn record_entry(entry: IntersectionEntry, sink: &MetricSink) {
    if !entry.is_intersecting {
        return;
    }

    log::debug!("Element '{}' entered the viewport ({:.2})", entry.target, entry.ratio);
    sink.record(
        keys::ELEMENT_VISIBILITY,
        VisibilityRecord {
            target: entry.target,
            visible_ratio: entry.ratio,
        },
    );
}
