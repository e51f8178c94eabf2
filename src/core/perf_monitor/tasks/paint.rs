//! Paint, input-delay and layout-stability source.

use tokio::sync::broadcast::{self, error::RecvError};

use super::{spawn_source, MetricSink, Source, SourceKind, StopHandle};
use crate::core::perf_monitor::metrics::keys;
use crate::platform::{PaintEvent, PaintKind};

pub struct PaintSource {
    events: Option<broadcast::Receiver<PaintEvent>>,
}

impl PaintSource {
    pub fn new(events: Option<broadcast::Receiver<PaintEvent>>) -> Self {
        Self { events }
    }
}

impl Source for PaintSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Paint
    }

    fn start(self: Box<Self>, sink: MetricSink) -> StopHandle {
        match self.events {
            Some(events) => spawn_source(SourceKind::Paint, |shutdown| {
                paint_task(events, sink, shutdown)
            }),
            None => StopHandle::noop(SourceKind::Paint.name()),
        }
    }
}

/// Running layout-shift total for one page session.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct LayoutShiftTotal {
    total: f64,
}

impl LayoutShiftTotal {
    /// Add one shift. Returns the new total, or `None` when the shift
    /// does not count (user-initiated or malformed).
    pub fn add(&mut self, value: f64, had_recent_input: bool) -> Option<f64> {
        if had_recent_input || !value.is_finite() || value < 0.0 {
            return None;
        }
        self.total += value;
        Some(self.total)
    }

    pub fn total(&self) -> f64 {
        self.total
    }
}

async fn paint_task(
    mut events: broadcast::Receiver<PaintEvent>,
    sink: MetricSink,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut layout_shift = LayoutShiftTotal::default();

    loop {
        tokio::select! {
            received = events.recv() => match received {
                Ok(event) => handle_paint_event(event, &mut layout_shift, &sink),
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("Paint source fell behind, {} notifications skipped", skipped);
                }
                Err(RecvError::Closed) => break,
            },
            _ = shutdown.recv() => break,
        }
    }
}

fn handle_paint_event(event: PaintEvent, layout_shift: &mut LayoutShiftTotal, sink: &MetricSink) {
    match event {
        PaintEvent::Paint { kind, start_time } => {
            let key = match kind {
                PaintKind::FirstPaint => keys::FIRST_PAINT,
                PaintKind::FirstContentfulPaint => keys::FIRST_CONTENTFUL_PAINT,
            };
            sink.record(key, start_time);
        }
        PaintEvent::LargestContentfulPaint { start_time } => {
            sink.record(keys::LARGEST_CONTENTFUL_PAINT, start_time);
        }
        PaintEvent::FirstInput {
            start_time,
            processing_start,
        } => {
            let delay = processing_start - start_time;
            if delay >= 0.0 {
                sink.record(keys::FIRST_INPUT_DELAY, delay);
            } else {
                log::debug!("Dropping first-input entry with negative delay {}", delay);
            }
        }
        PaintEvent::LayoutShift {
            value,
            had_recent_input,
        } => {
            if let Some(total) = layout_shift.add(value, had_recent_input) {
                sink.record(keys::CUMULATIVE_LAYOUT_SHIFT, total);
            }
        }
    }
}
