//! Host platform seam.
//!
//! The collector never talks to a concrete platform directly. Everything it
//! observes comes through the [`Host`] trait, and every notification hook is
//! capability-gated: `None` means the host does not offer that signal and the
//! matching source degrades to a no-op.

mod manual;
mod system;

pub use manual::{HostCapabilities, ManualHost, ManualIntersectionObserver};
pub use system::SystemHost;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::error::Result;

/// Signals a host platform may expose to the collector.
pub trait Host: Send + Sync {
    /// Static capability hints, read once when the device profile is built.
    fn device_hints(&self) -> DeviceHints;

    /// Page-level context attached to every reported sample.
    fn page_context(&self) -> PageContext;

    /// Paint timing, first-input and layout-shift notifications.
    fn paint_events(&self) -> Option<broadcast::Receiver<PaintEvent>> {
        None
    }

    /// Resource-load notifications.
    fn resource_events(&self) -> Option<broadcast::Receiver<ResourceTiming>> {
        None
    }

    /// On-demand heap usage snapshots.
    fn memory_probe(&self) -> Option<Box<dyn MemoryProbe>> {
        None
    }

    fn connection_events(&self) -> Option<broadcast::Receiver<ConnectionInfo>> {
        None
    }

    fn battery_events(&self) -> Option<broadcast::Receiver<BatteryStatus>> {
        None
    }

    /// Viewport-intersection observer. Nothing is observed until a target is attached.
    fn intersection(&self) -> Option<Arc<dyn IntersectionObserver>> {
        None
    }

    /// Page lifecycle transitions (hide, unload).
    fn lifecycle_events(&self) -> Option<broadcast::Receiver<PageLifecycle>> {
        None
    }
}

/// Trait for heap usage providers
pub trait MemoryProbe: Send {
    /// Take a fresh heap usage reading
    fn read(&mut self) -> Result<HeapUsage>;
}

/// Viewport-intersection observer exposed by a host.
pub trait IntersectionObserver: Send + Sync {
    fn observe(&self, target: &str);
    fn unobserve(&self, target: &str);
    /// Drop every observed target.
    fn disconnect(&self);
    fn entries(&self) -> broadcast::Receiver<IntersectionEntry>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceHints {
    pub logical_cpus: Option<usize>,
    pub device_memory_gb: Option<f64>,
    pub effective_connection: Option<EffectiveConnectionType>,
    pub viewport_width: Option<u32>,
    pub prefers_reduced_motion: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContext {
    pub url: String,
    pub user_agent: String,
    pub viewport: Option<Viewport>,
    pub connection: Option<EffectiveConnectionType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectiveConnectionType {
    #[serde(rename = "slow-2g")]
    Slow2g,
    #[serde(rename = "2g")]
    TwoG,
    #[serde(rename = "3g")]
    ThreeG,
    #[serde(rename = "4g")]
    FourG,
}

impl EffectiveConnectionType {
    pub fn as_str(self) -> &'static str {
        match self {
            EffectiveConnectionType::Slow2g => "slow-2g",
            EffectiveConnectionType::TwoG => "2g",
            EffectiveConnectionType::ThreeG => "3g",
            EffectiveConnectionType::FourG => "4g",
        }
    }

    /// Anything below 4g counts as a slow link.
    pub fn is_slow(self) -> bool {
        !matches!(self, EffectiveConnectionType::FourG)
    }
}

impl fmt::Display for EffectiveConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaintKind {
    FirstPaint,
    FirstContentfulPaint,
}

/// Paint / stability / input-delay notification. Times are milliseconds
/// relative to navigation start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PaintEvent {
    Paint { kind: PaintKind, start_time: f64 },
    LargestContentfulPaint { start_time: f64 },
    FirstInput { start_time: f64, processing_start: f64 },
    LayoutShift { value: f64, had_recent_input: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Img,
    Video,
    Script,
    Link,
    Css,
    Fetch,
    Xmlhttprequest,
    Other,
}

impl ResourceKind {
    pub fn is_media(self) -> bool {
        matches!(self, ResourceKind::Img | ResourceKind::Video)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTiming {
    pub name: String,
    pub kind: ResourceKind,
    pub duration: f64,
    pub transfer_size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeapUsage {
    pub used_bytes: u64,
    pub limit_bytes: u64,
}

impl HeapUsage {
    /// Used/limit ratio, `None` when the host reports a zero limit.
    pub fn ratio(&self) -> Option<f64> {
        if self.limit_bytes == 0 {
            return None;
        }
        Some(self.used_bytes as f64 / self.limit_bytes as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    pub effective_type: Option<EffectiveConnectionType>,
    pub downlink_mbps: Option<f64>,
    pub rtt_ms: Option<f64>,
    pub save_data: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryStatus {
    /// Charge level in 0.0..=1.0
    pub level: f64,
    pub charging: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntersectionEntry {
    pub target: String,
    pub is_intersecting: bool,
    pub ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageLifecycle {
    Hidden,
    Visible,
    PageHide,
    Unload,
}

impl PageLifecycle {
    /// Transitions after which the page may never run again.
    pub fn is_exit(self) -> bool {
        matches!(self, PageLifecycle::PageHide | PageLifecycle::Unload)
    }
}
