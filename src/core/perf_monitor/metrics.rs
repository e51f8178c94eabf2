use serde::{Deserialize, Serialize};

use crate::platform::{BatteryStatus, ConnectionInfo, ResourceTiming};

/// Metric keys written by the built-in sources
pub mod keys {
    pub const FIRST_PAINT: &str = "fp";
    pub const FIRST_CONTENTFUL_PAINT: &str = "fcp";
    pub const LARGEST_CONTENTFUL_PAINT: &str = "lcp";
    pub const FIRST_INPUT_DELAY: &str = "fid";
    pub const CUMULATIVE_LAYOUT_SHIFT: &str = "cls";
    pub const RESOURCE_LOAD: &str = "resource-load";
    pub const MEMORY_PRESSURE: &str = "memory-pressure";
    pub const CONNECTION: &str = "connection";
    pub const BATTERY: &str = "battery";
    pub const ELEMENT_VISIBILITY: &str = "element-visibility";

    /// Keys forwarded to the remote endpoint as they are recorded.
    pub const REPORTED_VITALS: [&str; 4] = [
        FIRST_CONTENTFUL_PAINT,
        LARGEST_CONTENTFUL_PAINT,
        FIRST_INPUT_DELAY,
        CUMULATIVE_LAYOUT_SHIFT,
    ];
}

/// One observation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    value: SampleValue,
    timestamp: i64, // Unix epoch, milliseconds
}

impl Sample {
    /// Create a sample stamped with the current wall clock time
    pub fn now(value: impl Into<SampleValue>) -> Self {
        Self::at(value, chrono::Utc::now().timestamp_millis())
    }

    pub fn at(value: impl Into<SampleValue>, timestamp: i64) -> Self {
        Self {
            value: value.into(),
            timestamp,
        }
    }

    pub fn value(&self) -> &SampleValue {
        &self.value
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn as_scalar(&self) -> Option<f64> {
        self.value.as_scalar()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleValue {
    Scalar(f64),
    Resource(ResourceTiming),
    Memory(MemoryReading),
    Connection(ConnectionInfo),
    Battery(BatteryStatus),
    Visibility(VisibilityRecord),
}

impl SampleValue {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            SampleValue::Scalar(value) => Some(*value),
            _ => None,
        }
    }

    /// True when every numeric field is finite.
    pub fn is_well_formed(&self) -> bool {
        match self {
            SampleValue::Scalar(value) => value.is_finite(),
            SampleValue::Resource(entry) => entry.duration.is_finite(),
            SampleValue::Memory(reading) => reading.ratio.is_finite(),
            SampleValue::Connection(info) => {
                info.downlink_mbps.map_or(true, f64::is_finite)
                    && info.rtt_ms.map_or(true, f64::is_finite)
            }
            SampleValue::Battery(status) => status.level.is_finite(),
            SampleValue::Visibility(record) => record.visible_ratio.is_finite(),
        }
    }
}

impl From<f64> for SampleValue {
    fn from(value: f64) -> Self {
        SampleValue::Scalar(value)
    }
}

impl From<ResourceTiming> for SampleValue {
    fn from(entry: ResourceTiming) -> Self {
        SampleValue::Resource(entry)
    }
}

impl From<MemoryReading> for SampleValue {
    fn from(reading: MemoryReading) -> Self {
        SampleValue::Memory(reading)
    }
}

impl From<ConnectionInfo> for SampleValue {
    fn from(info: ConnectionInfo) -> Self {
        SampleValue::Connection(info)
    }
}

impl From<BatteryStatus> for SampleValue {
    fn from(status: BatteryStatus) -> Self {
        SampleValue::Battery(status)
    }
}

impl From<VisibilityRecord> for SampleValue {
    fn from(record: VisibilityRecord) -> Self {
        SampleValue::Visibility(record)
    }
}

/// Heap pressure reading recorded by the memory source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryReading {
    pub used_bytes: u64,
    pub limit_bytes: u64,
    pub ratio: f64,
    /// Above the critical ratio; surfaces as a recommendation
    pub critical: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityRecord {
    pub target: String,
    pub visible_ratio: f64,
}
