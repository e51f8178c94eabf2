//! Health scoring for recorded vitals.
//!
//! Maps the latest sample of each vital onto a fixed breakpoint scale and
//! derives recommendations. Pure: no I/O, deterministic for a snapshot.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::metrics::{keys, SampleValue};
use super::profile::DeviceProfile;
use super::store::MetricsSnapshot;

/// Scores below this produce a recommendation
const RECOMMENDATION_THRESHOLD: u8 = 75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vital {
    Lcp,
    Fid,
    Cls,
}

impl Vital {
    pub const ALL: [Vital; 3] = [Vital::Lcp, Vital::Fid, Vital::Cls];

    pub fn key(self) -> &'static str {
        match self {
            Vital::Lcp => keys::LARGEST_CONTENTFUL_PAINT,
            Vital::Fid => keys::FIRST_INPUT_DELAY,
            Vital::Cls => keys::CUMULATIVE_LAYOUT_SHIFT,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Vital::Lcp => "Largest Contentful Paint",
            Vital::Fid => "First Input Delay",
            Vital::Cls => "Cumulative Layout Shift",
        }
    }

    /// Upper bounds for the 100 / 75 / 50 bands; anything above scores 25.
    pub fn breakpoints(self) -> [f64; 3] {
        match self {
            Vital::Lcp => [2500.0, 4000.0, 6000.0], // ms
            Vital::Fid => [100.0, 300.0, 500.0],    // ms
            Vital::Cls => [0.1, 0.25, 0.5],         // unitless
        }
    }

    pub fn rate(self, value: f64) -> u8 {
        let [good, fair, poor] = self.breakpoints();
        if value <= good {
            100
        } else if value <= fair {
            75
        } else if value <= poor {
            50
        } else {
            25
        }
    }

    fn recommendation(self) -> &'static str {
        match self {
            Vital::Lcp => {
                "Improve Largest Contentful Paint: compress and preload the hero image, and cut server response time"
            }
            Vital::Fid => {
                "Reduce First Input Delay: split long tasks and defer non-critical scripts"
            }
            Vital::Cls => {
                "Reduce layout shift: reserve space for images, embeds and late-loading content"
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceScore {
    pub vitals: BTreeMap<Vital, u8>,
    /// Mean of the present vital scores, `None` when nothing was recorded
    pub overall: Option<u8>,
    pub recommendations: Vec<String>,
}

impl PerformanceScore {
    pub fn vital(&self, vital: Vital) -> Option<u8> {
        self.vitals.get(&vital).copied()
    }
}

/// Score a snapshot of the metric store
pub fn score(snapshot: &MetricsSnapshot, profile: &DeviceProfile) -> PerformanceScore {
    let mut result = PerformanceScore::default();

    for vital in Vital::ALL {
        if let Some(value) = snapshot.latest_scalar(vital.key()) {
            let vital_score = vital.rate(value);
            result.vitals.insert(vital, vital_score);

            if vital_score < RECOMMENDATION_THRESHOLD {
                result.recommendations.push(vital.recommendation().to_string());
            }
        }
    }

    if !result.vitals.is_empty() {
        let total: u32 = result.vitals.values().map(|&s| u32::from(s)).sum();
        let mean = f64::from(total) / result.vitals.len() as f64;
        result.overall = Some(mean.round() as u8);
    }

    if memory_is_critical(snapshot) {
        result.recommendations.push(
            "Memory usage is close to the available limit: release caches and detached resources"
                .to_string(),
        );
    }

    if profile.is_low_end_device {
        result.recommendations.push(
            "Low-end device detected: reduce animations and defer non-essential work".to_string(),
        );
    }

    result
}

fn memory_is_critical(snapshot: &MetricsSnapshot) -> bool {
    matches!(
        snapshot.latest(keys::MEMORY_PRESSURE).map(|sample| sample.value()),
        Some(SampleValue::Memory(reading)) if reading.critical
    )
}
