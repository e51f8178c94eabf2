use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};

use super::metrics::{keys, Sample};

pub const DEFAULT_MAX_VITAL_SAMPLES: usize = 100;
pub const DEFAULT_MAX_RESOURCE_SAMPLES: usize = 50;

/// Bounded per-key time series of the most recent samples.
///
/// Series are created lazily on first write. Once a series reaches its
/// capacity the oldest sample is evicted (FIFO).
#[derive(Debug, Clone)]
pub struct MetricStore {
    vital_capacity: usize,
    resource_capacity: usize,
    series: HashMap<String, VecDeque<Sample>>,
}

impl MetricStore {
    pub fn new() -> Self {
        Self::with_capacities(DEFAULT_MAX_VITAL_SAMPLES, DEFAULT_MAX_RESOURCE_SAMPLES)
    }

    pub fn with_capacities(vital_capacity: usize, resource_capacity: usize) -> Self {
        Self {
            vital_capacity: vital_capacity.max(1),
            resource_capacity: resource_capacity.max(1),
            series: HashMap::new(),
        }
    }

    /// Capacity of the series stored under `key`
    pub fn capacity_for(&self, key: &str) -> usize {
        if key == keys::RESOURCE_LOAD {
            self.resource_capacity
        } else {
            self.vital_capacity
        }
    }

    /// Append a sample. Malformed samples are dropped and `false` is returned.
    pub fn record(&mut self, key: &str, sample: Sample) -> bool {
        if !sample.value().is_well_formed() {
            log::trace!("Dropping malformed sample for '{}'", key);
            return false;
        }

        let capacity = self.capacity_for(key);
        let queue = self
            .series
            .entry(key.to_string())
            .or_insert_with(|| VecDeque::with_capacity(capacity));
        Self::push_value(queue, sample, capacity);
        true
    }

    fn push_value<T>(queue: &mut VecDeque<T>, value: T, capacity: usize) {
        if queue.len() >= capacity {
            queue.pop_front();
        }
        queue.push_back(value);
    }

    /// Copy of every series for read-only consumers
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            series: self
                .series
                .iter()
                .map(|(key, queue)| (key.clone(), queue.iter().cloned().collect()))
                .collect(),
        }
    }

    pub fn clear(&mut self) {
        self.series.clear();
    }

    pub fn len(&self, key: &str) -> usize {
        self.series.get(key).map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl Default for MetricStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable read of the store at one instant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricsSnapshot {
    series: BTreeMap<String, Vec<Sample>>,
}

impl MetricsSnapshot {
    pub fn get(&self, key: &str) -> Option<&[Sample]> {
        self.series.get(key).map(Vec::as_slice)
    }

    pub fn latest(&self, key: &str) -> Option<&Sample> {
        self.series.get(key).and_then(|samples| samples.last())
    }

    pub fn latest_scalar(&self, key: &str) -> Option<f64> {
        self.latest(key).and_then(Sample::as_scalar)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Sample])> {
        self.series
            .iter()
            .map(|(key, samples)| (key.as_str(), samples.as_slice()))
    }

    /// Number of series
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
