use serde::{Deserialize, Serialize};

use crate::platform::DeviceHints;

const LOW_END_MAX_CPUS: usize = 4;
const LOW_END_MAX_MEMORY_GB: f64 = 4.0;
const NARROW_VIEWPORT_PX: u32 = 480;

/// Device capability descriptor, computed once at start
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceProfile {
    pub is_low_end_device: bool,
    pub prefers_reduced_motion: bool,
}

impl DeviceProfile {
    /// Derive the profile from static capability hints.
    ///
    /// A device is low-end when any hint says so: few logical CPUs, little
    /// memory, a slow effective connection, or a phone-sized viewport.
    /// Missing hints never mark a device as low-end.
    pub fn detect(hints: &DeviceHints) -> Self {
        let few_cpus = hints
            .logical_cpus
            .is_some_and(|cpus| cpus <= LOW_END_MAX_CPUS);
        let little_memory = hints
            .device_memory_gb
            .is_some_and(|gb| gb <= LOW_END_MAX_MEMORY_GB);
        let slow_network = hints
            .effective_connection
            .is_some_and(|connection| connection.is_slow());
        let narrow_viewport = hints
            .viewport_width
            .is_some_and(|width| width < NARROW_VIEWPORT_PX);

        Self {
            is_low_end_device: few_cpus || little_memory || slow_network || narrow_viewport,
            prefers_reduced_motion: hints.prefers_reduced_motion,
        }
    }
}
