use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::core::perf_monitor::{DEFAULT_MAX_RESOURCE_SAMPLES, DEFAULT_MAX_VITAL_SAMPLES};
use crate::error::VitalsError;

/// Collector policy. Every field has a default so partial files load fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Analytics endpoint; reporting is disabled when unset
    pub endpoint: Option<String>,
    pub report_timeout_ms: u64,
    pub memory_poll_interval_ms: u64,
    /// Memory samples are only recorded above this used/limit ratio
    pub memory_record_ratio: f64,
    /// Samples above this ratio are flagged critical
    pub memory_critical_ratio: f64,
    /// Poll interval multiplier applied on low-end devices
    pub low_end_poll_multiplier: u32,
    pub max_vital_samples: usize,
    pub max_resource_samples: usize,
    /// Native host only
    pub battery_poll_interval_ms: u64,
    /// Prefix for reported metric names when several collectors share an endpoint
    pub namespace: Option<String>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            report_timeout_ms: 5_000,
            memory_poll_interval_ms: 30_000,
            memory_record_ratio: 0.7,
            memory_critical_ratio: 0.9,
            low_end_poll_multiplier: 2,
            max_vital_samples: DEFAULT_MAX_VITAL_SAMPLES,
            max_resource_samples: DEFAULT_MAX_RESOURCE_SAMPLES,
            battery_poll_interval_ms: 10_000,
            namespace: None,
        }
    }
}

impl CollectorConfig {
    /// Load from the default location, falling back to defaults.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if data.trim().is_empty() {
            return Ok(Self::default());
        }

        // A corrupted or outdated file must not keep the collector from starting
        Ok(serde_json::from_str(&data).unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable config {:?}: {}", path, e);
            Self::default()
        }))
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let data = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, data)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().with_context(|| "Could not determine config directory")?;

        Ok(config_dir.join("vitalwatch").join("config.json"))
    }

    /// Check the policy values are usable
    pub fn validate(&self) -> crate::error::Result<()> {
        if let Some(endpoint) = &self.endpoint {
            Self::parse_endpoint(endpoint)?;
        }

        for (name, ratio) in [
            ("memory_record_ratio", self.memory_record_ratio),
            ("memory_critical_ratio", self.memory_critical_ratio),
        ] {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return Err(VitalsError::config(format!(
                    "{} must be within (0, 1], got {}",
                    name, ratio
                )));
            }
        }

        if self.memory_record_ratio > self.memory_critical_ratio {
            return Err(VitalsError::config(
                "memory_record_ratio must not exceed memory_critical_ratio",
            ));
        }

        if self.max_vital_samples == 0 || self.max_resource_samples == 0 {
            return Err(VitalsError::config("sample capacities must be positive"));
        }

        if self.report_timeout_ms == 0
            || self.memory_poll_interval_ms == 0
            || self.battery_poll_interval_ms == 0
        {
            return Err(VitalsError::config("timeouts and intervals must be positive"));
        }

        if self.low_end_poll_multiplier == 0 {
            return Err(VitalsError::config("low_end_poll_multiplier must be positive"));
        }

        Ok(())
    }

    /// Parsed endpoint, if configured
    pub fn endpoint(&self) -> crate::error::Result<Option<Url>> {
        self.endpoint
            .as_deref()
            .map(Self::parse_endpoint)
            .transpose()
    }

    fn parse_endpoint(endpoint: &str) -> crate::error::Result<Url> {
        let url = Url::parse(endpoint)
            .map_err(|e| VitalsError::invalid_endpoint(format!("{}: {}", endpoint, e)))?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(VitalsError::invalid_endpoint(format!(
                "unsupported scheme '{}' in {}",
                other, endpoint
            ))),
        }
    }

    pub fn report_timeout(&self) -> Duration {
        Duration::from_millis(self.report_timeout_ms)
    }

    pub fn memory_poll_interval(&self) -> Duration {
        Duration::from_millis(self.memory_poll_interval_ms)
    }

    pub fn battery_poll_interval(&self) -> Duration {
        Duration::from_millis(self.battery_poll_interval_ms)
    }
}
