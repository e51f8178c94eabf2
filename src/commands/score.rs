//! `score` command: score a saved metrics snapshot offline.

use anyhow::{Context, Result};
use clap::ArgMatches;
use std::fs;
use std::path::Path;

use crate::core::perf_monitor::{score, DeviceProfile, MetricsSnapshot};
use crate::ui;

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let path = matches
        .get_one::<String>("snapshot")
        .context("Snapshot path is required")?;

    let snapshot = load_snapshot(Path::new(path))?;
    let profile = DeviceProfile {
        is_low_end_device: matches.get_flag("low-end"),
        prefers_reduced_motion: false,
    };
    let result = score(&snapshot, &profile);

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        ui::print_metrics(&snapshot);
        ui::print_score(&result);
    }

    Ok(())
}

/// Read a snapshot as written by `run --json` or `get_metrics()`.
pub fn load_snapshot(path: &Path) -> Result<MetricsSnapshot> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot: {:?}", path))?;

    // Accept both a bare snapshot and a `run --json` line
    let value: serde_json::Value =
        serde_json::from_str(&data).with_context(|| format!("Invalid JSON in {:?}", path))?;
    let metrics = match value.get("metrics") {
        Some(metrics) if value.get("score").is_some() => metrics.clone(),
        _ => value,
    };

    serde_json::from_value(metrics).with_context(|| format!("Not a metrics snapshot: {:?}", path))
}
