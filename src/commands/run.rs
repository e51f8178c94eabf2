//! `run` command: collect from the local process until stopped.

use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::core::config::CollectorConfig;
use crate::core::perf_monitor::{install_ctrlc_handler, PerformanceMonitor};
use crate::platform::SystemHost;
use crate::ui;

/// Execute the run command
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let mut config = CollectorConfig::load()?;
    if let Some(endpoint) = matches.get_one::<String>("endpoint") {
        config.endpoint = Some(endpoint.clone());
    }
    config.validate().context("Invalid collector configuration")?;

    let interval = matches.get_one::<u64>("interval").copied().unwrap_or(10).max(1);
    let interval = Duration::from_secs(interval);
    let duration = matches.get_one::<u64>("duration").copied().map(Duration::from_secs);
    let json_output = matches.get_flag("json");

    // Single event queue: every source and delivery shares one thread
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(collect(config, interval, duration, json_output))
}

async fn collect(
    config: CollectorConfig,
    interval: Duration,
    duration: Option<Duration>,
    json_output: bool,
) -> Result<()> {
    let host = Arc::new(SystemHost::new(config.battery_poll_interval()));
    let monitor = Arc::new(PerformanceMonitor::new(host, config));
    install_ctrlc_handler(&monitor)?;

    monitor.init();
    if !json_output {
        println!(
            "{}",
            format!(
                "Collecting every {}s{}. Press Ctrl+C to stop.",
                interval.as_secs(),
                if monitor.is_reporting() { ", reporting enabled" } else { "" }
            )
            .dimmed()
        );
    }

    let deadline = duration.map(|d| Instant::now() + d);
    report_until_stopped(&monitor, interval, deadline, |monitor| {
        print_report(monitor, json_output)
    })
    .await?;

    monitor.destroy();
    Ok(())
}

/// Print a report every `interval` until the monitor is torn down or the
/// deadline passes. A final report is printed at the deadline. Returns the
/// number of reports printed.
async fn report_until_stopped<F>(
    monitor: &PerformanceMonitor,
    interval: Duration,
    deadline: Option<Instant>,
    mut report: F,
) -> Result<usize>
where
    F: FnMut(&PerformanceMonitor) -> Result<()>,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;

    let stopped = monitor.destroyed();
    tokio::pin!(stopped);
    let time_up = async {
        match deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(time_up);

    let mut printed = 0;
    loop {
        tokio::select! {
            _ = &mut stopped => break,
            _ = &mut time_up => {
                report(monitor)?;
                printed += 1;
                break;
            }
            _ = ticker.tick() => {
                report(monitor)?;
                printed += 1;
            }
        }
    }

    Ok(printed)
}

fn print_report(monitor: &PerformanceMonitor, json_output: bool) -> Result<()> {
    let snapshot = monitor.get_metrics();
    let score = monitor.get_performance_score();

    if json_output {
        let line = serde_json::json!({
            "timestamp": chrono::Utc::now().timestamp_millis(),
            "metrics": snapshot,
            "score": score,
        });
        println!("{}", serde_json::to_string(&line)?);
    } else {
        ui::print_metrics(&snapshot);
        ui::print_score(&score);
    }

    Ok(())
}
