use anyhow::{Context, Result};
use colored::Colorize;

use crate::core::config::CollectorConfig;

pub fn execute(matches: &clap::ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("show", _)) => show(),
        Some(("path", _)) => path(),
        Some(("init", sub_matches)) => init(sub_matches.get_flag("force")),
        _ => {
            println!("Use 'vitalwatch config --help' for more information.");
            Ok(())
        }
    }
}

/// Print the effective configuration as JSON
fn show() -> Result<()> {
    let config = CollectorConfig::load()?;
    println!("{}", serde_json::to_string_pretty(&config)?);

    if let Err(e) = config.validate() {
        eprintln!("{}", format!("⚠️  {}", e).yellow());
    }

    Ok(())
}

fn path() -> Result<()> {
    let path = CollectorConfig::get_config_path()?;
    println!("{}", path.display().to_string().cyan().bold());
    Ok(())
}

/// Write a default configuration file
fn init(force: bool) -> Result<()> {
    let path = CollectorConfig::get_config_path()?;

    if path.exists() && !force {
        println!(
            "{}",
            format!("Config already exists at {}", path.display()).yellow()
        );
        println!("{}", "Use --force to overwrite it with defaults.".dimmed());
        return Ok(());
    }

    CollectorConfig::default()
        .save_to(&path)
        .context("Failed to write default config")?;

    println!(
        "{} {}",
        "✓ Default config written to:".green(),
        path.display()
    );

    Ok(())
}
