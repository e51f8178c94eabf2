use colored::Colorize;

use super::formatters::{format_score, format_value};
use crate::core::perf_monitor::{MetricsSnapshot, PerformanceScore, Vital};

fn print_section_header(title: &str) {
    println!("\n{}", title.bold().green());
    println!("{}", "-".repeat(title.len()));
}

pub fn print_score(score: &PerformanceScore) {
    println!("\n{}", "PERFORMANCE SCORE".bold().bright_cyan());
    println!("{}", "=".repeat(60));

    match score.overall {
        Some(overall) => println!("  Overall: {}", format_score(overall)),
        None => println!("  Overall: {}", "no vitals recorded yet".dimmed()),
    }

    for vital in Vital::ALL {
        match score.vital(vital) {
            Some(value) => println!("  {:<26} {}", vital.label(), format_score(value)),
            None => println!("  {:<26} {}", vital.label(), "-".dimmed()),
        }
    }

    if !score.recommendations.is_empty() {
        print_section_header("Recommendations");
        for recommendation in &score.recommendations {
            println!("  • {}", recommendation);
        }
    }

    println!();
}

/// Latest sample per metric key
pub fn print_metrics(snapshot: &MetricsSnapshot) {
    print_section_header("Metrics");

    if snapshot.is_empty() {
        println!("  {}", "nothing recorded".dimmed());
        return;
    }

    for (key, samples) in snapshot.iter() {
        if let Some(latest) = samples.last() {
            println!(
                "  {:<20} {} {}",
                key.cyan(),
                format_value(latest.value()),
                format!("({} samples)", samples.len()).dimmed()
            );
        }
    }
}
