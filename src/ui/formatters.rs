use colored::{ColoredString, Colorize};
use humansize::{format_size, BINARY};

use crate::core::perf_monitor::SampleValue;
use crate::platform::EffectiveConnectionType;

/// Format a byte count in human-readable binary units (KiB, MiB, GiB)
pub fn format_bytes(bytes: u64) -> String {
    format_size(bytes, BINARY)
}

/// Format a millisecond duration, switching to seconds above one second
pub fn format_millis(millis: f64) -> String {
    if millis < 1000.0 {
        format!("{:.0} ms", millis)
    } else {
        format!("{:.2} s", millis / 1000.0)
    }
}

pub fn format_ratio(ratio: f64) -> String {
    format!("{:.0}%", ratio * 100.0)
}

/// Color a 0-100 score by band
pub fn format_score(score: u8) -> ColoredString {
    let text = score.to_string();
    match score {
        90..=100 => text.green().bold(),
        60..=89 => text.yellow().bold(),
        _ => text.red().bold(),
    }
}

/// One-line rendering of a sample value for terminal output
pub fn format_value(value: &SampleValue) -> String {
    match value {
        SampleValue::Scalar(v) => format!("{:.3}", v)
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string(),
        SampleValue::Resource(entry) => format!(
            "{} in {} ({})",
            entry.name,
            format_millis(entry.duration),
            format_bytes(entry.transfer_size)
        ),
        SampleValue::Memory(reading) => {
            let line = format!(
                "{} of {} ({})",
                format_bytes(reading.used_bytes),
                format_bytes(reading.limit_bytes),
                format_ratio(reading.ratio)
            );
            if reading.critical {
                format!("{} critical", line)
            } else {
                line
            }
        }
        SampleValue::Connection(info) => {
            let kind = info
                .effective_type
                .map_or("unknown", EffectiveConnectionType::as_str);
            match info.rtt_ms {
                Some(rtt) => format!("{} (rtt {})", kind, format_millis(rtt)),
                None => kind.to_string(),
            }
        }
        SampleValue::Battery(status) => format!(
            "{}{}",
            format_ratio(status.level),
            if status.charging { ", charging" } else { "" }
        ),
        SampleValue::Visibility(record) => {
            format!("{} ({} visible)", record.target, format_ratio(record.visible_ratio))
        }
    }
}
