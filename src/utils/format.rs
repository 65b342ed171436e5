use chrono::{DateTime, Local};

const UNITS: &[&str] = &["B", "KB", "MB", "GB"];

/// Formats a byte count with 1024-based units and at most two decimals,
/// trailing zeros dropped: `0 B`, `512 B`, `1.5 KB`, `2 MB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}

/// Local timestamp in the detail view's `YYYY-MM-DD HH:MM:SS` layout.
pub fn format_modified(modified: Option<&DateTime<Local>>) -> String {
    modified
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}
