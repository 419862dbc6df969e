//! Size, time, and truncation formatters for CLI output.

use chrono::{DateTime, Local, Utc};

/// Human readable byte count: "512 B", "1.5 KB", "2.25 MB".
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    #[allow(clippy::cast_precision_loss)]
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let text = format!("{value:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{text} {}", UNITS[unit])
}

/// Milliseconds as "850 ms", "4.2 s" or "2m 05s".
pub fn format_duration_ms(ms: u64) -> String {
    match ms {
        0..=999 => format!("{ms} ms"),
        1_000..=59_999 => format!("{:.1} s", ms as f64 / 1000.0),
        _ => format!("{}m {:02}s", ms / 60_000, (ms % 60_000) / 1000),
    }
}

/// Local wall-clock rendering of a timestamp.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Format an optional timestamp or "-".
pub fn format_timestamp_opt(dt: Option<&DateTime<Utc>>) -> String {
    dt.map_or_else(|| "-".to_string(), format_timestamp)
}

/// Truncate a string with unicode ellipsis, on a char boundary.
pub fn truncate_ellipsis(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}\u{2026}")
    }
}

/// Format a count with label: "1 file", "3 files".
pub fn count_label(n: usize, singular: &str, plural: &str) -> String {
    if n == 1 {
        format!("{n} {singular}")
    } else {
        format!("{n} {plural}")
    }
}

/// `-` for empty values in tables.
pub fn or_dash(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(10 * 1024 * 1024), "10 MB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration_ms(850), "850 ms");
        assert_eq!(format_duration_ms(4_200), "4.2 s");
        assert_eq!(format_duration_ms(125_000), "2m 05s");
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate_ellipsis("facture-été.xml", 8), "facture\u{2026}");
        assert_eq!(truncate_ellipsis("a.xml", 8), "a.xml");
    }
}
