//! Human-readable formatting for byte sizes and durations.

/// Format a byte count with a binary-scaled suffix, two decimal places.
pub fn format_byte_size(bytes: u64) -> String {
    const SUFFIXES: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

    let mut size = bytes as f64;
    let mut suffix = 0;
    while size >= 1024.0 && suffix < SUFFIXES.len() - 1 {
        size /= 1024.0;
        suffix += 1;
    }

    format!("{:.2} {}", size, SUFFIXES[suffix])
}

/// Format a duration in whole seconds as `1h 2m 3s`, omitting leading
/// zero components.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{hours}h "));
    }
    if hours > 0 || minutes > 0 {
        out.push_str(&format!("{minutes}m "));
    }
    out.push_str(&format!("{secs}s"));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_size_suffix_scaling() {
        assert_eq!(format_byte_size(0), "0.00 B");
        assert_eq!(format_byte_size(512), "512.00 B");
        assert_eq!(format_byte_size(2048), "2.00 KB");
        assert_eq!(format_byte_size(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(format_byte_size(3 * 1024 * 1024 * 1024), "3.00 GB");
    }

    #[test]
    fn duration_components() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(59), "59s");
        assert_eq!(format_duration(60), "1m 0s");
        assert_eq!(format_duration(3600), "1h 0m 0s");
        assert_eq!(format_duration(3723), "1h 2m 3s");
    }

    #[test]
    fn duration_skips_minutes_only_when_no_hours() {
        assert_eq!(format_duration(61), "1m 1s");
        assert_eq!(format_duration(7200 + 5), "2h 0m 5s");
    }
}
