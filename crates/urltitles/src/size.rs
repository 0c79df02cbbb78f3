//! Human-friendly byte counts

const UNITS: [&str; 4] = ["bytes", "KB", "MB", "GB"];

/// Format a byte count as e.g. `200.0KB` or `1.3MB`
///
/// Returns an empty string when the size is unknown.
pub fn format_size(bytes: Option<u64>) -> String {
    let Some(bytes) = bytes else {
        return String::new();
    };

    let mut num = bytes as f64;
    for unit in UNITS {
        if num < 1024.0 {
            return format!("{:3.1}{}", num, unit);
        }
        num /= 1024.0;
    }
    format!("{:3.1}TB", num)
}
