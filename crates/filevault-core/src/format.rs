//! Human-readable byte sizes.

const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
const STEP: f64 = 1024.0;

/// Format a byte count with base-1024 units, trimming trailing zeros.
///
/// `format_bytes(1536, 2)` is `"1.5 KB"`, `format_bytes(0, 2)` is `"0 Bytes"`.
pub fn format_bytes(bytes: i64, decimals: usize) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let sign = if bytes < 0 { "-" } else { "" };
    let magnitude = bytes.unsigned_abs() as f64;

    let exponent = (magnitude.ln() / STEP.ln()).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let scaled = magnitude / STEP.powi(exponent as i32);

    format!("{}{} {}", sign, trim_decimal(&format!("{:.*}", decimals, scaled)), UNITS[exponent])
}

fn trim_decimal(formatted: &str) -> &str {
    if formatted.contains('.') {
        formatted.trim_end_matches('0').trim_end_matches('.')
    } else {
        formatted
    }
}

/// Format a percentage with two decimals, e.g. `"37.50%"`.
pub fn format_percentage(value: f64) -> String {
    format!("{:.2}%", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_bytes_zero_and_small() {
        assert_eq!(format_bytes(0, 2), "0 Bytes");
        assert_eq!(format_bytes(1, 2), "1 Bytes");
        assert_eq!(format_bytes(1023, 2), "1023 Bytes");
    }

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(1024, 2), "1 KB");
        assert_eq!(format_bytes(1536, 2), "1.5 KB");
        assert_eq!(format_bytes(10_485_760, 2), "10 MB");
        assert_eq!(format_bytes(1_234_567, 2), "1.18 MB");
        assert_eq!(format_bytes(1_073_741_824, 0), "1 GB");
    }

    #[test]
    fn format_bytes_caps_at_terabytes() {
        assert_eq!(format_bytes(1024_i64.pow(5), 2), "1024 TB");
    }

    #[test]
    fn format_bytes_negative() {
        assert_eq!(format_bytes(-2048, 2), "-2 KB");
    }

    #[test]
    fn format_percentage_two_decimals() {
        assert_eq!(format_percentage(37.5), "37.50%");
        assert_eq!(format_percentage(0.0), "0.00%");
    }
}
