//! Numeric parsing and formatting helpers shared by readers and summaries.

/// Formats a floating-point number as a string without trailing zeros.
///
/// # Examples
///
/// ```
/// use survey_model::format_numeric;
///
/// assert_eq!(format_numeric(998.0), "998");
/// assert_eq!(format_numeric(22.5), "22.5");
/// assert_eq!(format_numeric(0.0), "0");
/// ```
pub fn format_numeric(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    let s = format!("{v}");
    if !s.contains('.') {
        return s;
    }
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    trimmed.to_string()
}

/// Parses a string as `f64`, returning `None` for invalid, empty or non-finite input.
pub fn parse_f64(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a string as `i64`, returning `None` for invalid or empty strings.
pub fn parse_i64(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
    digits.parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_numeric() {
        assert_eq!(format_numeric(1.0), "1");
        assert_eq!(format_numeric(1.5), "1.5");
        assert_eq!(format_numeric(1.50), "1.5");
        assert_eq!(format_numeric(0.0), "0");
        assert_eq!(format_numeric(-0.0), "0");
        assert_eq!(format_numeric(1000.0), "1000");
    }

    #[test]
    fn test_parse_f64() {
        assert_eq!(parse_f64(""), None);
        assert_eq!(parse_f64("  "), None);
        assert_eq!(parse_f64("  70.5 "), Some(70.5));
        assert_eq!(parse_f64("NaN"), None);
        assert_eq!(parse_f64("inf"), None);
        assert_eq!(parse_f64("abc"), None);
    }

    #[test]
    fn test_parse_i64() {
        assert_eq!(parse_i64("42"), Some(42));
        assert_eq!(parse_i64(" +7 "), Some(7));
        assert_eq!(parse_i64("-3"), Some(-3));
        assert_eq!(parse_i64("4.5"), None);
        assert_eq!(parse_i64(""), None);
    }
}
