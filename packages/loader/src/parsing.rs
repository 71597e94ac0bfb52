//! Lenient field parsing for raw CSV cells.
//!
//! Every function returns `None` instead of failing: a malformed cell is
//! treated as missing data.

use chrono::{Datelike as _, NaiveDate, NaiveDateTime};

/// Trims a cell, mapping empty strings to `None`.
#[must_use]
pub fn non_empty(raw: Option<String>) -> Option<String> {
    let raw = raw?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == raw.len() {
        Some(raw)
    } else {
        Some(trimmed.to_string())
    }
}

/// Parses a float cell. NaN and unparsable values are `None`.
#[must_use]
pub fn parse_float(raw: Option<&str>) -> Option<f64> {
    raw?.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Parses an integral calendar field. Accepts `"2023"` and `"2023.0"`,
/// rejects fractional or non-numeric values.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn parse_integral(raw: Option<&str>) -> Option<i64> {
    let raw = raw?.trim();
    if let Ok(value) = raw.parse::<i64>() {
        return Some(value);
    }
    let value = raw.parse::<f64>().ok()?;
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        Some(value as i64)
    } else {
        None
    }
}

/// Parses a collection date in one of the formats seen in SISAGUA exports.
#[must_use]
pub fn parse_collection_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    for format in ["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y %H:%M"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(datetime.date());
        }
    }
    None
}

/// Derives `(year, month)` from a collection date string.
#[must_use]
pub fn calendar_from_date(raw: Option<&str>) -> Option<(i32, u32)> {
    let date = parse_collection_date(raw?)?;
    Some((date.year(), date.month()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_cells_are_missing() {
        assert_eq!(non_empty(Some("   ".to_string())), None);
        assert_eq!(non_empty(None), None);
        assert_eq!(
            non_empty(Some(" BARRA ".to_string())),
            Some("BARRA".to_string())
        );
    }

    #[test]
    fn parses_floats_without_decimal_comma() {
        assert_eq!(parse_float(Some("-12.97")), Some(-12.97));
        assert_eq!(parse_float(Some("NaN")), None);
        assert_eq!(parse_float(Some("1,5")), None);
        assert_eq!(parse_float(None), None);
    }

    #[test]
    fn parses_integral_calendar_fields() {
        assert_eq!(parse_integral(Some("2023")), Some(2023));
        assert_eq!(parse_integral(Some("2023.0")), Some(2023));
        assert_eq!(parse_integral(Some(" 7 ")), Some(7));
        assert_eq!(parse_integral(Some("7.5")), None);
        assert_eq!(parse_integral(Some("dois mil")), None);
    }

    #[test]
    fn parses_supported_date_formats() {
        assert_eq!(calendar_from_date(Some("2023-04-18")), Some((2023, 4)));
        assert_eq!(calendar_from_date(Some("18/04/2023")), Some((2023, 4)));
        assert_eq!(
            calendar_from_date(Some("2023-04-18 09:30:00")),
            Some((2023, 4))
        );
        assert_eq!(calendar_from_date(Some("abril de 2023")), None);
    }
}
