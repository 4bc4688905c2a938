//! Timestamp parsing and formatting utilities.
//!
//! Accepts the formats used for segmentation bounds on the command line:
//! `HH:MM:SS`, `HH:MM:SS.mmm`, `MM:SS` and `SS`.

use thiserror::Error;

/// Sentinel accepted in place of an end time meaning "until the end of the video".
pub const END_OF_VIDEO: &str = "END";

/// Parse a timestamp string to total seconds.
///
/// # Examples
/// ```
/// use sclip_models::timestamp::parse_timestamp;
/// assert_eq!(parse_timestamp("01:30:00").unwrap(), 5400.0);
/// assert_eq!(parse_timestamp("05:30").unwrap(), 330.0);
/// assert_eq!(parse_timestamp("90").unwrap(), 90.0);
/// ```
pub fn parse_timestamp(ts: &str) -> Result<f64, TimestampError> {
    let ts = ts.trim();
    if ts.is_empty() {
        return Err(TimestampError::Empty);
    }

    let parts: Vec<&str> = ts.split(':').collect();
    let components: &[&'static str] = match parts.len() {
        1 => &["seconds"],
        2 => &["minutes", "seconds"],
        3 => &["hours", "minutes", "seconds"],
        _ => return Err(TimestampError::InvalidFormat(ts.to_string())),
    };

    let mut total = 0.0;
    for (position, (part, component)) in parts.iter().zip(components).enumerate() {
        let part = part.trim();
        if part.starts_with('-') {
            return Err(TimestampError::Negative);
        }
        // Plain decimals only: `f64::from_str` would also take `nan`, `inf` and `1e3`
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit() || c == '.') {
            return Err(TimestampError::InvalidValue(component, part.to_string()));
        }
        let value: f64 = part
            .parse()
            .map_err(|_| TimestampError::InvalidValue(component, part.to_string()))?;
        if !value.is_finite() {
            return Err(TimestampError::InvalidValue(component, part.to_string()));
        }
        // Only the leading component may exceed its unit
        if position > 0 && value >= 60.0 {
            return Err(TimestampError::OutOfRange(component, part.to_string()));
        }
        total = total * 60.0 + value;
    }

    Ok(total)
}

/// Parse an optional end bound, where `END` (any case) or an empty string means open-ended.
pub fn parse_end_bound(ts: &str) -> Result<Option<f64>, TimestampError> {
    let ts = ts.trim();
    if ts.is_empty() || ts.eq_ignore_ascii_case(END_OF_VIDEO) {
        return Ok(None);
    }
    parse_timestamp(ts).map(Some)
}

/// Format seconds as `HH:MM:SS.mmm`.
pub fn format_seconds(total_secs: f64) -> String {
    let total_ms = (total_secs.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let mins = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{:02}:{:02}:{:02}.{:03}", hours, mins, secs, millis)
}

/// Format an elapsed duration in whole seconds as `HH:MM:SS`.
pub fn format_elapsed(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;
    format!("{:02}:{:02}:{:02}", hours, mins, secs)
}

/// Timestamp parsing error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimestampError {
    #[error("Timestamp cannot be empty")]
    Empty,

    #[error("Timestamp cannot be negative")]
    Negative,

    #[error("Invalid {0} value: {1}")]
    InvalidValue(&'static str, String),

    #[error("{0} must be below 60, got {1}")]
    OutOfRange(&'static str, String),

    #[error("Invalid timestamp format '{0}'. Use HH:MM:SS, HH:MM:SS.mmm, MM:SS, or SS")]
    InvalidFormat(String),
}
