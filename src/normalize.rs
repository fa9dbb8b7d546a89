//! Field normalization for destination records.
//!
//! WordPress timestamps arrive in a handful of layouts depending on site
//! configuration and plugins; the destination schema wants one fixed format
//! and caps the content attribute at 50 000 characters. Both conversions live
//! here, plus a small helper for keeping response bodies readable in logs.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::debug;

use crate::error::{Error, Result};

/// Hard length limit of the destination `content` attribute, in characters.
const MAX_CONTENT_CHARS: usize = 50_000;

/// Marker appended when content is cut.
const ELLIPSIS: &str = "...";

/// Cut point leaving room for the ellipsis marker.
const CONTENT_CUTOFF: usize = MAX_CONTENT_CHARS - 3;

/// Offset-less layouts tried after the RFC parsers.
const DATETIME_LAYOUTS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Reformat a loosely formatted timestamp as `YYYY/MM/DD,HH:MM:SS`.
///
/// Accepts RFC 3339 / ISO-8601 (with or without fractional seconds and
/// offsets), RFC 2822, space-separated datetimes, and bare dates. The clock
/// value is kept exactly as written: inputs carrying an offset are read as
/// wall-clock time, never converted.
///
/// # Errors
///
/// [`Error::MalformedDate`] when no parser accepts the input.
pub fn format_date(input: &str) -> Result<String> {
    let parsed =
        parse_datetime(input.trim()).ok_or_else(|| Error::MalformedDate(input.to_string()))?;
    Ok(parsed.format("%Y/%m/%d,%H:%M:%S").to_string())
}

fn parse_datetime(input: &str) -> Option<NaiveDateTime> {
    // naive_local() reads the wall-clock component of offset-carrying inputs.
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(input) {
        return Some(dt.naive_local());
    }
    for layout in DATETIME_LAYOUTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, layout) {
            return Some(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::MIN));
    }
    debug!(input, "No datetime layout matched");
    None
}

/// Cap content at the destination attribute limit.
///
/// Content longer than 49 997 characters is cut there and `...` appended,
/// producing exactly 50 000 characters; shorter content passes through
/// unchanged. Counted in Unicode scalar values, matching how the destination
/// measures the attribute, so the cut always lands on a char boundary.
pub fn truncate_content(text: &str) -> String {
    match text.char_indices().nth(CONTENT_CUTOFF) {
        Some((cut, _)) => format!("{}{}", &text[..cut], ELLIPSIS),
        None => text.to_string(),
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (backing off to the nearest
/// char boundary) with a byte-count indicator appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}
