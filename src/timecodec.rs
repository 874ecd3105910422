//! Gateway timestamp codec
//!
//! The PVS reports times as `YYYY,MM,DD,HH,MM,SS` in UTC with whole-second
//! resolution.

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

const NANOS_PER_SEC: i64 = 1_000_000_000;

fn format_error(input: &str, reason: impl Into<String>) -> Error {
    Error::Format {
        input: input.to_string(),
        reason: reason.into(),
    }
}

/// Parse a comma-separated gateway time into a UTC date-time
pub fn to_datetime(input: &str) -> Result<DateTime<Utc>> {
    let parts = input
        .split(',')
        .map(|p| p.trim().parse::<i64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| format_error(input, format!("non-integer component ({})", e)))?;

    let [year, month, day, hour, minute, second] = parts[..] else {
        return Err(format_error(
            input,
            format!("expected 6 components, found {}", parts.len()),
        ));
    };

    let small = |v: i64| u32::try_from(v).ok();

    let date = match (i32::try_from(year).ok(), small(month), small(day)) {
        (Some(y), Some(m), Some(d)) => NaiveDate::from_ymd_opt(y, m, d),
        _ => None,
    }
    .ok_or_else(|| format_error(input, "date out of range"))?;

    let naive = match (small(hour), small(minute), small(second)) {
        (Some(h), Some(m), Some(s)) => date.and_hms_opt(h, m, s),
        _ => None,
    }
    .ok_or_else(|| format_error(input, "time out of range"))?;

    Ok(Utc.from_utc_datetime(&naive))
}

/// Parse a gateway time into nanoseconds since the Unix epoch
pub fn to_epoch_ns(input: &str) -> Result<i64> {
    parse(input).map(|(_, ns)| ns)
}

/// Parse a gateway time into both its date-time and nanosecond epoch forms
pub fn parse(input: &str) -> Result<(DateTime<Utc>, i64)> {
    let datetime = to_datetime(input)?;
    let ns = datetime
        .timestamp()
        .checked_mul(NANOS_PER_SEC)
        .ok_or_else(|| format_error(input, "outside the nanosecond timestamp range"))?;
    Ok((datetime, ns))
}
