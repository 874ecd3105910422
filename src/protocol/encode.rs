//! Line-protocol encoder
//!
//! Renders a [`Point`] as a single line:
//! `measurement[,tag=value...] field=value[,field=value...] timestamp\n`

use super::point::{FieldValue, Point};

/// Format a float in scientific notation with a signed two-digit exponent,
/// e.g. `3.1163e+00`. The mantissa is the shortest representation that
/// round-trips.
pub fn format_float(value: f64) -> String {
    let raw = format!("{:e}", value);
    match raw.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exp.unsigned_abs())
        }
        None => raw,
    }
}

/// Format a field value for the wire
pub fn format_value(value: &FieldValue) -> String {
    match value {
        FieldValue::String(s) => format!("\"{}\"", s.replace('"', "\\\"")),
        FieldValue::Boolean(b) => (if *b { "true" } else { "false" }).to_string(),
        FieldValue::Integer(i) => match i64::try_from(*i) {
            Ok(i) => format!("{}i", i),
            // Beyond the signed 64-bit integer grammar
            Err(_) => format_float(*i as f64),
        },
        FieldValue::Float(f) => format_float(*f),
    }
}

/// Render a single `key=value` field item
pub fn render_item(key: &str, value: &FieldValue) -> String {
    format!("{}={}", key, format_value(value))
}

/// Render a single `key=value` tag item. Tag values are written verbatim.
pub fn render_tag(key: &str, value: &str) -> String {
    format!("{}={}", key, value)
}

fn render_tags(point: &Point) -> String {
    if point.tags().is_empty() {
        return String::new();
    }
    let tags: Vec<String> = point
        .tags()
        .iter()
        .map(|(k, v)| render_tag(k, v))
        .collect();
    format!(",{}", tags.join(","))
}

fn render_fields(point: &Point) -> String {
    let fields: Vec<String> = point
        .fields()
        .iter()
        .map(|(k, v)| render_item(k, v))
        .collect();
    fields.join(",")
}

/// Encode a point as one newline-terminated line
pub fn encode(point: &Point) -> String {
    format!(
        "{}{} {} {}\n",
        point.measurement(),
        render_tags(point),
        render_fields(point),
        point.time()
    )
}

/// Encode a batch of points as a request body
pub fn encode_all(points: &[Point]) -> String {
    points.iter().map(encode).collect()
}
