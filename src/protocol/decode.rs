//! Line-protocol decoder
//!
//! Parses the subset of line protocol produced by [`super::encode`]: tag
//! values are plain tokens, string fields only escape `"` and every other
//! backslash is literal.
//!
//! A string value that itself ends in `\` is written as `...\"`, the same
//! text as an escaped quote. Such a quote is only taken as the end of the
//! string when reading it as an escape leaves the rest of the line
//! unparseable.

use super::point::{FieldValue, Point};
use crate::error::{Error, Result};
use std::collections::HashSet;

fn invalid(line: &str, reason: &str) -> Error {
    Error::Validation(format!("cannot decode {:?}: {}", line, reason))
}

/// Offsets in a quoted body where the string may end: a `"` followed by the
/// end of the section or by `,`. Unescaped quotes come first.
fn closing_quotes(body: &str) -> Vec<usize> {
    let (plain, escaped): (Vec<usize>, Vec<usize>) = body
        .match_indices('"')
        .map(|(i, _)| i)
        .filter(|&i| {
            let after = &body[i + 1..];
            after.is_empty() || after.starts_with(',')
        })
        .partition(|&i| !body[..i].ends_with('\\'));
    plain.into_iter().chain(escaped).collect()
}

/// Undo quote escaping. Every `"` in the content must be escaped.
fn unescape(content: &str) -> Option<String> {
    let mut after_backslash = false;
    for c in content.chars() {
        if c == '"' && !after_backslash {
            return None;
        }
        after_backslash = c == '\\';
    }
    Some(content.replace("\\\"", "\""))
}

fn parse_value(raw: &str) -> Option<FieldValue> {
    match raw {
        "true" => return Some(FieldValue::Boolean(true)),
        "false" => return Some(FieldValue::Boolean(false)),
        _ => {}
    }
    if let Some(digits) = raw.strip_suffix('i') {
        return digits.parse::<i128>().ok().map(FieldValue::Integer);
    }
    raw.parse::<f64>().ok().map(FieldValue::Float)
}

/// Parse `key=value[,key=value...]`
///
/// `dead_ends` holds the lengths of suffixes already known not to parse, so
/// backtracking over ambiguous quotes stays polynomial.
fn parse_fields(
    section: &str,
    dead_ends: &mut HashSet<usize>,
) -> Option<Vec<(String, FieldValue)>> {
    if dead_ends.contains(&section.len()) {
        return None;
    }
    let parsed = parse_fields_at(section, dead_ends);
    if parsed.is_none() {
        dead_ends.insert(section.len());
    }
    parsed
}

fn parse_fields_at(
    section: &str,
    dead_ends: &mut HashSet<usize>,
) -> Option<Vec<(String, FieldValue)>> {
    let (key, rest) = section.split_once('=')?;

    if let Some(body) = rest.strip_prefix('"') {
        for end in closing_quotes(body) {
            let Some(value) = unescape(&body[..end]) else {
                continue;
            };
            let mut fields = vec![(key.to_string(), FieldValue::String(value))];
            if let Some(next) = body[end + 1..].strip_prefix(',') {
                match parse_fields(next, dead_ends) {
                    Some(tail) => fields.extend(tail),
                    None => continue,
                }
            }
            return Some(fields);
        }
        return None;
    }

    let (raw, next) = match rest.split_once(',') {
        Some((raw, next)) => (raw, Some(next)),
        None => (rest, None),
    };
    let mut fields = vec![(key.to_string(), parse_value(raw)?)];
    if let Some(next) = next {
        fields.extend(parse_fields(next, dead_ends)?);
    }
    Some(fields)
}

/// Decode one line back into a [`Point`]
pub fn decode(line: &str) -> Result<Point> {
    let body = line.strip_suffix('\n').unwrap_or(line);

    let (head, time) = body
        .rsplit_once(' ')
        .ok_or_else(|| invalid(line, "missing timestamp"))?;
    let time: i64 = time
        .parse()
        .map_err(|_| invalid(line, "timestamp is not an integer"))?;

    let (series, field_section) = head
        .split_once(' ')
        .ok_or_else(|| invalid(line, "missing field section"))?;

    let mut series_parts = series.split(',');
    let measurement = series_parts.next().unwrap_or_default();

    let mut tags = Vec::new();
    for item in series_parts {
        let (key, value) = item
            .split_once('=')
            .ok_or_else(|| invalid(line, "tag without '='"))?;
        tags.push((key.to_string(), value.to_string()));
    }

    let fields = parse_fields(field_section, &mut HashSet::new())
        .ok_or_else(|| invalid(line, "malformed field section"))?;

    Point::new(measurement, fields, tags, time)
}

/// Decode newline-separated lines, skipping blank ones
///
/// Returns the decoded points and, for every line that failed, its 1-based
/// line number with the error.
pub fn decode_lines(input: &str) -> (Vec<Point>, Vec<(usize, Error)>) {
    let mut points = Vec::new();
    let mut failures = Vec::new();
    for (index, line) in input.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match decode(line) {
            Ok(point) => points.push(point),
            Err(e) => failures.push((index + 1, e)),
        }
    }
    (points, failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::encode;

    #[test]
    fn test_decode_full_line() {
        let line = "meter_consumption,SERIAL=PVS5M1,subtype=NET_CONSUMPTION_LOADSIDE p_3phsum_kw=-3.7339e+00,CAL0=100i 1686817800000000000\n";
        let point = decode(line).unwrap();

        assert_eq!(point.measurement(), "meter_consumption");
        assert_eq!(point.tag("SERIAL"), Some("PVS5M1"));
        assert_eq!(point.tag("subtype"), Some("NET_CONSUMPTION_LOADSIDE"));
        assert_eq!(point.field("p_3phsum_kw"), Some(&FieldValue::Float(-3.7339)));
        assert_eq!(point.field("CAL0"), Some(&FieldValue::Integer(100)));
        assert_eq!(point.time(), 1686817800000000000);
    }

    #[test]
    fn test_decode_strings_with_separators() {
        let line = "note msg=\"a, b=c \\\"d\\\"\",ok=false 5\n";
        let point = decode(line).unwrap();
        assert_eq!(
            point.field("msg"),
            Some(&FieldValue::String("a, b=c \"d\"".to_string()))
        );
        assert_eq!(point.field("ok"), Some(&FieldValue::Boolean(false)));
        assert!(point.tags().is_empty());
    }

    #[test]
    fn test_round_trip_preserves_point() {
        let original = Point::new(
            "inverter",
            vec![
                ("ltea_3phsum_kwh".to_string(), FieldValue::Float(89.4825)),
                ("stat_ind".to_string(), FieldValue::Float(0.0)),
                ("count".to_string(), FieldValue::Integer(-12)),
                ("label".to_string(), FieldValue::from("He said \"hi\"")),
                ("flag".to_string(), FieldValue::Boolean(true)),
            ],
            vec![("SERIAL".to_string(), "E00123".to_string())],
            1672531200000000000,
        )
        .unwrap();

        let decoded = decode(&encode::encode(&original)).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_round_trip_overflowing_integer_becomes_float() {
        let original = Point::new(
            "m",
            vec![("big".to_string(), FieldValue::Integer(i64::MAX as i128 + 1))],
            vec![],
            0,
        )
        .unwrap();

        let decoded = decode(&encode::encode(&original)).unwrap();
        assert_eq!(
            decoded.field("big"),
            Some(&FieldValue::Float(9223372036854775808.0))
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode("").is_err());
        assert!(decode("meter 123").is_err());
        assert!(decode("meter a=1i notatime").is_err());
        assert!(decode("meter a=\"open 1").is_err());
        assert!(decode("meter a=what 1").is_err());
        assert!(decode("meter,tag a=1i 1").is_err());
    }

    fn string_point(values: &[(&str, &str)]) -> Point {
        let mut fields: Vec<(String, FieldValue)> = values
            .iter()
            .map(|(k, v)| (k.to_string(), FieldValue::from(*v)))
            .collect();
        fields.push(("n".to_string(), FieldValue::Integer(1)));
        Point::new("m", fields, vec![], 1).unwrap()
    }

    #[test]
    fn test_round_trip_backslash_before_quote() {
        let original = Point::new(
            "m",
            vec![("s".to_string(), FieldValue::from("a\\\",b"))],
            vec![],
            1,
        )
        .unwrap();

        let line = encode::encode(&original);
        assert_eq!(line, "m s=\"a\\\\\",b\" 1\n");
        assert_eq!(decode(&line).unwrap(), original);
    }

    #[test]
    fn test_round_trip_literal_backslashes() {
        let values = ["x\\y", "x\\\\y", "a\\", "\\", "\\\"", "\"\\", "a\\,b=\\"];
        for value in values {
            let original = string_point(&[("s", value)]);
            let decoded = decode(&encode::encode(&original)).unwrap();
            assert_eq!(decoded, original, "value {:?}", value);
        }
    }

    #[test]
    fn test_round_trip_trailing_backslash_before_next_string() {
        let original = string_point(&[("s", "a\\"), ("t", "b\\\",c")]);
        let line = encode::encode(&original);
        assert_eq!(decode(&line).unwrap(), original);

        let original = string_point(&[("s", "a\\\",t=\""), ("t", "x")]);
        let line = encode::encode(&original);
        assert_eq!(decode(&line).unwrap(), original);
    }

    #[test]
    fn test_decode_rejects_bare_quote_in_string() {
        assert!(decode("m s=\"a\"b\" 1").is_err());
        assert!(decode("m s=\"a\" 1").is_ok());
    }

    #[test]
    fn test_decode_lines_reports_failures_by_line() {
        let input = "m a=1i 1\n\nm a=\"open 2\nm,SERIAL=X b=2.5e+00 3\r\nnot a line\n";
        let (points, failures) = decode_lines(input);

        assert_eq!(points.len(), 2);
        assert_eq!(points[1].tag("SERIAL"), Some("X"));
        let lines: Vec<usize> = failures.iter().map(|(n, _)| *n).collect();
        assert_eq!(lines, vec![3, 5]);
        assert!(matches!(failures[0].1, Error::Validation(_)));
    }

    #[test]
    fn test_decode_lines_accepts_encoded_batch() {
        let batch = encode::encode_all(&[
            string_point(&[("s", "a\\")]),
            string_point(&[("s", "b")]),
        ]);
        let (points, failures) = decode_lines(&batch);
        assert_eq!(points.len(), 2);
        assert!(failures.is_empty());
    }
}
