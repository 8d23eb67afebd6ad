use std::cmp::Ordering;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

/// Coerces a loosely typed count into a non-negative integer.
///
/// Numbers and numeric strings are accepted; anything non-finite, negative or
/// non-numeric degrades to zero. Fractions are truncated.
pub fn sanitize_count(value: &Value) -> u32 {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        _ => None,
    };
    match parsed {
        Some(n) if n.is_finite() && n > 0.0 => {
            if n >= u32::MAX as f64 {
                u32::MAX
            } else {
                n.trunc() as u32
            }
        }
        _ => 0,
    }
}

/// Accepts RFC 3339 strings or integer epoch milliseconds.
pub fn parse_timestamp(value: &Value) -> Result<DateTime<Utc>> {
    match value {
        Value::String(text) => DateTime::parse_from_rfc3339(text.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|err| anyhow!("'{}' is not an RFC 3339 timestamp: {}", text, err)),
        Value::Number(number) => {
            let millis = number
                .as_i64()
                .ok_or_else(|| anyhow!("epoch milliseconds must be an integer"))?;
            Utc.timestamp_millis_opt(millis)
                .single()
                .ok_or_else(|| anyhow!("epoch milliseconds {} out of range", millis))
        }
        other => Err(anyhow!("unsupported timestamp value: {}", other)),
    }
}

/// Millisecond stamp for a new detection that sorts strictly after `last`.
///
/// Storage keeps `created_at` at millisecond precision and replays history in
/// `created_at` order, so two inserts inside one millisecond are pushed apart.
pub fn next_insertion_stamp(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc
        .timestamp_millis_opt(now.timestamp_millis())
        .single()
        .unwrap_or(now);
    match last {
        Some(last) if now <= last => last + Duration::milliseconds(1),
        _ => now,
    }
}

/// Case-insensitive comparison where runs of ASCII digits compare by value,
/// so "Item 2" sorts before "item 10".
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let left = a.to_lowercase();
    let right = b.to_lowercase();
    let mut lhs = left.chars().peekable();
    let mut rhs = right.chars().peekable();

    loop {
        match (lhs.peek().copied(), rhs.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let l_run = take_digits(&mut lhs);
                let r_run = take_digits(&mut rhs);
                let ordering = compare_digit_runs(&l_run, &r_run);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(l), Some(r)) => {
                if l != r {
                    return l.cmp(&r);
                }
                lhs.next();
                rhs.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        chars.next();
    }
    run
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a_trim = a.trim_start_matches('0');
    let b_trim = b.trim_start_matches('0');
    a_trim
        .len()
        .cmp(&b_trim.len())
        .then_with(|| a_trim.cmp(b_trim))
        .then_with(|| a.len().cmp(&b.len()))
}
