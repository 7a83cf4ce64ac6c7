//! Reusable value formatters.
//!
//! Formatters never fail: a value they cannot convert is returned unchanged,
//! so a pattern keeps its raw string rather than losing the match.

use std::sync::Arc;

use crate::Value;
use crate::matches::Formatter;

/// Applies `formatters` left to right.
pub fn chain(formatters: Vec<Formatter>) -> Formatter {
    Arc::new(move |value: &Value| formatters.iter().fold(value.clone(), |value, formatter| formatter(&value)))
}

/// Parses a string into [`Value::Int`], ignoring surrounding whitespace and leading zeros.
pub fn to_int() -> Formatter {
    Arc::new(|value: &Value| match value {
        Value::Str(s) => s.trim().parse::<i64>().map_or_else(|_| value.clone(), Value::Int),
        _ => value.clone(),
    })
}

/// Parses a string into [`Value::Float`]; `,` is accepted as decimal separator.
pub fn to_float() -> Formatter {
    Arc::new(|value: &Value| match value {
        Value::Str(s) => s.trim().replace(',', ".").parse::<f64>().map_or_else(|_| value.clone(), Value::Float),
        Value::Int(i) => Value::Float(*i as f64),
        _ => value.clone(),
    })
}

pub fn lowercase() -> Formatter {
    map_str(|s| s.to_lowercase())
}

pub fn uppercase() -> Formatter {
    map_str(|s| s.to_uppercase())
}

/// Trims any of `chars` from both ends; whitespace when `chars` is empty.
pub fn strip(chars: impl Into<String>) -> Formatter {
    let chars: String = chars.into();
    map_str(move |s| {
        if chars.is_empty() {
            s.trim().to_string()
        } else {
            s.trim_matches(|c| chars.contains(c)).to_string()
        }
    })
}

fn map_str(f: impl Fn(&str) -> String + Send + Sync + 'static) -> Formatter {
    Arc::new(move |value: &Value| match value {
        Value::Str(s) => Value::Str(f(s)),
        _ => value.clone(),
    })
}
