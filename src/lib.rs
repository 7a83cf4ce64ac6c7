extern crate self as rebulk;

use std::collections::HashMap;
use std::fmt;

#[macro_use]
mod macros;
mod api;
mod chain;
mod engine;
mod error;
pub mod formatters;
mod introspector;
mod matches;
mod pattern;
mod utils;
pub mod validators;

pub use api::{ChainBuilder, Rebulk};
pub use chain::{Chain, ChainBreaker, ChainPart, Repeater};
pub use engine::{
    Consequence, ConflictSolver, ConflictSolverFn, FnRule, POST_PROCESS, PRE_PROCESS, PatternMetrics, PrivateRemover,
    Resolution, Response, Rule, Rules, RunMetrics, RunResult, default_conflict_solver, rule_name,
};
pub use error::{Error, Result};
pub use introspector::{Introspection, PatternIntrospection, Properties, RuleIntrospection};
pub use matches::{Formatter, Markers, Match, MatchSet, Matches, MatchesDict};
pub use pattern::{
    Disabled, Found, FunctionalPattern, Keyed, MatchFn, MatchProcessor, Pattern, PatternOptions, PostProcessor,
    RegexFlags, RegexPattern, StringPattern, Validator,
};

// --- Shared types -----------------------------------------------------------

/// Resolved value of a match.
///
/// Raw matches always start out as [`Value::Str`] holding the matched
/// substring; formatters and value overrides may turn it into anything else.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Truthiness used by context flags: empty strings, zero, `false` and
    /// empty lists are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Str(s) => !s.is_empty(),
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Bool(b) => *b,
            Value::List(items) => !items.is_empty(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::List(items) => {
                f.write_str("[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::List(value.into_iter().map(Into::into).collect())
    }
}

/// Per-call data handed to `disabled` callbacks, functional patterns and rules.
///
/// The engine never interprets it; it is pass-through configuration owned by
/// the caller (for example a list of allowed properties, or a locale).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    values: HashMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// True when `key` is present and truthy.
    pub fn is_set(&self, key: &str) -> bool {
        self.values.get(key).is_some_and(Value::is_truthy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_display_and_truthiness() {
        assert_eq!(Value::from(vec![1, 2]).to_string(), "[1, 2]");
        assert_eq!(Value::from("x").to_string(), "x");
        assert!(!Value::from("").is_truthy());
        assert!(Value::Int(3).is_truthy());
        assert_eq!(Value::Int(2).as_float(), Some(2.0));
    }

    #[test]
    fn context_flags() {
        let ctx = Context::new().with("name_only", true).with("empty", "");
        assert!(ctx.is_set("name_only"));
        assert!(!ctx.is_set("empty"));
        assert!(ctx.contains("empty"));
        assert!(!ctx.is_set("missing"));
    }
}
