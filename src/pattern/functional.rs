use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use tracing::trace;

use super::options::PatternOptions;
use crate::matches::Match;
use crate::{Context, Value};

pub type MatchFn = Arc<dyn Fn(&str, &Context) -> Vec<Found> + Send + Sync>;

/// One occurrence reported by a functional pattern, with optional overrides
/// of the pattern-level settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Found {
    pub start: usize,
    pub end: usize,
    pub name: Option<String>,
    pub value: Option<Value>,
    pub tags: Vec<String>,
    pub private: Option<bool>,
    pub marker: Option<bool>,
}

impl Found {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end, ..Self::default() }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_private(mut self, private: bool) -> Self {
        self.private = Some(private);
        self
    }

    pub fn with_marker(mut self, marker: bool) -> Self {
        self.marker = Some(marker);
        self
    }
}

impl From<(usize, usize)> for Found {
    fn from((start, end): (usize, usize)) -> Self {
        Self::new(start, end)
    }
}

impl From<Range<usize>> for Found {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

/// Occurrences computed by user callbacks.
#[derive(Clone)]
pub struct FunctionalPattern {
    functions: Vec<MatchFn>,
    pub(crate) options: PatternOptions,
}

impl FunctionalPattern {
    pub fn new(function: impl Fn(&str, &Context) -> Vec<Found> + Send + Sync + 'static, options: PatternOptions) -> Self {
        Self { functions: vec![Arc::new(function)], options }
    }

    pub fn from_functions(functions: Vec<MatchFn>, options: PatternOptions) -> Self {
        Self { functions, options }
    }

    pub(crate) fn raw_matches(&self, input: &Arc<str>, context: &Context) -> Vec<Match> {
        let mut out = Vec::new();
        for function in &self.functions {
            for found in function(&input[..], context) {
                if found.start > found.end
                    || found.end > input.len()
                    || !input.is_char_boundary(found.start)
                    || !input.is_char_boundary(found.end)
                {
                    trace!(start = found.start, end = found.end, "functional pattern returned an out-of-range span");
                    continue;
                }
                let mut m = self.options.new_match(found.start, found.end, input);
                if let Some(name) = found.name {
                    m.name = Some(name);
                }
                if let Some(value) = found.value {
                    m.set_value(value);
                }
                for tag in found.tags {
                    m.add_tag(tag);
                }
                if let Some(private) = found.private {
                    m.private = private;
                }
                if let Some(marker) = found.marker {
                    m.marker = marker;
                }
                out.push(m);
            }
        }
        out
    }
}

impl fmt::Debug for FunctionalPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionalPattern")
            .field("functions", &self.functions.len())
            .field("options", &self.options)
            .finish()
    }
}
