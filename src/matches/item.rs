use std::fmt;
use std::sync::Arc;

use crate::engine::ConflictSolverFn;
use crate::Value;

/// Turns a raw value into its final form.
pub type Formatter = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// A located fragment of the input string.
///
/// Children are owned by value. `parent` is only set on children that were
/// yielded on their own, and holds a snapshot of the match they came from.
#[derive(Clone)]
pub struct Match {
    pub start: usize,
    pub end: usize,
    pub name: Option<String>,
    pub tags: Vec<String>,
    pub private: bool,
    pub marker: bool,
    pub children: Vec<Match>,
    pub parent: Option<Arc<Match>>,
    pub conflict_solver: Option<ConflictSolverFn>,
    pub(crate) match_index: usize,
    raw_start: Option<usize>,
    raw_end: Option<usize>,
    value: Option<Value>,
    formatter: Option<Formatter>,
    input: Arc<str>,
}

impl Match {
    pub fn new(start: usize, end: usize, input: Arc<str>) -> Self {
        Self {
            start,
            end,
            name: None,
            tags: Vec::new(),
            private: false,
            marker: false,
            children: Vec::new(),
            parent: None,
            conflict_solver: None,
            match_index: 0,
            raw_start: None,
            raw_end: None,
            value: None,
            formatter: None,
            input,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for tag in tags {
            self.add_tag(tag);
        }
        self
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_formatter(mut self, formatter: impl Fn(&Value) -> Value + Send + Sync + 'static) -> Self {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    pub fn with_private(mut self, private: bool) -> Self {
        self.private = private;
        self
    }

    pub fn with_marker(mut self, marker: bool) -> Self {
        self.marker = marker;
        self
    }

    pub fn input(&self) -> &Arc<str> {
        &self.input
    }

    pub fn span(&self) -> (usize, usize) {
        (self.start, self.end)
    }

    pub fn raw_start(&self) -> usize {
        self.raw_start.unwrap_or(self.start)
    }

    pub fn raw_end(&self) -> usize {
        self.raw_end.unwrap_or(self.end)
    }

    /// Narrows the raw slice without moving the span.
    pub fn set_raw_span(&mut self, start: usize, end: usize) {
        self.raw_start = Some(start);
        self.raw_end = Some(end);
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn raw(&self) -> &str {
        self.input.get(self.raw_start()..self.raw_end()).unwrap_or("")
    }

    /// Explicit value if any, else the formatted raw string, else the raw string.
    pub fn value(&self) -> Value {
        if let Some(value) = &self.value {
            return value.clone();
        }
        let raw = Value::Str(self.raw().to_string());
        match &self.formatter {
            Some(formatter) => formatter(&raw),
            None => raw,
        }
    }

    pub fn value_override(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn set_value(&mut self, value: impl Into<Value>) {
        self.value = Some(value.into());
    }

    pub fn clear_value(&mut self) {
        self.value = None;
    }

    pub fn formatter(&self) -> Option<&Formatter> {
        self.formatter.as_ref()
    }

    pub fn set_formatter(&mut self, formatter: Option<Formatter>) {
        self.formatter = formatter;
    }

    /// Root of the parent chain; the match itself when it has no parent.
    pub fn initiator(&self) -> &Match {
        match &self.parent {
            Some(parent) => parent.initiator(),
            None => self,
        }
    }

    /// Own name followed by the names of all descendants, without duplicates.
    pub fn names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names(&self, names: &mut Vec<String>) {
        if let Some(name) = &self.name {
            crate::utils::push_unique(names, name.clone());
        }
        for child in &self.children {
            child.collect_names(names);
        }
    }

    pub fn named(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }

    pub fn tagged(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn children_named(&self, name: &str) -> Vec<&Match> {
        self.children.iter().filter(|c| c.named(name)).collect()
    }

    pub fn add_tag(&mut self, tag: impl Into<String>) {
        crate::utils::push_unique(&mut self.tags, tag.into());
    }

    pub fn remove_tag(&mut self, tag: &str) {
        self.tags.retain(|t| t != tag);
    }

    pub fn overlaps(&self, other: &Match) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Moves the match (and its descendants) by `offset` bytes into `input`.
    pub(crate) fn shift(&mut self, offset: usize, input: &Arc<str>) {
        self.start += offset;
        self.end += offset;
        self.raw_start = self.raw_start.map(|s| s + offset);
        self.raw_end = self.raw_end.map(|e| e + offset);
        self.input = Arc::clone(input);
        for child in &mut self.children {
            child.shift(offset, input);
        }
        if let Some(parent) = &self.parent {
            let mut parent = (**parent).clone();
            parent.shift(offset, input);
            self.parent = Some(Arc::new(parent));
        }
    }

    fn reframe(&mut self, start: usize, end: usize) {
        self.start = start;
        self.end = end;
        self.raw_start = None;
        self.raw_end = None;
    }

    /// Pieces of this match left after cutting out every `crops` span.
    pub fn crop(&self, crops: &[(usize, usize)]) -> Vec<Match> {
        let mut pieces = vec![self.clone()];
        for &(start, end) in crops {
            let mut next = Vec::with_capacity(pieces.len() + 1);
            for mut current in pieces {
                if start <= current.start && end >= current.end {
                    continue;
                } else if start >= current.start && end <= current.end {
                    let mut right = current.clone();
                    let right_end = right.end;
                    right.reframe(end, right_end);
                    let left_start = current.start;
                    current.reframe(left_start, start);
                    next.extend([current, right].into_iter().filter(|m| !m.is_empty()));
                } else if end > current.start && end <= current.end {
                    let current_end = current.end;
                    current.reframe(end, current_end);
                    next.push(current);
                } else if start >= current.start && start < current.end {
                    let current_start = current.start;
                    current.reframe(current_start, start);
                    next.push(current);
                } else {
                    next.push(current);
                }
            }
            pieces = next;
        }
        pieces
    }

    /// Splits the match on every character of `seps`, dropping the separators.
    pub fn split(&self, seps: &str) -> Vec<Match> {
        let text = self.input.get(self.start..self.end).unwrap_or("");
        let mut pieces = Vec::new();
        let mut piece_start = None;
        for (offset, ch) in text.char_indices() {
            let position = self.start + offset;
            if seps.contains(ch) {
                if let Some(start) = piece_start.take() {
                    pieces.push(self.piece(start, position));
                }
            } else if piece_start.is_none() {
                piece_start = Some(position);
            }
        }
        if let Some(start) = piece_start {
            pieces.push(self.piece(start, self.end));
        }
        pieces
    }

    fn piece(&self, start: usize, end: usize) -> Match {
        let mut piece = self.clone();
        piece.reframe(start, end);
        piece
    }
}

impl PartialEq for Match {
    fn eq(&self, other: &Self) -> bool {
        self.span() == other.span()
            && self.name == other.name
            && self.value() == other.value()
            && self.parent.as_ref().map(|p| p.span()) == other.parent.as_ref().map(|p| p.span())
    }
}

impl fmt::Debug for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Match")
            .field("span", &self.span())
            .field("raw", &self.raw())
            .field("name", &self.name)
            .field("value", &self.value())
            .field("tags", &self.tags)
            .field("private", &self.private)
            .field("marker", &self.marker)
            .field("children", &self.children)
            .finish()
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}:({}, {})", self.raw(), self.start, self.end)?;
        if let Some(name) = &self.name {
            write!(f, "+name={name}")?;
        }
        if !self.tags.is_empty() {
            write!(f, "+tags=[{}]", self.tags.join(", "))?;
        }
        if self.value.is_some() || self.formatter.is_some() {
            write!(f, "+value={}", self.value())?;
        }
        if self.private {
            f.write_str("+private")?;
        }
        if self.marker {
            f.write_str("+marker")?;
        }
        f.write_str(">")
    }
}
