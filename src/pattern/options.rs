use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::engine::{ConflictSolverFn, Resolution};
use crate::introspector::Properties;
use crate::matches::{Formatter, Match};
use crate::{Context, Value};

pub type Validator = Arc<dyn Fn(&Match) -> bool + Send + Sync>;
pub type Disabled = Arc<dyn Fn(&Context) -> bool + Send + Sync>;
pub type MatchProcessor = Arc<dyn Fn(Match, &Context) -> Option<Match> + Send + Sync>;
pub type PostProcessor = Arc<dyn Fn(Vec<Match>, &Context) -> Vec<Match> + Send + Sync>;

bitflags! {
    /// Compilation flags for regex patterns.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct RegexFlags: u8 {
        const IGNORECASE = 1 << 0;
        const MULTILINE = 1 << 1;
        const DOTALL = 1 << 2;
        const VERBOSE = 1 << 3;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Node {
    Parent,
    Child,
}

/// A setting that may differ per match name and per match kind.
///
/// Lookup order: exact name, then the parent/children slot, then the default.
pub struct Keyed<T> {
    default: Option<T>,
    parent: Option<T>,
    children: Option<T>,
    named: Vec<(String, T)>,
    whole: bool,
}

impl<T> Default for Keyed<T> {
    fn default() -> Self {
        Self { default: None, parent: None, children: None, named: Vec::new(), whole: false }
    }
}

impl<T: Clone> Clone for Keyed<T> {
    fn clone(&self) -> Self {
        Self {
            default: self.default.clone(),
            parent: self.parent.clone(),
            children: self.children.clone(),
            named: self.named.clone(),
            whole: self.whole,
        }
    }
}

impl<T: Clone> Keyed<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single value for every match; replaces lower levels entirely on merge.
    pub fn all(value: T) -> Self {
        Self { default: Some(value), whole: true, ..Self::default() }
    }

    pub fn default_value(mut self, value: T) -> Self {
        self.default = Some(value);
        self.whole = false;
        self
    }

    pub fn parent(mut self, value: T) -> Self {
        self.parent = Some(value);
        self.whole = false;
        self
    }

    pub fn children(mut self, value: T) -> Self {
        self.children = Some(value);
        self.whole = false;
        self
    }

    pub fn named(mut self, name: impl Into<String>, value: T) -> Self {
        let name = name.into();
        self.named.retain(|(n, _)| *n != name);
        self.named.push((name, value));
        self.whole = false;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.default.is_none() && self.parent.is_none() && self.children.is_none() && self.named.is_empty()
    }

    pub(crate) fn lookup(&self, name: Option<&str>, node: Node) -> Option<&T> {
        if let Some((_, value)) = name.and_then(|name| self.named.iter().find(|(n, _)| n == name)) {
            return Some(value);
        }
        let slot = match node {
            Node::Parent => self.parent.as_ref(),
            Node::Child => self.children.as_ref(),
        };
        slot.or(self.default.as_ref())
    }

    pub(crate) fn merge(self, lower: &Keyed<T>) -> Keyed<T> {
        if self.whole {
            return self;
        }
        if self.is_empty() {
            return lower.clone();
        }
        let mut named = self.named;
        for (name, value) in &lower.named {
            if !named.iter().any(|(n, _)| n == name) {
                named.push((name.clone(), value.clone()));
            }
        }
        Keyed {
            default: self.default.or_else(|| lower.default.clone()),
            parent: self.parent.or_else(|| lower.parent.clone()),
            children: self.children.or_else(|| lower.children.clone()),
            named,
            whole: false,
        }
    }
}

impl<T> fmt::Debug for Keyed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keyed")
            .field("default", &self.default.is_some())
            .field("parent", &self.parent.is_some())
            .field("children", &self.children.is_some())
            .field("named", &self.named.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>())
            .finish()
    }
}

/// Options shared by every pattern kind.
///
/// Each field is optional so that instance options, per-kind defaults and
/// engine defaults can be layered with [`PatternOptions::merge`].
#[derive(Clone, Default)]
pub struct PatternOptions {
    pub(crate) name: Option<String>,
    pub(crate) tags: Option<Vec<String>>,
    pub(crate) formatter: Keyed<Formatter>,
    pub(crate) value: Keyed<Value>,
    pub(crate) validator: Keyed<Validator>,
    pub(crate) children: Option<bool>,
    pub(crate) every: Option<bool>,
    pub(crate) private: Option<bool>,
    pub(crate) private_parent: Option<bool>,
    pub(crate) private_children: Option<bool>,
    pub(crate) private_names: Option<Vec<String>>,
    pub(crate) ignore_names: Option<Vec<String>>,
    pub(crate) marker: Option<bool>,
    pub(crate) format_all: Option<bool>,
    pub(crate) validate_all: Option<bool>,
    pub(crate) disabled: Option<Disabled>,
    pub(crate) conflict_solver: Option<ConflictSolverFn>,
    pub(crate) pre_match_processor: Option<MatchProcessor>,
    pub(crate) post_match_processor: Option<MatchProcessor>,
    pub(crate) post_processor: Option<PostProcessor>,
    pub(crate) properties: Option<Properties>,
    pub(crate) ignore_case: Option<bool>,
    pub(crate) flags: Option<RegexFlags>,
    pub(crate) abbreviations: Option<Vec<(String, String)>>,
    pub(crate) repeated_captures: Option<bool>,
}

pub(crate) fn flag(value: Option<bool>) -> bool {
    value.unwrap_or(false)
}

fn concat<T: Clone>(upper: Option<Vec<T>>, lower: &Option<Vec<T>>) -> Option<Vec<T>> {
    match (lower, upper) {
        (None, upper) => upper,
        (Some(lower), None) => Some(lower.clone()),
        (Some(lower), Some(upper)) => Some(lower.iter().cloned().chain(upper).collect()),
    }
}

impl PatternOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.get_or_insert_with(Vec::new).push(tag.into());
        self
    }

    pub fn formatter(mut self, formatter: impl Fn(&Value) -> Value + Send + Sync + 'static) -> Self {
        self.formatter = Keyed::all(Arc::new(formatter));
        self
    }

    pub fn formatters(mut self, formatters: Keyed<Formatter>) -> Self {
        self.formatter = formatters;
        self
    }

    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = Keyed::all(value.into());
        self
    }

    pub fn values(mut self, values: Keyed<Value>) -> Self {
        self.value = values;
        self
    }

    pub fn validator(mut self, validator: impl Fn(&Match) -> bool + Send + Sync + 'static) -> Self {
        self.validator = Keyed::all(Arc::new(validator));
        self
    }

    pub fn validators(mut self, validators: Keyed<Validator>) -> Self {
        self.validator = validators;
        self
    }

    /// Yield capture-group children instead of the whole match.
    pub fn children(mut self, children: bool) -> Self {
        self.children = Some(children);
        self
    }

    /// Yield both the whole match and its children.
    pub fn every(mut self, every: bool) -> Self {
        self.every = Some(every);
        self
    }

    pub fn private(mut self, private: bool) -> Self {
        self.private = Some(private);
        self
    }

    pub fn private_parent(mut self, private_parent: bool) -> Self {
        self.private_parent = Some(private_parent);
        self
    }

    pub fn private_children(mut self, private_children: bool) -> Self {
        self.private_children = Some(private_children);
        self
    }

    pub fn private_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.private_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn ignore_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn marker(mut self, marker: bool) -> Self {
        self.marker = Some(marker);
        self
    }

    pub fn format_all(mut self, format_all: bool) -> Self {
        self.format_all = Some(format_all);
        self
    }

    pub fn validate_all(mut self, validate_all: bool) -> Self {
        self.validate_all = Some(validate_all);
        self
    }

    pub fn disabled(mut self, disabled: impl Fn(&Context) -> bool + Send + Sync + 'static) -> Self {
        self.disabled = Some(Arc::new(disabled));
        self
    }

    pub fn conflict_solver(mut self, solver: impl Fn(&Match, &Match) -> Resolution + Send + Sync + 'static) -> Self {
        self.conflict_solver = Some(Arc::new(solver));
        self
    }

    pub fn pre_match_processor(
        mut self,
        processor: impl Fn(Match, &Context) -> Option<Match> + Send + Sync + 'static,
    ) -> Self {
        self.pre_match_processor = Some(Arc::new(processor));
        self
    }

    pub fn post_match_processor(
        mut self,
        processor: impl Fn(Match, &Context) -> Option<Match> + Send + Sync + 'static,
    ) -> Self {
        self.post_match_processor = Some(Arc::new(processor));
        self
    }

    pub fn post_processor(
        mut self,
        processor: impl Fn(Vec<Match>, &Context) -> Vec<Match> + Send + Sync + 'static,
    ) -> Self {
        self.post_processor = Some(Arc::new(processor));
        self
    }

    /// Declared properties, overriding what introspection would infer.
    pub fn properties<I>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<Option<Value>>)>,
    {
        self.properties = Some(properties.into_iter().collect::<BTreeMap<_, _>>());
        self
    }

    pub fn ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = Some(ignore_case);
        self
    }

    pub fn flags(mut self, flags: RegexFlags) -> Self {
        self.flags = Some(flags);
        self
    }

    /// Textual substitutions applied to regex sources before compilation.
    pub fn abbreviations<I, A, B>(mut self, abbreviations: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        self.abbreviations = Some(abbreviations.into_iter().map(|(a, b)| (a.into(), b.into())).collect());
        self
    }

    pub fn repeated_captures(mut self, repeated_captures: bool) -> Self {
        self.repeated_captures = Some(repeated_captures);
        self
    }

    pub fn get_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_marker(&self) -> bool {
        flag(self.marker)
    }

    /// Layers `self` over `lower`: scalars from `self` win, lists concatenate
    /// (lower first), keyed settings merge per key.
    pub fn merge(self, lower: &PatternOptions) -> PatternOptions {
        PatternOptions {
            name: self.name.or_else(|| lower.name.clone()),
            tags: concat(self.tags, &lower.tags),
            formatter: self.formatter.merge(&lower.formatter),
            value: self.value.merge(&lower.value),
            validator: self.validator.merge(&lower.validator),
            children: self.children.or(lower.children),
            every: self.every.or(lower.every),
            private: self.private.or(lower.private),
            private_parent: self.private_parent.or(lower.private_parent),
            private_children: self.private_children.or(lower.private_children),
            private_names: concat(self.private_names, &lower.private_names),
            ignore_names: concat(self.ignore_names, &lower.ignore_names),
            marker: self.marker.or(lower.marker),
            format_all: self.format_all.or(lower.format_all),
            validate_all: self.validate_all.or(lower.validate_all),
            disabled: self.disabled.or_else(|| lower.disabled.clone()),
            conflict_solver: self.conflict_solver.or_else(|| lower.conflict_solver.clone()),
            pre_match_processor: self.pre_match_processor.or_else(|| lower.pre_match_processor.clone()),
            post_match_processor: self.post_match_processor.or_else(|| lower.post_match_processor.clone()),
            post_processor: self.post_processor.or_else(|| lower.post_processor.clone()),
            properties: self.properties.or_else(|| lower.properties.clone()),
            ignore_case: self.ignore_case.or(lower.ignore_case),
            flags: self.flags.or(lower.flags),
            abbreviations: concat(self.abbreviations, &lower.abbreviations),
            repeated_captures: self.repeated_captures.or(lower.repeated_captures),
        }
    }

    /// Fresh match carrying the pattern-level name, tags and flags.
    pub(crate) fn new_match(&self, start: usize, end: usize, input: &Arc<str>) -> Match {
        let mut m = Match::new(start, end, Arc::clone(input));
        m.name = self.name.clone();
        if let Some(tags) = &self.tags {
            for tag in tags {
                m.add_tag(tag.clone());
            }
        }
        m.private = flag(self.private);
        m.marker = flag(self.marker);
        m.conflict_solver = self.conflict_solver.clone();
        m
    }

    pub(crate) fn is_disabled(&self, context: &Context) -> bool {
        self.disabled.as_ref().is_some_and(|disabled| disabled(context))
    }
}

impl fmt::Debug for PatternOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternOptions")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .field("children", &self.children)
            .field("every", &self.every)
            .field("private", &self.private)
            .field("marker", &self.marker)
            .field("formatter", &self.formatter)
            .field("validator", &self.validator)
            .finish_non_exhaustive()
    }
}
