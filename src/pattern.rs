//! Pattern kinds and their shared options.
//!
//! Every pattern produces raw matches, then runs them through the same
//! post-match pipeline (see `process.rs`). Raw matches are kept alongside the
//! processed ones because chains reason about repetitions on raw positions.

#[path = "pattern/functional.rs"]
mod functional;
#[path = "pattern/options.rs"]
mod options;
#[path = "pattern/process.rs"]
mod process;
#[path = "pattern/re.rs"]
mod re;
#[path = "pattern/string.rs"]
mod string;

use std::sync::Arc;

pub use functional::{Found, FunctionalPattern, MatchFn};
pub(crate) use options::Node;
pub use options::{Disabled, Keyed, MatchProcessor, PatternOptions, PostProcessor, RegexFlags, Validator};
pub use re::RegexPattern;
pub use string::StringPattern;

use crate::chain::Chain;
use crate::error::Result;
use crate::matches::Match;
use crate::Context;

/// Output of one pattern run: yielded matches and the raw matches they came from.
#[derive(Debug, Clone, Default)]
pub(crate) struct PatternRun {
    pub(crate) matches: Vec<Match>,
    pub(crate) raw: Vec<Match>,
}

#[derive(Debug, Clone)]
pub enum Pattern {
    String(StringPattern),
    Regex(RegexPattern),
    Functional(FunctionalPattern),
    Chain(Chain),
}

impl Pattern {
    pub fn string<I, S>(literals: I, options: PatternOptions) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        StringPattern::new(literals, options).map(Pattern::String)
    }

    pub fn regex<I, S>(patterns: I, options: PatternOptions) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RegexPattern::new(patterns, options).map(Pattern::Regex)
    }

    pub fn functional(
        function: impl Fn(&str, &Context) -> Vec<Found> + Send + Sync + 'static,
        options: PatternOptions,
    ) -> Self {
        Pattern::Functional(FunctionalPattern::new(function, options))
    }

    pub fn options(&self) -> &PatternOptions {
        match self {
            Pattern::String(p) => &p.options,
            Pattern::Regex(p) => &p.options,
            Pattern::Functional(p) => &p.options,
            Pattern::Chain(c) => c.options(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.options().get_name()
    }

    pub fn is_disabled(&self, context: &Context) -> bool {
        self.options().is_disabled(context)
    }

    /// Short description used in logs and reports.
    pub fn label(&self) -> String {
        let kind = match self {
            Pattern::String(p) => format!("string{:?}", p.literals()),
            Pattern::Regex(p) => {
                let sources: Vec<&str> = p.regexes().iter().map(|re| re.as_str()).collect();
                format!("regex{sources:?}")
            }
            Pattern::Functional(_) => "functional".to_string(),
            Pattern::Chain(c) => format!("chain({} parts)", c.parts().len()),
        };
        match self.name() {
            Some(name) => format!("{name}:{kind}"),
            None => kind,
        }
    }

    /// Processed matches of this pattern over `input`; empty when disabled.
    pub fn matches(&self, input: &str, context: &Context) -> Vec<Match> {
        self.matches_in(&Arc::from(input), context)
    }

    pub(crate) fn matches_in(&self, input: &Arc<str>, context: &Context) -> Vec<Match> {
        if self.is_disabled(context) {
            return Vec::new();
        }
        self.run(input, context).matches
    }

    /// Processed and raw matches. Raw match indexes are unique within one run.
    pub(crate) fn run(&self, input: &Arc<str>, context: &Context) -> PatternRun {
        let raw = match self {
            Pattern::Chain(chain) => return chain.run(input, context),
            Pattern::String(p) => p.raw_matches(input),
            Pattern::Regex(p) => p.raw_matches(input),
            Pattern::Functional(p) => p.raw_matches(input, context),
        };
        let options = self.options();
        let raw: Vec<Match> = raw
            .into_iter()
            .enumerate()
            .map(|(index, mut m)| {
                m.match_index = index;
                for child in &mut m.children {
                    child.match_index = index;
                }
                m
            })
            .collect();

        let mut matches = Vec::new();
        for m in &raw {
            if let Some(yielded) = options.process(m.clone(), context) {
                matches.extend(yielded);
            }
        }
        if let Some(post) = &options.post_processor {
            matches = post(matches, context);
        }
        PatternRun { matches, raw }
    }
}
