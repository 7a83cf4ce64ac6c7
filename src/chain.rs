//! Chains: ordered sequences of sub-patterns with repetition bounds.
//!
//! A chain walks its parts left to right. The first part may match anywhere
//! from the current offset; each following part must start exactly where the
//! previous one stopped. Only contiguous repetitions of a part count toward
//! its repeater, and exceeding its upper bound fails the attempt. A complete
//! walk yields one aggregate match spanning every contributing part match,
//! which then goes through the regular pipeline.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::trace;

use crate::error::{Error, Result};
use crate::matches::Match;
use crate::pattern::{Pattern, PatternOptions, PatternRun};
use crate::utils::next_boundary;
use crate::Context;

/// Rejects a candidate group when it returns true, given every match accepted so far plus the candidate's.
pub type ChainBreaker = Arc<dyn Fn(&[Match]) -> bool + Send + Sync>;

/// Repetition bounds of a chain part; `end: None` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Repeater {
    pub start: usize,
    pub end: Option<usize>,
}

impl Repeater {
    pub const ONCE: Repeater = Repeater { start: 1, end: Some(1) };

    pub fn exactly(count: usize) -> Self {
        Self { start: count, end: Some(count) }
    }

    pub fn between(start: usize, end: Option<usize>) -> Self {
        Self { start, end }
    }
}

impl Default for Repeater {
    fn default() -> Self {
        Self::ONCE
    }
}

impl FromStr for Repeater {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let text = s.trim();
        if let Ok(count) = text.parse::<usize>() {
            return Ok(Repeater::exactly(count));
        }
        match text {
            "?" => return Ok(Repeater { start: 0, end: Some(1) }),
            "*" => return Ok(Repeater { start: 0, end: None }),
            "+" => return Ok(Repeater { start: 1, end: None }),
            _ => {}
        }
        let invalid = || Error::InvalidRepeater(s.to_string());
        let caps = regex!(r"^\{\s*(\d*)\s*(,?)\s*(\d*)\s*\}$").captures(text).ok_or_else(invalid)?;
        let bound = |index: usize| -> Result<Option<usize>> {
            match caps.get(index).map(|m| m.as_str()).filter(|m| !m.is_empty()) {
                Some(digits) => digits.parse().map(Some).map_err(|_| invalid()),
                None => Ok(None),
            }
        };
        let (low, high) = (bound(1)?, bound(3)?);
        let comma = caps.get(2).is_some_and(|m| !m.as_str().is_empty());
        let repeater = match (low, comma, high) {
            (Some(count), false, None) => Repeater::exactly(count),
            (None, _, None) | (Some(_), false, Some(_)) => return Err(invalid()),
            (low, _, high) => Repeater { start: low.unwrap_or(0), end: high },
        };
        if repeater.end.is_some_and(|end| end < repeater.start) {
            return Err(invalid());
        }
        Ok(repeater)
    }
}

impl fmt::Display for Repeater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.start, self.end) {
            (start, Some(end)) if start == end => write!(f, "{{{start}}}"),
            (start, Some(end)) => write!(f, "{{{start},{end}}}"),
            (start, None) => write!(f, "{{{start},}}"),
        }
    }
}

/// One step of a chain.
#[derive(Debug, Clone)]
pub struct ChainPart {
    pattern: Pattern,
    repeater: Repeater,
    hidden: bool,
}

impl ChainPart {
    pub fn new(pattern: Pattern) -> Self {
        Self { pattern, repeater: Repeater::ONCE, hidden: false }
    }

    pub fn repeat(mut self, repeater: Repeater) -> Self {
        self.repeater = repeater;
        self
    }

    /// Matched and consumed, but left out of the aggregate.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn repeater(&self) -> Repeater {
        self.repeater
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Raw repetitions kept at `offset`, each with its processed matches.
    ///
    /// More contiguous repetitions than the repeater allows invalidate the
    /// walk; the error holds the end of the first repetition.
    fn select(
        &self,
        is_first: bool,
        run: PatternRun,
        input: &Arc<str>,
        offset: usize,
    ) -> std::result::Result<Vec<(Match, Vec<Match>)>, usize> {
        let PatternRun { mut matches, mut raw } = run;
        for m in matches.iter_mut().chain(raw.iter_mut()) {
            m.shift(offset, input);
        }
        raw.sort_by_key(|m| (m.raw_start(), m.raw_end(), m.match_index));
        if !is_first && raw.first().is_some_and(|m| m.raw_start() != offset) {
            return Ok(Vec::new());
        }
        let contiguous = if raw.is_empty() {
            0
        } else {
            1 + raw.windows(2).take_while(|pair| pair[0].raw_end() == pair[1].raw_start()).count()
        };
        raw.truncate(contiguous);
        if let Some(first) = raw.first().filter(|_| self.repeater.end.is_some_and(|end| contiguous > end)) {
            return Err(first.raw_end());
        }
        Ok(raw
            .into_iter()
            .map(|r| {
                let index = r.match_index;
                let group = matches.iter().filter(|m| m.match_index == index).cloned().collect();
                (r, group)
            })
            .collect())
    }
}

struct Group {
    part: usize,
    matches: Vec<Match>,
}

enum Walk {
    Exhausted,
    Invalid { resume: usize },
    Complete { groups: Vec<Group>, end: usize },
}

/// Sequence pattern built from [`ChainPart`]s.
#[derive(Clone)]
pub struct Chain {
    parts: Vec<ChainPart>,
    options: PatternOptions,
    breaker: Option<ChainBreaker>,
}

impl Chain {
    pub fn new(options: PatternOptions) -> Self {
        Self { parts: Vec::new(), options, breaker: None }
    }

    pub fn with_breaker(mut self, breaker: impl Fn(&[Match]) -> bool + Send + Sync + 'static) -> Self {
        self.breaker = Some(Arc::new(breaker));
        self
    }

    pub fn part(mut self, part: ChainPart) -> Self {
        self.parts.push(part);
        self
    }

    pub fn push(&mut self, part: ChainPart) {
        self.parts.push(part);
    }

    pub fn parts(&self) -> &[ChainPart] {
        &self.parts
    }

    pub(crate) fn last_part_mut(&mut self) -> Option<&mut ChainPart> {
        self.parts.last_mut()
    }

    pub(crate) fn set_breaker(&mut self, breaker: ChainBreaker) {
        self.breaker = Some(breaker);
    }

    pub fn options(&self) -> &PatternOptions {
        &self.options
    }

    pub(crate) fn run(&self, input: &Arc<str>, context: &Context) -> PatternRun {
        let mut out = PatternRun::default();
        let mut offset = 0;
        while offset < input.len() {
            match self.walk(input, offset, context) {
                Walk::Exhausted => break,
                Walk::Invalid { resume } => {
                    trace!(offset, resume, "chain attempt rejected");
                    offset = resume.max(next_boundary(input, offset));
                }
                Walk::Complete { groups, end } => {
                    offset = if end > offset { end } else { next_boundary(input, offset) };
                    let match_index = out.raw.len();
                    let Some(aggregate) = self.aggregate(&groups, input, match_index) else { continue };
                    out.raw.push(aggregate.clone());
                    if let Some(mut emitted) = self.finish(aggregate, groups, input, match_index, context) {
                        for m in &mut emitted {
                            m.match_index = match_index;
                        }
                        out.matches.extend(emitted);
                    }
                }
            }
        }
        if let Some(post) = &self.options.post_processor {
            out.matches = post(out.matches, context);
        }
        out
    }

    fn walk(&self, input: &Arc<str>, offset: usize, context: &Context) -> Walk {
        let mut cursor = offset;
        let mut found = false;
        let mut resume = None;
        let mut groups: Vec<Group> = Vec::new();

        for (index, part) in self.parts.iter().enumerate() {
            let Some(remaining) = input.get(cursor..) else { break };
            let run = if part.pattern.is_disabled(context) {
                PatternRun::default()
            } else {
                part.pattern.run(&Arc::from(remaining), context)
            };
            let selected = match part.select(index == 0, run, input, cursor) {
                Ok(selected) => selected,
                Err(first_end) => {
                    let resume = if index == 0 { Some(first_end) } else { resume };
                    trace!(part = index, repeater = %part.repeater, "too many repetitions");
                    return Walk::Invalid { resume: resume.unwrap_or_else(|| next_boundary(input, offset)) };
                }
            };
            if index == 0 {
                resume = selected.first().map(|(raw, _)| raw.raw_end());
            }
            if selected.len() < part.repeater.start {
                if index == 0 && selected.is_empty() {
                    return Walk::Exhausted;
                }
                return Walk::Invalid { resume: resume.unwrap_or_else(|| next_boundary(input, offset)) };
            }
            for (raw, matches) in selected {
                found = true;
                cursor = raw.raw_end();
                if part.hidden || matches.is_empty() {
                    continue;
                }
                if self.accepts(&groups, &matches) {
                    groups.push(Group { part: index, matches });
                }
            }
        }

        if !found {
            return Walk::Exhausted;
        }
        Walk::Complete { groups, end: cursor }
    }

    fn accepts(&self, groups: &[Group], candidate: &[Match]) -> bool {
        let Some(breaker) = &self.breaker else { return true };
        let mut seen: Vec<Match> = groups.iter().flat_map(|g| g.matches.iter().cloned()).collect();
        seen.extend(candidate.iter().cloned());
        !breaker(&seen)
    }

    fn aggregate(&self, groups: &[Group], input: &Arc<str>, match_index: usize) -> Option<Match> {
        let all: Vec<&Match> = groups.iter().flat_map(|g| g.matches.iter()).collect();
        let start = all.iter().map(|m| m.start).min()?;
        let end = all.iter().map(|m| m.end).max()?;
        let mut aggregate = self.options.new_match(start, end, input);
        aggregate.match_index = match_index;
        for m in all {
            aggregate.children.extend(m.children.iter().cloned());
            if !aggregate.children.contains(m) {
                let mut part_match = m.clone();
                part_match.children.clear();
                part_match.parent = None;
                aggregate.children.push(part_match);
            }
        }
        Some(aggregate)
    }

    /// Processes the aggregate; on rejection, drops trailing repetitions of
    /// the last contributing part one by one and retries.
    fn finish(
        &self,
        aggregate: Match,
        mut groups: Vec<Group>,
        input: &Arc<str>,
        match_index: usize,
        context: &Context,
    ) -> Option<Vec<Match>> {
        let last_part = groups.last()?.part;
        let mut candidate = aggregate;
        loop {
            if let Some(emitted) = self.options.process(candidate, context) {
                return Some(emitted);
            }
            match groups.last() {
                Some(group) if group.part == last_part && groups.len() > 1 => {
                    groups.pop();
                }
                _ => return None,
            }
            candidate = self.aggregate(&groups, input, match_index)?;
            trace!(span = ?candidate.span(), "retrying chain without its last repetition");
        }
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("parts", &self.parts)
            .field("options", &self.options)
            .field("breaker", &self.breaker.is_some())
            .finish()
    }
}
