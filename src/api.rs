use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::chain::{Chain, ChainPart, Repeater};
use crate::engine::{ConflictSolver, PatternMetrics, PrivateRemover, Rule, Rules, RunMetrics, RunResult};
use crate::error::{Error, Result};
use crate::introspector::Introspection;
use crate::matches::{Match, Matches};
use crate::pattern::{Disabled, Found, Pattern, PatternOptions};
use crate::Context;

/// Option layers applied to patterns built through the facade.
#[derive(Debug, Clone, Default)]
struct Defaults {
    all: PatternOptions,
    string: PatternOptions,
    regex: PatternOptions,
    functional: PatternOptions,
    chain: PatternOptions,
}

#[derive(Debug, Clone, Copy)]
enum Kind {
    String,
    Regex,
    Functional,
}

impl Defaults {
    /// instance > kind defaults > engine defaults.
    fn apply(&self, kind: Kind, options: PatternOptions) -> PatternOptions {
        let typed = match kind {
            Kind::String => &self.string,
            Kind::Regex => &self.regex,
            Kind::Functional => &self.functional,
        };
        options.merge(typed).merge(&self.all)
    }

    /// instance > chain defaults > engine defaults.
    fn apply_chain(&self, options: PatternOptions) -> PatternOptions {
        options.merge(&self.chain).merge(&self.all)
    }
}

/// The engine facade: patterns, rules and nested child engines.
///
/// Built by value, then shared read-only across calls:
///
/// ```
/// use rebulk::{PatternOptions, Rebulk};
///
/// let rebulk = Rebulk::new()
///     .string(["lakers", "la"], PatternOptions::new().name("team"))
///     .unwrap();
/// let matches = rebulk.matches("the lakers are from la").unwrap();
/// let spans: Vec<_> = matches.sorted().iter().map(|m| m.span()).collect();
/// assert_eq!(spans, vec![(4, 10), (20, 22)]);
/// ```
#[derive(Clone)]
pub struct Rebulk {
    patterns: Vec<Pattern>,
    rules: Rules,
    children: Vec<Rebulk>,
    disabled: Option<Disabled>,
    defaults: Defaults,
}

impl Default for Rebulk {
    fn default() -> Self {
        Self::new()
    }
}

impl Rebulk {
    /// Empty engine with the built-in [`ConflictSolver`] and [`PrivateRemover`] rules.
    pub fn new() -> Self {
        let mut rules = Rules::new();
        rules.load(ConflictSolver).load(PrivateRemover);
        Self { rules, ..Self::without_default_rules() }
    }

    pub fn without_default_rules() -> Self {
        Self { patterns: Vec::new(), rules: Rules::new(), children: Vec::new(), disabled: None, defaults: Defaults::default() }
    }

    /// Disables the whole engine (patterns, rules and children) when `disabled` returns true.
    pub fn disabled(mut self, disabled: impl Fn(&Context) -> bool + Send + Sync + 'static) -> Self {
        self.disabled = Some(Arc::new(disabled));
        self
    }

    pub fn is_disabled(&self, context: &Context) -> bool {
        self.disabled.as_ref().is_some_and(|disabled| disabled(context))
    }

    /// Defaults for every pattern built afterward.
    pub fn defaults(mut self, options: PatternOptions) -> Self {
        self.defaults.all = options.merge(&self.defaults.all);
        self
    }

    pub fn string_defaults(mut self, options: PatternOptions) -> Self {
        self.defaults.string = options.merge(&self.defaults.string);
        self
    }

    pub fn regex_defaults(mut self, options: PatternOptions) -> Self {
        self.defaults.regex = options.merge(&self.defaults.regex);
        self
    }

    pub fn functional_defaults(mut self, options: PatternOptions) -> Self {
        self.defaults.functional = options.merge(&self.defaults.functional);
        self
    }

    pub fn chain_defaults(mut self, options: PatternOptions) -> Self {
        self.defaults.chain = options.merge(&self.defaults.chain);
        self
    }

    pub fn string<I, S>(mut self, literals: I, options: PatternOptions) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pattern = Pattern::string(literals, self.defaults.apply(Kind::String, options))?;
        self.patterns.push(pattern);
        Ok(self)
    }

    pub fn regex<I, S>(mut self, patterns: I, options: PatternOptions) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pattern = Pattern::regex(patterns, self.defaults.apply(Kind::Regex, options))?;
        self.patterns.push(pattern);
        Ok(self)
    }

    pub fn functional(
        mut self,
        function: impl Fn(&str, &Context) -> Vec<Found> + Send + Sync + 'static,
        options: PatternOptions,
    ) -> Self {
        let pattern = Pattern::functional(function, self.defaults.apply(Kind::Functional, options));
        self.patterns.push(pattern);
        self
    }

    /// Adds a prebuilt pattern as is; defaults are not applied.
    pub fn pattern(mut self, pattern: Pattern) -> Self {
        self.patterns.push(pattern);
        self
    }

    /// Starts a chain; [`ChainBuilder::close`] hands the engine back.
    pub fn chain(self, options: PatternOptions) -> ChainBuilder {
        let options = self.defaults.apply_chain(options);
        ChainBuilder { chain: Chain::new(options), rebulk: self }
    }

    pub fn rule(mut self, rule: impl Rule + 'static) -> Self {
        self.rules.load(rule);
        self
    }

    pub fn rules(mut self, rules: Rules) -> Self {
        self.rules.load_all(rules.iter().cloned());
        self
    }

    /// Nests `child`: its patterns and rules join this engine's unless it is disabled.
    pub fn rebulk(mut self, child: Rebulk) -> Self {
        self.children.push(child);
        self
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Own patterns, then those of every enabled child, recursively.
    pub fn effective_patterns(&self, context: &Context) -> Vec<&Pattern> {
        let mut patterns: Vec<&Pattern> = self.patterns.iter().collect();
        for child in self.children.iter().filter(|child| !child.is_disabled(context)) {
            patterns.extend(child.effective_patterns(context));
        }
        patterns
    }

    /// Own rules, then those of enabled children; a name already present is skipped.
    pub fn effective_rules(&self, context: &Context) -> Rules {
        let mut rules = self.rules.clone();
        for child in self.children.iter().filter(|child| !child.is_disabled(context)) {
            for rule in child.effective_rules(context).iter() {
                if !rules.contains_name(rule.name()) {
                    rules.load_shared(Arc::clone(rule));
                }
            }
        }
        rules
    }

    pub fn matches(&self, input: &str) -> Result<Matches> {
        self.matches_with(input, &Context::new())
    }

    /// Runs every effective pattern, then every effective rule.
    ///
    /// Only rule configuration errors (duplicates, cycles) can fail a run.
    pub fn matches_with(&self, input: &str, context: &Context) -> Result<Matches> {
        let input: Arc<str> = Arc::from(input);
        let mut matches = Matches::new(Arc::clone(&input));
        if self.is_disabled(context) {
            return Ok(matches);
        }
        for pattern in self.effective_patterns(context) {
            store(&mut matches, pattern.matches_in(&input, context))?;
        }
        self.effective_rules(context).execute_all_rules(&mut matches, context)?;
        Ok(matches)
    }

    /// Same as [`Rebulk::matches_with`], with timings.
    pub fn matches_with_metrics(&self, input: &str, context: &Context) -> Result<RunResult> {
        let total_start = Instant::now();
        let input: Arc<str> = Arc::from(input);
        let mut matches = Matches::new(Arc::clone(&input));
        let mut metrics = RunMetrics::default();
        if self.is_disabled(context) {
            metrics.total = total_start.elapsed();
            return Ok(RunResult { matches, metrics });
        }

        let patterns_start = Instant::now();
        for pattern in self.effective_patterns(context) {
            let started = Instant::now();
            let found = pattern.matches_in(&input, context);
            let produced = found.len();
            store(&mut matches, found)?;
            metrics.patterns.push(PatternMetrics { label: pattern.label(), duration: started.elapsed(), produced });
        }
        metrics.patterns_total = patterns_start.elapsed();

        let rules_start = Instant::now();
        let fired = self.effective_rules(context).execute_all_rules(&mut matches, context)?;
        metrics.rules = rules_start.elapsed();
        metrics.fired = fired.into_iter().map(|(name, _)| name).collect();
        metrics.total = total_start.elapsed();
        debug!(matches = matches.len(), markers = matches.markers.len(), elapsed = ?metrics.total, "run complete");
        Ok(RunResult { matches, metrics })
    }

    /// Properties every effective pattern and rule may produce.
    pub fn introspect(&self, context: &Context) -> Introspection {
        Introspection::new(self, context)
    }
}

impl fmt::Debug for Rebulk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rebulk")
            .field("patterns", &self.patterns)
            .field("rules", &self.rules)
            .field("children", &self.children)
            .field("disabled", &self.disabled.is_some())
            .finish()
    }
}

fn store(matches: &mut Matches, found: Vec<Match>) -> Result<()> {
    for m in found {
        if m.marker {
            matches.markers.push(m)?;
        } else {
            matches.push(m)?;
        }
    }
    Ok(())
}

/// Builder for a chain under construction; parts take the usual kind defaults.
///
/// ```
/// use rebulk::{PatternOptions, Rebulk};
///
/// let rebulk = Rebulk::new()
///     .chain(PatternOptions::new().name("episode"))
///     .string(["E"], PatternOptions::new())?
///     .hidden()
///     .regex([r"\d+"], PatternOptions::new())?
///     .repeater("+")?
///     .close()?;
/// let matches = rebulk.matches("S01E02")?;
/// assert_eq!(matches.named("episode")[0].raw(), "02");
/// # Ok::<(), rebulk::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ChainBuilder {
    rebulk: Rebulk,
    chain: Chain,
}

impl ChainBuilder {
    /// Vetoes further groups once it returns true for the matches accumulated so far.
    pub fn breaker(mut self, breaker: impl Fn(&[Match]) -> bool + Send + Sync + 'static) -> Self {
        self.chain.set_breaker(Arc::new(breaker));
        self
    }

    pub fn string<I, S>(mut self, literals: I, options: PatternOptions) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pattern = Pattern::string(literals, self.rebulk.defaults.apply(Kind::String, options))?;
        self.chain.push(ChainPart::new(pattern));
        Ok(self)
    }

    pub fn regex<I, S>(mut self, patterns: I, options: PatternOptions) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pattern = Pattern::regex(patterns, self.rebulk.defaults.apply(Kind::Regex, options))?;
        self.chain.push(ChainPart::new(pattern));
        Ok(self)
    }

    pub fn functional(
        mut self,
        function: impl Fn(&str, &Context) -> Vec<Found> + Send + Sync + 'static,
        options: PatternOptions,
    ) -> Self {
        let pattern = Pattern::functional(function, self.rebulk.defaults.apply(Kind::Functional, options));
        self.chain.push(ChainPart::new(pattern));
        self
    }

    pub fn pattern(mut self, pattern: Pattern) -> Self {
        self.chain.push(ChainPart::new(pattern));
        self
    }

    /// Sets the repeater of the last part from its textual form (`"?"`, `"{2,3}"`, ...).
    pub fn repeater(self, repeater: &str) -> Result<Self> {
        let repeater: Repeater = repeater.parse()?;
        self.repeat(repeater)
    }

    pub fn repeat(mut self, repeater: Repeater) -> Result<Self> {
        let part = self.chain.last_part_mut().ok_or(Error::EmptyChain)?;
        *part = part.clone().repeat(repeater);
        Ok(self)
    }

    /// Hides the last part from the aggregate.
    pub fn hidden(mut self) -> Self {
        if let Some(part) = self.chain.last_part_mut() {
            *part = part.clone().hidden();
        }
        self
    }

    pub fn close(mut self) -> Result<Rebulk> {
        if self.chain.parts().is_empty() {
            return Err(Error::EmptyChain);
        }
        self.rebulk.patterns.push(Pattern::Chain(self.chain));
        Ok(self.rebulk)
    }
}

#[cfg(test)]
mod tests;
