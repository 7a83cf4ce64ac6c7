use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use itertools::Itertools;
use tracing::{debug, trace};

use super::toposort::toposort;
use crate::error::{Error, Result};
use crate::introspector::Properties;
use crate::matches::{Match, Matches};
use crate::Context;

/// Priority of rules that must run before any user rule.
pub const PRE_PROCESS: i32 = 2048;
/// Priority of rules that must run after every user rule.
pub const POST_PROCESS: i32 = -2048;

/// What a rule condition hands to its consequences.
#[derive(Debug, Clone)]
pub enum Response {
    /// Targets shared by every consequence.
    Matches(Vec<Arc<Match>>),
    /// One target list per consequence, in order.
    PerConsequence(Vec<Vec<Arc<Match>>>),
    /// The rule fired but carries no target; only a custom `then` reacts to it.
    Triggered,
}

impl Response {
    pub fn is_truthy(&self) -> bool {
        match self {
            Response::Matches(matches) => !matches.is_empty(),
            Response::PerConsequence(lists) => lists.iter().any(|l| !l.is_empty()),
            Response::Triggered => true,
        }
    }

    pub fn matches(&self) -> Vec<Arc<Match>> {
        match self {
            Response::Matches(matches) => matches.clone(),
            Response::PerConsequence(lists) => lists.iter().flatten().cloned().collect(),
            Response::Triggered => Vec::new(),
        }
    }
}

impl From<Vec<Arc<Match>>> for Response {
    fn from(matches: Vec<Arc<Match>>) -> Self {
        Response::Matches(matches)
    }
}

impl From<Arc<Match>> for Response {
    fn from(m: Arc<Match>) -> Self {
        Response::Matches(vec![m])
    }
}

/// Built-in mutations a rule may declare instead of writing its own `then`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Consequence {
    RemoveMatch,
    /// Appends targets that are not already present, optionally renamed.
    AppendMatch(Option<String>),
    RenameMatch(String),
    AppendTags(Vec<String>),
    RemoveTags(Vec<String>),
}

impl Consequence {
    /// Applies the consequence; returns the matches it actually removed or added.
    pub fn apply(&self, matches: &mut Matches, targets: Vec<Arc<Match>>) -> Result<Vec<Arc<Match>>> {
        match self {
            Consequence::RemoveMatch => Ok(remove_all(matches, targets)),
            Consequence::AppendMatch(name) => {
                let mut appended = Vec::new();
                for target in targets {
                    let target = match name {
                        Some(name) => Arc::new(modified(target, |m| m.name = Some(name.clone()))),
                        None => target,
                    };
                    if matches.contains(&target) || matches.contains_match(&target) {
                        continue;
                    }
                    appended.push(matches.push_arc(target)?);
                }
                Ok(appended)
            }
            Consequence::RenameMatch(name) => {
                replace_all(matches, targets, |m| m.name = Some(name.clone()))
            }
            Consequence::AppendTags(tags) => replace_all(matches, targets, |m| {
                for tag in tags {
                    m.add_tag(tag.clone());
                }
            }),
            Consequence::RemoveTags(tags) => replace_all(matches, targets, |m| {
                for tag in tags {
                    m.remove_tag(tag);
                }
            }),
        }
    }
}

fn remove_all(matches: &mut Matches, targets: Vec<Arc<Match>>) -> Vec<Arc<Match>> {
    targets.into_iter().filter(|m| matches.remove(m)).collect()
}

fn modified(target: Arc<Match>, change: impl FnOnce(&mut Match)) -> Match {
    let mut m = Arc::unwrap_or_clone(target);
    change(&mut m);
    m
}

/// Remove, modify, re-append: members are immutable once indexed.
fn replace_all(
    matches: &mut Matches,
    targets: Vec<Arc<Match>>,
    change: impl Fn(&mut Match),
) -> Result<Vec<Arc<Match>>> {
    let removed = remove_all(matches, targets);
    removed.into_iter().map(|m| matches.push(modified(m, &change))).collect()
}

/// Applies `consequences` to the targets carried by `response`.
pub(crate) fn apply_consequences(
    consequences: &[Consequence],
    matches: &mut Matches,
    response: Response,
) -> Result<()> {
    match response {
        Response::Matches(targets) => {
            for consequence in consequences {
                consequence.apply(matches, targets.clone())?;
            }
        }
        Response::PerConsequence(lists) => {
            for (consequence, targets) in consequences.iter().zip(lists) {
                consequence.apply(matches, targets)?;
            }
        }
        Response::Triggered => {}
    }
    Ok(())
}

/// A post-processing step over the match collection.
///
/// Identity is the rule name: two rules with the same name in the same
/// priority group are a configuration error, and dependencies refer to names.
pub trait Rule: Send + Sync {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Higher runs first.
    fn priority(&self) -> i32 {
        0
    }

    /// Names of the rules (same priority) that must run before this one.
    fn dependency(&self) -> Vec<String> {
        Vec::new()
    }

    fn enabled(&self, _context: &Context) -> bool {
        true
    }

    fn consequences(&self) -> Vec<Consequence> {
        Vec::new()
    }

    fn properties(&self) -> Properties {
        Properties::new()
    }

    /// Condition. `None` or a falsy response means the rule does not fire.
    fn when(&self, matches: &Matches, context: &Context) -> Option<Response>;

    fn then(&self, matches: &mut Matches, response: Response, _context: &Context) -> Result<()> {
        apply_consequences(&self.consequences(), matches, response)
    }
}

/// Name a rule type gets from the default [`Rule::name`].
pub fn rule_name<R: Rule>() -> &'static str {
    std::any::type_name::<R>()
}

type WhenFn = Arc<dyn Fn(&Matches, &Context) -> Option<Response> + Send + Sync>;
type ThenFn = Arc<dyn Fn(&mut Matches, Response, &Context) -> Result<()> + Send + Sync>;
type EnabledFn = Arc<dyn Fn(&Context) -> bool + Send + Sync>;

/// Closure-backed rule, usually built through the `rule!` macro.
#[derive(Clone)]
pub struct FnRule {
    name: String,
    priority: i32,
    dependency: Vec<String>,
    consequences: Vec<Consequence>,
    properties: Properties,
    enabled: Option<EnabledFn>,
    when: WhenFn,
    then: Option<ThenFn>,
}

impl FnRule {
    pub fn new(
        name: impl Into<String>,
        when: impl Fn(&Matches, &Context) -> Option<Response> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            priority: 0,
            dependency: Vec::new(),
            consequences: Vec::new(),
            properties: Properties::new(),
            enabled: None,
            when: Arc::new(when),
            then: None,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_dependency(mut self, dependency: Vec<String>) -> Self {
        self.dependency = dependency;
        self
    }

    pub fn with_consequences(mut self, consequences: Vec<Consequence>) -> Self {
        self.consequences = consequences;
        self
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    pub fn enabled_when(mut self, enabled: impl Fn(&Context) -> bool + Send + Sync + 'static) -> Self {
        self.enabled = Some(Arc::new(enabled));
        self
    }

    pub fn with_then(
        mut self,
        then: impl Fn(&mut Matches, Response, &Context) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.then = Some(Arc::new(then));
        self
    }
}

impl Rule for FnRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn dependency(&self) -> Vec<String> {
        self.dependency.clone()
    }

    fn enabled(&self, context: &Context) -> bool {
        self.enabled.as_ref().is_none_or(|enabled| enabled(context))
    }

    fn consequences(&self) -> Vec<Consequence> {
        self.consequences.clone()
    }

    fn properties(&self) -> Properties {
        self.properties.clone()
    }

    fn when(&self, matches: &Matches, context: &Context) -> Option<Response> {
        (self.when)(matches, context)
    }

    fn then(&self, matches: &mut Matches, response: Response, context: &Context) -> Result<()> {
        match &self.then {
            Some(then) => then(matches, response, context),
            None => apply_consequences(&self.consequences, matches, response),
        }
    }
}

impl fmt::Debug for FnRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnRule")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("dependency", &self.dependency)
            .field("consequences", &self.consequences)
            .finish_non_exhaustive()
    }
}

type Batch<'a> = Vec<&'a Arc<dyn Rule>>;

/// Ordered rule collection.
#[derive(Clone, Default)]
pub struct Rules {
    rules: Vec<Arc<dyn Rule>>,
}

impl Rules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, rule: impl Rule + 'static) -> &mut Self {
        self.rules.push(Arc::new(rule));
        self
    }

    pub fn load_shared(&mut self, rule: Arc<dyn Rule>) -> &mut Self {
        self.rules.push(rule);
        self
    }

    pub fn load_all(&mut self, rules: impl IntoIterator<Item = Arc<dyn Rule>>) -> &mut Self {
        self.rules.extend(rules);
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<dyn Rule>> {
        self.rules.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.rules.iter().any(|rule| rule.name() == name)
    }

    /// Runs every rule against `matches`; returns the rules that fired with their responses.
    ///
    /// Fails before running anything when a priority group holds duplicate
    /// names or a dependency cycle.
    pub fn execute_all_rules(&self, matches: &mut Matches, context: &Context) -> Result<Vec<(String, Response)>> {
        let plan = self.schedule()?;
        let mut fired = Vec::new();
        for (priority, batches) in plan {
            for batch in batches {
                trace!(priority, rules = batch.len(), "running independent rules");
                for rule in batch {
                    if let Some(response) = execute_rule(rule.as_ref(), matches, context)? {
                        fired.push((rule.name().to_string(), response));
                    }
                }
            }
        }
        Ok(fired)
    }

    /// Priority groups (highest first), each as toposorted batches.
    fn schedule(&self) -> Result<Vec<(i32, Vec<Batch<'_>>)>> {
        let mut ordered: Vec<(usize, &Arc<dyn Rule>)> = self.rules.iter().enumerate().collect();
        ordered.sort_by_key(|(_, rule)| Reverse(rule.priority()));

        let mut plan = Vec::new();
        for (priority, group) in &ordered.into_iter().chunk_by(|(_, rule)| rule.priority()) {
            let group: Vec<(usize, &Arc<dyn Rule>)> = group.collect();
            plan.push((priority, order_group(priority, &group)?));
        }
        Ok(plan)
    }
}

fn order_group<'a>(priority: i32, group: &[(usize, &'a Arc<dyn Rule>)]) -> Result<Vec<Batch<'a>>> {
    let mut by_name: HashMap<&str, usize> = HashMap::new();
    for (index, rule) in group {
        if by_name.insert(rule.name(), *index).is_some() {
            return Err(Error::DuplicateRule { name: rule.name().to_string(), priority });
        }
    }

    let graph: BTreeMap<usize, BTreeSet<usize>> = group
        .iter()
        .map(|(index, rule)| {
            let deps = rule.dependency().iter().filter_map(|dep| by_name.get(dep.as_str()).copied()).collect();
            (*index, deps)
        })
        .collect();
    let by_index: HashMap<usize, &'a Arc<dyn Rule>> = group.iter().map(|(index, rule)| (*index, *rule)).collect();

    let batches = toposort(&graph).map_err(|cycle| Error::CyclicDependency {
        priority,
        rules: cycle.iter().filter_map(|index| by_index.get(index)).map(|rule| rule.name().to_string()).collect(),
    })?;
    Ok(batches.into_iter().map(|batch| batch.iter().filter_map(|index| by_index.get(index).copied()).collect()).collect())
}

fn execute_rule(rule: &dyn Rule, matches: &mut Matches, context: &Context) -> Result<Option<Response>> {
    if !rule.enabled(context) {
        trace!(rule = rule.name(), "rule disabled");
        return Ok(None);
    }
    let Some(response) = rule.when(matches, context).filter(Response::is_truthy) else {
        trace!(rule = rule.name(), "rule condition not met");
        return Ok(None);
    };
    debug!(rule = rule.name(), targets = response.matches().len(), "rule fired");
    rule.then(matches, response.clone(), context)?;
    Ok(Some(response))
}

impl fmt::Debug for Rules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
