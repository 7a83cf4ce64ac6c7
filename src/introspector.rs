//! Static description of what an engine can produce.
//!
//! Properties are inferred from pattern definitions without running them:
//! string literals and value overrides are known candidates, regex groups and
//! functional patterns only tell the name (`None` stands for "any value").
//! Explicit `properties` on a pattern or rule replace the inference.

use std::collections::BTreeMap;

use crate::api::Rebulk;
use crate::pattern::{Node, Pattern, PatternOptions};
use crate::{Context, Value};

/// Property name to candidate values; `None` means the value is not known statically.
pub type Properties = BTreeMap<String, Vec<Option<Value>>>;

#[derive(Debug, Clone)]
pub struct PatternIntrospection {
    pub label: String,
    pub properties: Properties,
}

#[derive(Debug, Clone)]
pub struct RuleIntrospection {
    pub name: String,
    pub properties: Properties,
}

#[derive(Debug, Clone, Default)]
pub struct Introspection {
    pub patterns: Vec<PatternIntrospection>,
    pub rules: Vec<RuleIntrospection>,
}

impl Introspection {
    /// Describes every pattern and rule of `rebulk` enabled under `context`.
    pub fn new(rebulk: &Rebulk, context: &Context) -> Self {
        if rebulk.is_disabled(context) {
            return Self::default();
        }
        let patterns = rebulk
            .effective_patterns(context)
            .into_iter()
            .filter(|pattern| !pattern.is_disabled(context))
            .map(|pattern| PatternIntrospection { label: pattern.label(), properties: pattern_properties(pattern) })
            .collect();
        let rules = rebulk
            .effective_rules(context)
            .iter()
            .filter(|rule| rule.enabled(context))
            .map(|rule| RuleIntrospection { name: rule.name().to_string(), properties: rule.properties() })
            .filter(|rule| !rule.properties.is_empty())
            .collect();
        Self { patterns, rules }
    }

    /// Union of all pattern and rule properties, candidates deduplicated.
    pub fn properties(&self) -> Properties {
        let mut merged = Properties::new();
        let all = self.patterns.iter().map(|p| &p.properties).chain(self.rules.iter().map(|r| &r.properties));
        for properties in all {
            extend(&mut merged, properties);
        }
        merged
    }
}

fn extend(target: &mut Properties, source: &Properties) {
    for (name, values) in source {
        let entry = target.entry(name.clone()).or_default();
        for value in values {
            if !entry.contains(value) {
                entry.push(value.clone());
            }
        }
    }
}

fn add(target: &mut Properties, name: &str, value: Option<Value>) {
    let entry = target.entry(name.to_string()).or_default();
    if !entry.contains(&value) {
        entry.push(value);
    }
}

fn value_override(options: &PatternOptions, name: Option<&str>, node: Node) -> Option<Value> {
    options.value.lookup(name, node).cloned()
}

fn pattern_properties(pattern: &Pattern) -> Properties {
    let options = pattern.options();
    if let Some(declared) = &options.properties {
        return declared.clone();
    }
    let mut properties = Properties::new();
    let name = options.name.as_deref();

    match pattern {
        Pattern::String(p) => {
            if let Some(name) = name {
                match value_override(options, Some(name), Node::Parent) {
                    Some(value) => add(&mut properties, name, Some(value)),
                    None => {
                        for literal in p.literals() {
                            add(&mut properties, name, Some(Value::from(literal.as_str())));
                        }
                    }
                }
            }
        }
        Pattern::Regex(p) => {
            if let Some(name) = name {
                add(&mut properties, name, value_override(options, Some(name), Node::Parent));
            }
            for group in p.group_names() {
                add(&mut properties, group, value_override(options, Some(group), Node::Child));
            }
        }
        Pattern::Functional(_) => {
            if let Some(name) = name {
                add(&mut properties, name, value_override(options, Some(name), Node::Parent));
            }
        }
        Pattern::Chain(chain) => {
            for part in chain.parts().iter().filter(|part| !part.is_hidden()) {
                extend(&mut properties, &pattern_properties(part.pattern()));
            }
            if let Some(name) = name {
                add(&mut properties, name, value_override(options, Some(name), Node::Parent));
            }
        }
    }
    properties
}
