use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::item::Match;
use crate::Value;

/// Name to value view of a match collection.
///
/// Names seen with several distinct values collapse into a [`Value::List`],
/// unless the dict was built with `first_value`.
#[derive(Debug, Clone, Default)]
pub struct MatchesDict {
    entries: Vec<(String, Value)>,
    multi: HashSet<String>,
    matches: HashMap<String, Vec<Arc<Match>>>,
    values_list: HashMap<String, Vec<Value>>,
}

impl MatchesDict {
    pub(crate) fn from_matches(sorted: &[Arc<Match>], details: bool, first_value: bool, enforce_list: bool) -> Self {
        let mut dict = Self::default();
        for m in sorted {
            let Some(name) = m.name.clone() else { continue };
            let value = m.value();
            if details {
                dict.matches.entry(name.clone()).or_default().push(Arc::clone(m));
            }
            crate::utils::push_unique(dict.values_list.entry(name.clone()).or_default(), value.clone());

            let Some(slot) = dict.entries.iter().position(|(key, _)| *key == name) else {
                let value = if enforce_list {
                    dict.multi.insert(name.clone());
                    Value::List(vec![value])
                } else {
                    value
                };
                dict.entries.push((name, value));
                continue;
            };
            if first_value {
                continue;
            }
            let current = &mut dict.entries[slot].1;
            if dict.multi.contains(&name) {
                if let Value::List(list) = current {
                    crate::utils::push_unique(list, value);
                }
            } else if *current != value {
                match current {
                    Value::List(list) => crate::utils::push_unique(list, value),
                    _ => {
                        let previous = std::mem::replace(current, Value::List(Vec::new()));
                        *current = Value::List(vec![previous, value]);
                    }
                }
                dict.multi.insert(name);
            }
        }
        dict
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(key, _)| key == name).map(|(_, value)| value)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Matches behind `name`; only filled when built with `details`.
    pub fn matches(&self, name: &str) -> &[Arc<Match>] {
        self.matches.get(name).map_or(&[], Vec::as_slice)
    }

    /// Every distinct value seen for `name`, in position order.
    pub fn values_list(&self, name: &str) -> &[Value] {
        self.values_list.get(name).map_or(&[], Vec::as_slice)
    }
}
