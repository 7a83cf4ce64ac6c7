use std::collections::HashMap;
use std::hash::Hash;
use std::ops::Index;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use super::dict::MatchesDict;
use super::item::Match;
use crate::utils::{contains_ptr, is_sep, push_unique};

#[derive(Debug, Clone, Default)]
struct Indexes {
    by_name: HashMap<String, Vec<Arc<Match>>>,
    by_tag: HashMap<String, Vec<Arc<Match>>>,
    by_start: HashMap<usize, Vec<Arc<Match>>>,
    by_end: HashMap<usize, Vec<Arc<Match>>>,
    by_position: HashMap<usize, Vec<Arc<Match>>>,
}

impl Indexes {
    fn build(items: &[Arc<Match>]) -> Self {
        let mut indexes = Self::default();
        for item in items {
            indexes.insert(item);
        }
        indexes
    }

    fn insert(&mut self, m: &Arc<Match>) {
        if let Some(name) = &m.name {
            self.by_name.entry(name.clone()).or_default().push(Arc::clone(m));
        }
        for tag in &m.tags {
            self.by_tag.entry(tag.clone()).or_default().push(Arc::clone(m));
        }
        self.by_start.entry(m.start).or_default().push(Arc::clone(m));
        self.by_end.entry(m.end).or_default().push(Arc::clone(m));
        for position in m.start..m.end {
            self.by_position.entry(position).or_default().push(Arc::clone(m));
        }
    }

    fn remove(&mut self, m: &Arc<Match>) {
        if let Some(name) = &m.name {
            detach(&mut self.by_name, name.clone(), m);
        }
        for tag in &m.tags {
            detach(&mut self.by_tag, tag.clone(), m);
        }
        detach(&mut self.by_start, m.start, m);
        detach(&mut self.by_end, m.end, m);
        for position in m.start..m.end {
            detach(&mut self.by_position, position, m);
        }
    }
}

fn detach<K: Hash + Eq>(map: &mut HashMap<K, Vec<Arc<Match>>>, key: K, m: &Arc<Match>) {
    if let Some(list) = map.get_mut(&key) {
        list.retain(|x| !Arc::ptr_eq(x, m));
        if list.is_empty() {
            map.remove(&key);
        }
    }
}

fn lookup<K: Hash + Eq>(map: &HashMap<K, Vec<Arc<Match>>>, key: &K) -> Vec<Arc<Match>> {
    map.get(key).cloned().unwrap_or_default()
}

/// Ordered match list over one input string, with lazily built lookup indexes.
///
/// Indexes are built on the first query and kept in sync incrementally by
/// every later insertion and removal. Membership is identity based: two equal
/// matches held by different `Arc`s are distinct members.
#[derive(Debug, Clone)]
pub struct MatchSet {
    input: Arc<str>,
    items: Vec<Arc<Match>>,
    indexes: OnceCell<Indexes>,
    max_end: usize,
}

impl MatchSet {
    pub(crate) fn new(input: Arc<str>) -> Self {
        let max_end = input.len();
        Self { input, items: Vec::new(), indexes: OnceCell::new(), max_end }
    }

    pub fn input(&self) -> &Arc<str> {
        &self.input
    }

    pub fn input_string(&self) -> &str {
        &self.input
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<Match>> {
        self.items.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Match>> {
        self.items.get(index)
    }

    pub fn as_slice(&self) -> &[Arc<Match>] {
        &self.items
    }

    /// Identity membership.
    pub fn contains(&self, m: &Arc<Match>) -> bool {
        contains_ptr(&self.items, m)
    }

    /// Equality membership.
    pub fn contains_match(&self, m: &Match) -> bool {
        self.items.iter().any(|x| x.as_ref() == m)
    }

    pub fn position(&self, m: &Arc<Match>) -> Option<usize> {
        self.items.iter().position(|x| Arc::ptr_eq(x, m))
    }

    fn indexes(&self) -> &Indexes {
        self.indexes.get_or_init(|| Indexes::build(&self.items))
    }

    pub(crate) fn insert_arc(&mut self, index: usize, m: Arc<Match>) {
        self.max_end = self.max_end.max(m.end);
        if let Some(indexes) = self.indexes.get_mut() {
            indexes.insert(&m);
        }
        let index = index.min(self.items.len());
        self.items.insert(index, m);
    }

    pub(crate) fn push_arc(&mut self, m: Arc<Match>) {
        let len = self.items.len();
        self.insert_arc(len, m);
    }

    pub(crate) fn remove(&mut self, m: &Arc<Match>) -> bool {
        match self.position(m) {
            Some(index) => {
                self.remove_at(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove_at(&mut self, index: usize) -> Option<Arc<Match>> {
        if index >= self.items.len() {
            return None;
        }
        let removed = self.items.remove(index);
        if let Some(indexes) = self.indexes.get_mut() {
            indexes.remove(&removed);
        }
        Some(removed)
    }

    pub fn named(&self, name: &str) -> Vec<Arc<Match>> {
        self.indexes().by_name.get(name).cloned().unwrap_or_default()
    }

    pub fn tagged(&self, tag: &str) -> Vec<Arc<Match>> {
        self.indexes().by_tag.get(tag).cloned().unwrap_or_default()
    }

    pub fn starting(&self, start: usize) -> Vec<Arc<Match>> {
        lookup(&self.indexes().by_start, &start)
    }

    pub fn ending(&self, end: usize) -> Vec<Arc<Match>> {
        lookup(&self.indexes().by_end, &end)
    }

    /// Matches covering byte `position`.
    pub fn at_index(&self, position: usize) -> Vec<Arc<Match>> {
        lookup(&self.indexes().by_position, &position)
    }

    /// Matches covering the first or the last byte of the span.
    pub fn at_span(&self, (start, end): (usize, usize)) -> Vec<Arc<Match>> {
        let mut found = self.at_index(start);
        if end > start + 1 {
            for m in self.at_index(end - 1) {
                if !contains_ptr(&found, &m) {
                    found.push(m);
                }
            }
        }
        found
    }

    pub fn at_match(&self, m: &Match) -> Vec<Arc<Match>> {
        self.at_span(m.span())
    }

    /// Matches ending at the closest position before `m`.
    pub fn previous(&self, m: &Match) -> Vec<Arc<Match>> {
        (0..=m.start).rev().map(|position| self.ending(position)).find(|found| !found.is_empty()).unwrap_or_default()
    }

    /// Matches starting at the closest position after `m`.
    pub fn next(&self, m: &Match) -> Vec<Arc<Match>> {
        (m.end..self.max_end())
            .map(|position| self.starting(position))
            .find(|found| !found.is_empty())
            .unwrap_or_default()
    }

    /// Matches intersecting `[start, end)`, sorted by position.
    pub fn range(&self, start: usize, end: Option<usize>) -> Vec<Arc<Match>> {
        let end = end.map_or(self.max_end(), |e| e.min(self.max_end()));
        self.sorted().into_iter().filter(|m| m.start < end && m.end > start).collect()
    }

    /// Matches sharing at least one byte with `m`, `m` itself excluded by identity.
    pub fn conflicting(&self, m: &Match) -> Vec<Arc<Match>> {
        let mut found: Vec<Arc<Match>> = Vec::new();
        for position in m.start..m.end {
            for other in self.at_index(position) {
                if !std::ptr::eq(other.as_ref(), m) && !contains_ptr(&found, &other) {
                    found.push(other);
                }
            }
        }
        found
    }

    /// Walks left from `position`, collecting matches accepted by `predicate`;
    /// uncovered characters stop the walk unless they belong to `seps`.
    pub fn chain_before(&self, position: usize, seps: &str, predicate: impl Fn(&Match) -> bool) -> Vec<Arc<Match>> {
        let position = position.min(self.max_end());
        self.walk_chain((0..position).rev(), seps, predicate)
    }

    /// Right-hand counterpart of [`MatchSet::chain_before`].
    pub fn chain_after(&self, position: usize, seps: &str, predicate: impl Fn(&Match) -> bool) -> Vec<Arc<Match>> {
        self.walk_chain(position..self.max_end(), seps, predicate)
    }

    fn walk_chain(
        &self,
        positions: impl Iterator<Item = usize>,
        seps: &str,
        predicate: impl Fn(&Match) -> bool,
    ) -> Vec<Arc<Match>> {
        let mut chain: Vec<Arc<Match>> = Vec::new();
        for position in positions {
            let found: Vec<Arc<Match>> = self.at_index(position).into_iter().filter(|m| predicate(m)).collect();
            if found.is_empty() {
                if !is_sep(&self.input, position, seps) {
                    break;
                }
                continue;
            }
            for m in found {
                if !contains_ptr(&chain, &m) {
                    chain.push(m);
                }
            }
        }
        chain
    }

    /// Uncovered regions of `[start, end)`, ignoring matches rejected by `ignore`.
    ///
    /// With non-empty `seps`, separator characters never belong to a hole:
    /// they close the current one.
    pub fn holes(&self, start: usize, end: Option<usize>, seps: &str, ignore: impl Fn(&Match) -> bool) -> Vec<Match> {
        let end = end.map_or(self.max_end(), |e| e.min(self.max_end()));
        let mut holes = Vec::new();
        let mut open: Option<usize> = None;
        for position in start..end {
            if !self.input.is_char_boundary(position) {
                continue;
            }
            let covered = self.at_index(position).iter().any(|m| !ignore(m));
            let sep = is_sep(&self.input, position, seps);
            match open {
                Some(hole_start) if covered || sep => {
                    holes.push(Match::new(hole_start, position, Arc::clone(&self.input)));
                    open = None;
                }
                None if !covered && !sep => open = Some(position),
                _ => {}
            }
        }
        if let Some(hole_start) = open {
            holes.push(Match::new(hole_start, end, Arc::clone(&self.input)));
        }
        holes
    }

    /// Greatest end among the input length and all member ends.
    pub fn max_end(&self) -> usize {
        self.max_end
    }

    pub fn names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for name in self.items.iter().filter_map(|m| m.name.clone()) {
            push_unique(&mut names, name);
        }
        names
    }

    pub fn tags(&self) -> Vec<String> {
        let mut tags = Vec::new();
        for tag in self.items.iter().flat_map(|m| m.tags.iter().cloned()) {
            push_unique(&mut tags, tag);
        }
        tags
    }

    /// Members sorted by `(start, end)`, insertion order kept for ties.
    pub fn sorted(&self) -> Vec<Arc<Match>> {
        let mut sorted = self.items.clone();
        sorted.sort_by_key(|m| (m.start, m.end));
        sorted
    }

    pub fn to_dict(&self, details: bool, first_value: bool, enforce_list: bool) -> MatchesDict {
        MatchesDict::from_matches(&self.sorted(), details, first_value, enforce_list)
    }
}

impl Index<usize> for MatchSet {
    type Output = Arc<Match>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.items[index]
    }
}

impl<'a> IntoIterator for &'a MatchSet {
    type Item = &'a Arc<Match>;
    type IntoIter = std::slice::Iter<'a, Arc<Match>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
