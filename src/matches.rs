//! Match model and the indexed collections holding pattern results.
//!
//! [`Matches`] carries content matches and owns a separate [`Markers`]
//! collection. Both dereference to [`MatchSet`] for queries.

#[path = "matches/dict.rs"]
mod dict;
#[path = "matches/index.rs"]
mod index;
#[path = "matches/item.rs"]
mod item;

use std::ops::Deref;
use std::sync::Arc;

pub use dict::MatchesDict;
pub use index::MatchSet;
pub use item::{Formatter, Match};

use crate::error::{Error, Result};

/// Content matches of one run, plus the markers found alongside them.
#[derive(Debug, Clone)]
pub struct Matches {
    set: MatchSet,
    pub markers: Markers,
}

impl Matches {
    pub fn new(input: impl Into<Arc<str>>) -> Self {
        let input = input.into();
        Self { set: MatchSet::new(Arc::clone(&input)), markers: Markers::new(input) }
    }

    pub fn push(&mut self, m: Match) -> Result<Arc<Match>> {
        self.push_arc(Arc::new(m))
    }

    pub fn push_arc(&mut self, m: Arc<Match>) -> Result<Arc<Match>> {
        let len = self.set.len();
        self.insert_arc(len, m)
    }

    pub fn insert(&mut self, index: usize, m: Match) -> Result<Arc<Match>> {
        self.insert_arc(index, Arc::new(m))
    }

    pub fn insert_arc(&mut self, index: usize, m: Arc<Match>) -> Result<Arc<Match>> {
        if m.marker {
            return Err(Error::MarkerMismatch { found: m.to_string(), collection: "matches" });
        }
        self.set.insert_arc(index, Arc::clone(&m));
        Ok(m)
    }

    pub fn extend(&mut self, matches: impl IntoIterator<Item = Match>) -> Result<()> {
        for m in matches {
            self.push(m)?;
        }
        Ok(())
    }

    /// Removes `m` by identity; false when it was not a member.
    pub fn remove(&mut self, m: &Arc<Match>) -> bool {
        self.set.remove(m)
    }

    pub fn remove_at(&mut self, index: usize) -> Option<Arc<Match>> {
        self.set.remove_at(index)
    }
}

impl Deref for Matches {
    type Target = MatchSet;

    fn deref(&self) -> &Self::Target {
        &self.set
    }
}

impl<'a> IntoIterator for &'a Matches {
    type Item = &'a Arc<Match>;
    type IntoIter = std::slice::Iter<'a, Arc<Match>>;

    fn into_iter(self) -> Self::IntoIter {
        self.set.iter()
    }
}

/// Marker matches: delimiting regions (brackets, path segments) rather than content.
#[derive(Debug, Clone)]
pub struct Markers {
    set: MatchSet,
}

impl Markers {
    fn new(input: Arc<str>) -> Self {
        Self { set: MatchSet::new(input) }
    }

    pub fn push(&mut self, m: Match) -> Result<Arc<Match>> {
        self.push_arc(Arc::new(m))
    }

    pub fn push_arc(&mut self, m: Arc<Match>) -> Result<Arc<Match>> {
        if !m.marker {
            return Err(Error::MarkerMismatch { found: m.to_string(), collection: "markers" });
        }
        self.set.push_arc(Arc::clone(&m));
        Ok(m)
    }

    pub fn remove(&mut self, m: &Arc<Match>) -> bool {
        self.set.remove(m)
    }
}

impl Deref for Markers {
    type Target = MatchSet;

    fn deref(&self) -> &Self::Target {
        &self.set
    }
}

#[cfg(test)]
mod tests;
