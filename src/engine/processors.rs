//! Built-in rules: overlap resolution and private match removal.

use std::sync::Arc;

use tracing::debug;

use super::rules::{Consequence, POST_PROCESS, PRE_PROCESS, Response, Rule};
use crate::matches::{Match, Matches};
use crate::utils::contains_ptr;
use crate::Context;

/// Outcome of a pairwise conflict check, relative to the argument order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// No opinion: defer to the next solver.
    Default,
    /// Both matches stay.
    KeepBoth,
    RemoveFirst,
    RemoveSecond,
}

pub type ConflictSolverFn = Arc<dyn Fn(&Match, &Match) -> Resolution + Send + Sync>;

/// Longest initiator wins; equal lengths keep both.
pub fn default_conflict_solver(first: &Match, second: &Match) -> Resolution {
    let (first_len, second_len) = (first.initiator().len(), second.initiator().len());
    if second_len < first_len {
        Resolution::RemoveSecond
    } else if first_len < second_len {
        Resolution::RemoveFirst
    } else {
        Resolution::KeepBoth
    }
}

/// Removes the losing side of overlapping public matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictSolver;

impl ConflictSolver {
    /// Loser of `current` against `other`, if any.
    ///
    /// `other`'s own solver is asked first (as `other, current`), then
    /// `current`'s (as `current, other`), then the default solver. The first
    /// answer that is not [`Resolution::Default`] decides.
    fn loser<'a>(current: &'a Arc<Match>, other: &'a Arc<Match>) -> Option<&'a Arc<Match>> {
        let custom = [(other, current), (current, other)];
        for (first, second) in custom {
            let Some(solver) = &first.conflict_solver else { continue };
            match solver(&**first, &**second) {
                Resolution::Default => continue,
                Resolution::KeepBoth => return None,
                Resolution::RemoveFirst => return Some(first),
                Resolution::RemoveSecond => return Some(second),
            }
        }
        match default_conflict_solver(current, other) {
            Resolution::RemoveFirst => Some(current),
            Resolution::RemoveSecond => Some(other),
            Resolution::Default | Resolution::KeepBoth => None,
        }
    }
}

impl Rule for ConflictSolver {
    fn name(&self) -> &str {
        "ConflictSolver"
    }

    fn priority(&self) -> i32 {
        PRE_PROCESS
    }

    fn consequences(&self) -> Vec<Consequence> {
        vec![Consequence::RemoveMatch]
    }

    fn when(&self, matches: &Matches, _context: &Context) -> Option<Response> {
        let mut public: Vec<Arc<Match>> = matches.iter().filter(|m| !m.private).cloned().collect();
        public.sort_by_key(|m| m.len());

        let mut to_remove: Vec<Arc<Match>> = Vec::new();
        for current in &public {
            let mut conflicting: Vec<Arc<Match>> =
                matches.conflicting(current).into_iter().filter(|m| !m.private).collect();
            conflicting.sort_by_key(|m| m.len());
            for other in &conflicting {
                let Some(loser) = Self::loser(current, other) else { continue };
                let keeper = if Arc::ptr_eq(loser, current) { other } else { current };
                if contains_ptr(&to_remove, loser) || contains_ptr(&to_remove, keeper) {
                    continue;
                }
                debug!(removed = %loser, kept = %keeper, "conflict solved");
                to_remove.push(Arc::clone(loser));
            }
        }
        (!to_remove.is_empty()).then_some(Response::Matches(to_remove))
    }
}

/// Drops private matches once every other rule has run.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrivateRemover;

impl Rule for PrivateRemover {
    fn name(&self) -> &str {
        "PrivateRemover"
    }

    fn priority(&self) -> i32 {
        POST_PROCESS
    }

    fn consequences(&self) -> Vec<Consequence> {
        vec![Consequence::RemoveMatch]
    }

    fn when(&self, matches: &Matches, _context: &Context) -> Option<Response> {
        let private: Vec<Arc<Match>> = matches.iter().filter(|m| m.private).cloned().collect();
        (!private.is_empty()).then_some(Response::Matches(private))
    }
}
