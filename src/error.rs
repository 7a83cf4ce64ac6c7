//! Crate-wide error type.
//!
//! Pattern-level soft failures (a validator rejecting a candidate, a chain part
//! not meeting its repeater bound, no occurrence at all) are never errors: they
//! simply produce fewer matches. What remains here are construction mistakes
//! and rule-set configuration mistakes.

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// A regular expression failed to compile at pattern construction.
    #[error("invalid regular expression {pattern:?}: {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A chain part repeater could not be parsed.
    #[error("invalid repeater {0:?} (expected N, ?, *, +, {{m,n}}, {{m,}} or {{,n}})")]
    InvalidRepeater(String),

    /// A pattern was built without any literal, expression or function.
    #[error("{0} pattern needs at least one alternative")]
    EmptyPattern(&'static str),

    /// A chain was closed (or configured) without any part.
    #[error("chain has no part")]
    EmptyChain,

    /// Two rules sharing a name were registered in the same priority group.
    #[error("duplicate rule {name} at priority {priority}")]
    DuplicateRule { name: String, priority: i32 },

    /// The rule dependency graph of one priority group contains a cycle.
    #[error("cyclic rule dependency at priority {priority}: {}", rules.join(", "))]
    CyclicDependency { priority: i32, rules: Vec<String> },

    /// A marker was added to a content collection, or the other way around.
    #[error("{found} cannot be added to {collection}")]
    MarkerMismatch { found: String, collection: &'static str },
}
