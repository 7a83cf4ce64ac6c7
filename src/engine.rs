//! Rule execution engine.
//!
//! Rules run after every pattern has populated the match collection. They are
//! grouped by priority (highest first); inside a group, the declared
//! dependencies are toposorted and each batch of independent rules runs in
//! declaration order.
//!
//! ```text
//! Rules ── stable sort by priority (desc)
//!              │
//!              v
//!        chunk_by(priority)                    (rules.rs)
//!              │   - duplicate names rejected
//!              │   - toposort (toposort.rs), cycles rejected
//!              v
//!   for each batch, for each rule:
//!        enabled(context)?
//!        when(matches, context) -> Option<Response>
//!        then(matches, response, context)      (consequences)
//! ```
//!
//! The whole plan is validated before the first rule runs, so a configuration
//! error never leaves the collection half mutated.
//!
//! ## Responsibilities by module
//!
//! - `rules.rs`: the [`Rule`] trait, [`Consequence`]s, [`FnRule`] and the
//!   [`Rules`] collection with `execute_all_rules`.
//! - `toposort.rs`: batch-wise Kahn ordering over dependency sets.
//! - `processors.rs`: built-in [`ConflictSolver`] and [`PrivateRemover`].
//! - `metrics.rs`: optional timing data for a whole run.
//!
//! ## Debugging
//!
//! Rule scheduling and firing are traced through `tracing` (`debug` for fired
//! rules and removals, `trace` for every evaluated condition). Set
//! `RUST_LOG=rebulk=trace` with a subscriber installed to see them.

#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/processors.rs"]
mod processors;
#[path = "engine/rules.rs"]
mod rules;
#[path = "engine/toposort.rs"]
mod toposort;

pub use metrics::{PatternMetrics, RunMetrics, RunResult};
pub use processors::{ConflictSolver, ConflictSolverFn, PrivateRemover, Resolution, default_conflict_solver};
pub use rules::{Consequence, FnRule, POST_PROCESS, PRE_PROCESS, Response, Rule, Rules, rule_name};

#[cfg(test)]
#[path = "engine/tests.rs"]
mod tests;
