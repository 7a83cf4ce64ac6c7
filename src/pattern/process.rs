//! Post-match pipeline shared by every pattern kind.
//!
//! A raw match goes through, in order: the pre-match processor, children
//! (value override, formatter, validator), the parent (same steps, a failure
//! drops the whole match), the post-match processor, private flags and name
//! filtering. What survives is then split into the yielded matches.

use std::sync::Arc;

use tracing::trace;

use super::options::{Node, PatternOptions, flag};
use crate::matches::Match;
use crate::Context;

impl PatternOptions {
    fn yields_parent(&self) -> bool {
        !flag(self.children) || flag(self.every)
    }

    fn yields_children(&self) -> bool {
        flag(self.children) || flag(self.every)
    }

    fn ignores(&self, m: &Match) -> bool {
        match (&m.name, &self.ignore_names) {
            (Some(name), Some(ignored)) => ignored.contains(name),
            _ => false,
        }
    }

    fn privatizes(&self, m: &Match) -> bool {
        match (&m.name, &self.private_names) {
            (Some(name), Some(names)) => names.contains(name),
            _ => false,
        }
    }

    /// Runs one raw match through the pipeline. `None` when the parent was rejected.
    pub(crate) fn process(&self, raw: Match, context: &Context) -> Option<Vec<Match>> {
        let mut parent = match &self.pre_match_processor {
            Some(processor) => processor(raw, context)?,
            None => raw,
        };

        let yield_children = self.yields_children();
        let children = std::mem::take(&mut parent.children);
        let captured = !children.is_empty();
        parent.children = children
            .into_iter()
            .filter_map(|child| self.process_node(child, Node::Child, yield_children))
            .filter(|child| !self.ignores(child))
            .collect();

        let mut parent = self.process_node(parent, Node::Parent, self.yields_parent() || !captured)?;
        if let Some(processor) = &self.post_match_processor {
            parent = processor(parent, context)?;
        }
        Some(self.emit(parent, captured))
    }

    fn process_node(&self, mut node: Match, kind: Node, yielded: bool) -> Option<Match> {
        if node.is_empty() {
            return None;
        }
        let name = node.name.clone();
        if let Some(value) = self.value.lookup(name.as_deref(), kind) {
            node.set_value(value.clone());
        }
        if node.value_override().is_some_and(|value| value.as_str() == Some("")) {
            trace!(span = ?node.span(), name = ?name, "empty value dropped");
            return None;
        }
        if yielded || flag(self.format_all) {
            if let Some(formatter) = self.formatter.lookup(name.as_deref(), kind) {
                node.set_formatter(Some(Arc::clone(formatter)));
            }
        }
        if yielded || flag(self.validate_all) {
            if let Some(validator) = self.validator.lookup(name.as_deref(), kind) {
                if !validator(&node) {
                    trace!(span = ?node.span(), name = ?name, "validator rejected match");
                    return None;
                }
            }
        }
        let private = match kind {
            Node::Parent => flag(self.private_parent),
            Node::Child => flag(self.private_children),
        };
        if private || self.privatizes(&node) {
            node.private = true;
        }
        Some(node)
    }

    /// Splits a processed match into what the pattern yields.
    ///
    /// A match that never had children stands for itself even when children
    /// were requested.
    fn emit(&self, parent: Match, captured: bool) -> Vec<Match> {
        let include_children = self.yields_children() || flag(self.private_children);
        let include_parent = !captured || self.yields_parent() || flag(self.private_parent);

        let children: Vec<Match> = if include_children && !parent.children.is_empty() {
            let snapshot = Arc::new(parent.clone());
            parent
                .children
                .iter()
                .cloned()
                .map(|mut child| {
                    child.parent = Some(Arc::clone(&snapshot));
                    child
                })
                .collect()
        } else {
            Vec::new()
        };

        let mut out = Vec::with_capacity(children.len() + 1);
        if include_parent && !self.ignores(&parent) {
            out.push(parent);
        }
        out.extend(children);
        out
    }
}
