//! Batch-wise topological sort.

use std::collections::{BTreeMap, BTreeSet};

/// Orders `graph` (node -> dependencies) into batches where every node only
/// depends on nodes of earlier batches. Self-dependencies are ignored;
/// dependencies that are not keys are treated as already satisfied roots.
///
/// On a cycle, returns every node that could not be scheduled.
pub(crate) fn toposort<T: Copy + Ord>(graph: &BTreeMap<T, BTreeSet<T>>) -> Result<Vec<Vec<T>>, Vec<T>> {
    let mut pending: BTreeMap<T, BTreeSet<T>> = graph
        .iter()
        .map(|(node, deps)| (*node, deps.iter().copied().filter(|dep| dep != node).collect()))
        .collect();
    for deps in graph.values() {
        for dep in deps {
            pending.entry(*dep).or_default();
        }
    }

    let mut batches = Vec::new();
    while !pending.is_empty() {
        let ready: BTreeSet<T> = pending.iter().filter(|(_, deps)| deps.is_empty()).map(|(node, _)| *node).collect();
        if ready.is_empty() {
            return Err(pending.into_keys().collect());
        }
        pending.retain(|node, _| !ready.contains(node));
        for deps in pending.values_mut() {
            deps.retain(|dep| !ready.contains(dep));
        }
        batches.push(ready.into_iter().collect());
    }
    Ok(batches)
}
