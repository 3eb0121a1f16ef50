//! Circular dependency detection over the requester graph.
//!
//! Edges point from a dependency to the releases that requested it. A walk
//! starting at a freshly registered dependency that comes back to a key
//! already on the current path means that dependency is, transitively, one
//! of its own requesters.

use std::collections::HashMap;

use super::ProjectRelease;

/// Requesters of each `(project, release)`, in registration order.
pub(crate) type RequesterGraph = HashMap<ProjectRelease, Vec<ProjectRelease>>;

/// Looks for a cycle through `start`.
///
/// Returns the cycle in dependency order, first and last element equal,
/// e.g. `[A:1, B:1, A:1]` when `A:1` depends on `B:1` and back.
pub(crate) fn find_cycle(
    requesters: &RequesterGraph,
    start: &ProjectRelease,
) -> Option<Vec<ProjectRelease>> {
    walk(requesters, start, &mut Vec::new())
}

fn walk(
    requesters: &RequesterGraph,
    key: &ProjectRelease,
    path: &mut Vec<ProjectRelease>,
) -> Option<Vec<ProjectRelease>> {
    if let Some(pos) = path.iter().position(|seen| seen == key) {
        let mut cycle = path[pos..].to_vec();
        cycle.push(key.clone());
        cycle.reverse();
        return Some(cycle);
    }

    path.push(key.clone());
    for requester in requesters.get(key).into_iter().flatten() {
        if let Some(cycle) = walk(requesters, requester, path) {
            return Some(cycle);
        }
    }
    path.pop();

    None
}

/// Renders a cycle as `A:1->B:1->A:1`.
pub(crate) fn render(cycle: &[ProjectRelease]) -> String {
    cycle
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("->")
}
