use super::MembershipQuery;
use crate::graph::{Object, ObjectGraph};
use crate::path::ObjectPath;

const LOG_TARGET: &str = "enumerator";

/// Walks `graph` in pre-order by path and returns every member of `query`.
///
/// Each container is tested before its properties, and its properties before
/// its children. Subtrees whose rule-map entry is an exclude with no deeper
/// entries are skipped without visiting them. Instance proxies, and
/// everything beneath them, are only considered when
/// `include_instance_proxies` is set.
#[must_use]
pub fn compute_included_objects(query: &MembershipQuery, graph: &dyn ObjectGraph, include_instance_proxies: bool) -> Vec<Object> {
    let mut included = Vec::new();
    let mut pending: Vec<Object> = graph.children(&ObjectPath::root()).into_iter().rev().collect();

    while let Some(container) = pending.pop() {
        if container.is_instance_proxy() && !include_instance_proxies {
            continue;
        }

        let path = container.path().clone();
        if query.excludes_subtree(&path) {
            log::debug!(target: LOG_TARGET, "Pruning excluded subtree '{path}'");
            continue;
        }

        if query.contains(&path) {
            included.push(container);
        }

        included.extend(graph.properties(&path).into_iter().filter(|property| query.contains(property.path())));
        pending.extend(graph.children(&path).into_iter().rev());
    }

    included
}

/// The paths of [`compute_included_objects`], in the same order.
#[must_use]
pub fn compute_included_paths(query: &MembershipQuery, graph: &dyn ObjectGraph, include_instance_proxies: bool) -> Vec<ObjectPath> {
    compute_included_objects(query, graph, include_instance_proxies)
        .into_iter()
        .map(|object| object.path().clone())
        .collect()
}
