/*!
Graph construction and traversal over the gene pool.

Three rule sources interact here: direct layer-to-layer rules, group-to-group
rules expanded through the group index, and per-gene / per-rule exclusion
flags. The builders merge them into insertion-ordered adjacency structures
and tolerate dangling references (rule files are hand-edited); the traversal
determines which layers the search process can actually reach.
*/

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::debug;

use super::parser::{Gene, GroupRule, SearchSpace};
use crate::types::{EvoVisError, EvoVisResult};

/// The designated entry symbol of every rule set
pub const START_LAYER: &str = "Start";

/// Layer name (including "Start") -> successor layer names
pub type LayerGraph = IndexMap<String, Vec<String>>;

/// Group name -> successor group names
pub type GroupGraph = IndexMap<String, Vec<String>>;

/// Group name -> non-excluded member layer names
pub type GroupIndex = IndexMap<String, Vec<String>>;

/// Derive the group index from the gene pool.
///
/// Every group of the pool appears as a key, even when exclusion filtering
/// empties its member list.
pub fn build_group_index(gene_pool: &IndexMap<String, Vec<Gene>>) -> GroupIndex {
    let mut index = GroupIndex::new();
    for (group, genes) in gene_pool {
        let layers = genes
            .iter()
            .filter(|g| !g.exclude)
            .map(|g| g.layer.clone())
            .collect();
        index.insert(group.clone(), layers);
    }
    index
}

/// Merge direct layer rules and (optionally) group rules into one layer graph.
///
/// Targets that do not resolve to a non-excluded gene are dropped; an empty
/// rule set yields an empty graph, which callers treat as "no usable search
/// space" rather than a failure. Edges are deduplicated per source and
/// self-loops are kept.
pub fn build_layer_graph(space: &SearchSpace, include_group_edges: bool) -> LayerGraph {
    let group_index = build_group_index(&space.gene_pool);
    let known: HashSet<&str> = group_index
        .values()
        .flatten()
        .map(String::as_str)
        .collect();

    let mut graph = LayerGraph::new();

    for (layer, successors) in &space.rule_set {
        let targets = graph.entry(layer.clone()).or_default();
        for target in successors {
            if !known.contains(target.as_str()) {
                debug!(
                    "dropping rule edge {} -> {}: target is excluded or not in the gene pool",
                    layer, target
                );
                continue;
            }
            if !targets.contains(target) {
                targets.push(target.clone());
            }
        }
    }

    if include_group_edges {
        for rule in space.rule_set_group.iter().filter(|r| !r.exclude) {
            let Some(sources) = group_index.get(&rule.group) else {
                debug!("dropping group rule for unknown group '{}'", rule.group);
                continue;
            };
            let fanout: Vec<&String> = rule
                .rule
                .iter()
                .filter_map(|g| group_index.get(g))
                .flatten()
                .collect();
            for source in sources {
                let targets = graph.entry(source.clone()).or_default();
                for target in &fanout {
                    if !targets.contains(*target) {
                        targets.push((*target).clone());
                    }
                }
            }
        }
    }

    graph
}

/// Derive the coarse group-level graph from non-excluded group rules,
/// deduplicated per source group.
pub fn build_group_graph(rules: &[GroupRule]) -> GroupGraph {
    let mut graph = GroupGraph::new();
    for rule in rules.iter().filter(|r| !r.exclude) {
        let targets = graph.entry(rule.group.clone()).or_default();
        for target in &rule.rule {
            if !targets.contains(target) {
                targets.push(target.clone());
            }
        }
    }
    graph
}

/// All layers reachable from `start_layer`, in depth-first preorder.
///
/// The returned list always contains `start_layer` itself. Sibling order is
/// the insertion order of the adjacency list. Asking for a start layer that
/// is not a node of the graph is a usage error and fails fast, since callers
/// rely on it to check that "Start" really exists in the authored rule set.
pub fn connected_layers(graph: &LayerGraph, start_layer: &str) -> EvoVisResult<Vec<String>> {
    if !graph.contains_key(start_layer) {
        return Err(EvoVisError::UnknownStartLayer(start_layer.to_string()));
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut order: Vec<String> = Vec::new();
    let mut stack: Vec<&str> = vec![start_layer];

    while let Some(node) = stack.pop() {
        if !visited.insert(node) {
            continue;
        }
        order.push(node.to_string());
        if let Some(successors) = graph.get(node) {
            // Reversed so the first-listed successor is visited first
            for next in successors.iter().rev() {
                if !visited.contains(next.as_str()) {
                    stack.push(next);
                }
            }
        }
    }

    Ok(order)
}
