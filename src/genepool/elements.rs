/*!
Visualization element composition.

Flattens the nested gene pool and combines it with the reachable-layer set
and both graphs into the node/edge element list consumed by the rendering
layer (a Cytoscape-style compound graph: layer nodes nested inside group
container nodes).
*/

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;

use super::graph::{GroupGraph, LayerGraph, START_LAYER};
use super::parser::Gene;

/// One gene record of the flattened pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatGene {
    pub layer: String,
    /// Owning group, derived from the pool nesting
    pub group: String,
    pub exclude: bool,
}

/// Node kind of a visualization element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Layer,
    Group,
}

/// A node handed to the graph renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeElement {
    pub id: String,
    pub kind: NodeKind,
    /// Owning group for compound nesting; none for groups and "Start"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

/// A directed edge handed to the graph renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeElement {
    pub source: String,
    pub target: String,
}

/// Element of the rendered gene pool graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum VisualizationElement {
    Node(NodeElement),
    Edge(EdgeElement),
}

impl VisualizationElement {
    pub fn layer(id: impl Into<String>, parent: Option<String>) -> Self {
        VisualizationElement::Node(NodeElement {
            id: id.into(),
            kind: NodeKind::Layer,
            parent,
        })
    }

    pub fn group(id: impl Into<String>) -> Self {
        VisualizationElement::Node(NodeElement {
            id: id.into(),
            kind: NodeKind::Group,
            parent: None,
        })
    }

    pub fn edge(source: impl Into<String>, target: impl Into<String>) -> Self {
        VisualizationElement::Edge(EdgeElement {
            source: source.into(),
            target: target.into(),
        })
    }
}

/// Flatten the nested gene pool into one ordered record list, preserving
/// group order and intra-group gene order.
pub fn flatten_genes(gene_pool: &IndexMap<String, Vec<Gene>>) -> Vec<FlatGene> {
    let mut flat = Vec::new();
    for (group, genes) in gene_pool {
        for gene in genes {
            flat.push(FlatGene {
                layer: gene.layer.clone(),
                group: group.clone(),
                exclude: gene.exclude,
            });
        }
    }
    flat
}

/// Compose the final element set.
///
/// Emits, in order: one container node per group owning a live layer, the
/// "Start" pseudo-node when it has a surviving outgoing edge, one node per
/// reachable non-excluded gene, the layer edges restricted to the live
/// search space, and the group edges restricted to the emitted groups.
/// Returns the elements together with the distinct group names in
/// first-seen order.
pub fn compose_elements(
    reachable: &[String],
    genes: &[FlatGene],
    layer_graph: &LayerGraph,
    group_graph: &GroupGraph,
) -> (Vec<VisualizationElement>, Vec<String>) {
    let reachable_set: HashSet<&str> = reachable.iter().map(String::as_str).collect();
    let in_scope = |name: &str| name == START_LAYER || reachable_set.contains(name);

    let mut groups: Vec<String> = Vec::new();
    let mut layer_nodes: Vec<VisualizationElement> = Vec::new();
    for gene in genes {
        if gene.exclude || !reachable_set.contains(gene.layer.as_str()) {
            continue;
        }
        if !groups.contains(&gene.group) {
            groups.push(gene.group.clone());
        }
        layer_nodes.push(VisualizationElement::layer(
            &gene.layer,
            Some(gene.group.clone()),
        ));
    }

    let mut layer_edges: Vec<VisualizationElement> = Vec::new();
    let mut start_has_edges = false;
    for (source, targets) in layer_graph {
        if !in_scope(source) {
            continue;
        }
        for target in targets {
            if !in_scope(target) {
                continue;
            }
            if source == START_LAYER {
                start_has_edges = true;
            }
            layer_edges.push(VisualizationElement::edge(source, target));
        }
    }

    let mut group_edges: Vec<VisualizationElement> = Vec::new();
    for (source, targets) in group_graph {
        if !groups.contains(source) {
            continue;
        }
        for target in targets {
            if groups.contains(target) {
                group_edges.push(VisualizationElement::edge(source, target));
            }
        }
    }

    let mut elements: Vec<VisualizationElement> =
        groups.iter().map(VisualizationElement::group).collect();
    if start_has_edges {
        elements.push(VisualizationElement::layer(START_LAYER, None));
    }
    elements.extend(layer_nodes);
    elements.extend(layer_edges);
    elements.extend(group_edges);

    (elements, groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn pool(entries: &[(&str, &[(&str, bool)])]) -> IndexMap<String, Vec<Gene>> {
        entries
            .iter()
            .map(|(group, genes)| {
                let genes = genes
                    .iter()
                    .map(|(layer, exclude)| Gene {
                        layer: layer.to_string(),
                        exclude: *exclude,
                    })
                    .collect();
                (group.to_string(), genes)
            })
            .collect()
    }

    #[test]
    fn test_flatten_preserves_order() {
        let pool = pool(&[
            ("G1", &[("A", false), ("B", true)]),
            ("G2", &[("C", false)]),
        ]);

        let flat = flatten_genes(&pool);
        assert_eq!(flat.len(), 3);
        assert_eq!(flat[0].layer, "A");
        assert_eq!(flat[1].layer, "B");
        assert!(flat[1].exclude);
        assert_eq!(flat[2].group, "G2");
    }

    #[test]
    fn test_compose_simple_space() {
        // Scenario: Start -> A, single group
        let pool = pool(&[("G1", &[("A", false)])]);
        let flat = flatten_genes(&pool);

        let mut layer_graph = LayerGraph::new();
        layer_graph.insert("Start".into(), vec!["A".into()]);

        let reachable = vec!["Start".to_string(), "A".to_string()];
        let (elements, groups) =
            compose_elements(&reachable, &flat, &layer_graph, &GroupGraph::new());

        assert_eq!(groups, vec!["G1"]);
        assert!(elements.contains(&VisualizationElement::group("G1")));
        assert!(elements.contains(&VisualizationElement::layer("Start", None)));
        assert!(elements.contains(&VisualizationElement::layer("A", Some("G1".into()))));
        assert!(elements.contains(&VisualizationElement::edge("Start", "A")));
    }

    #[test]
    fn test_compose_skips_excluded_genes() {
        let pool = pool(&[("G1", &[("A", true)])]);
        let flat = flatten_genes(&pool);

        let mut layer_graph = LayerGraph::new();
        layer_graph.insert("Start".into(), vec![]);

        let reachable = vec!["Start".to_string(), "A".to_string()];
        let (elements, groups) =
            compose_elements(&reachable, &flat, &layer_graph, &GroupGraph::new());

        assert!(groups.is_empty());
        // No node or edge may touch the excluded layer
        assert!(elements.is_empty());
    }

    #[test]
    fn test_compose_closure_over_reachable_set() {
        // "B" exists in the pool and the graph but is not reachable
        let pool = pool(&[("G1", &[("A", false), ("B", false)])]);
        let flat = flatten_genes(&pool);

        let mut layer_graph = LayerGraph::new();
        layer_graph.insert("Start".into(), vec!["A".into()]);
        layer_graph.insert("B".into(), vec!["A".into()]);

        let reachable = vec!["Start".to_string(), "A".to_string()];
        let (elements, _) =
            compose_elements(&reachable, &flat, &layer_graph, &GroupGraph::new());

        for element in &elements {
            match element {
                VisualizationElement::Node(node) => assert_ne!(node.id, "B"),
                VisualizationElement::Edge(edge) => {
                    assert_ne!(edge.source, "B");
                    assert_ne!(edge.target, "B");
                }
            }
        }
    }

    #[test]
    fn test_compose_start_node_only_with_outgoing_edges() {
        let pool = pool(&[("G1", &[("A", false)])]);
        let flat = flatten_genes(&pool);

        let reachable = vec!["Start".to_string()];
        let (elements, _) = compose_elements(
            &reachable,
            &flat,
            &LayerGraph::new(),
            &GroupGraph::new(),
        );
        assert!(!elements.contains(&VisualizationElement::layer("Start", None)));
    }

    #[test]
    fn test_compose_group_edges_restricted_to_live_groups() {
        let pool = pool(&[("G1", &[("A", false)]), ("G2", &[("B", false)])]);
        let flat = flatten_genes(&pool);

        let mut layer_graph = LayerGraph::new();
        layer_graph.insert("Start".into(), vec!["A".into()]);

        let mut group_graph = GroupGraph::new();
        group_graph.insert("G1".into(), vec!["G2".into()]);

        // Only G1's layer is reachable, so the G1 -> G2 edge has a dead end
        let reachable = vec!["Start".to_string(), "A".to_string()];
        let (elements, groups) =
            compose_elements(&reachable, &flat, &layer_graph, &group_graph);

        assert_eq!(groups, vec!["G1"]);
        assert!(!elements.contains(&VisualizationElement::edge("G1", "G2")));
    }

    #[test]
    fn test_element_serialization_shape() {
        let node = VisualizationElement::layer("A", Some("G1".into()));
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "A", "kind": "layer", "parent": "G1"})
        );

        let edge = VisualizationElement::edge("Start", "A");
        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json, serde_json::json!({"source": "Start", "target": "A"}));
    }
}
