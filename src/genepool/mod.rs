/*!
# Gene Pool Graph Engine

Turns a run's declarative rule specification (which layer or group may
follow which) into a directed graph, determines which layers are actually
reachable from the `"Start"` symbol, and emits the node/edge element set for
interactive graph rendering, annotated with group membership.

## Pipeline

```text
search_space.json
   │  loader / parser
   ▼
SearchSpace ──► group index ──► layer graph ──► reachable layers
   │                            group graph          │
   │  gene flattener                                 │
   ▼                                                 ▼
flat genes ───────────────────────────────► element composer
                                                     │
                                                     ▼
                                 (Vec<VisualizationElement>, Vec<String>)
```

Every call recomputes the graph from disk; nothing is cached or shared
between requests.
*/

pub mod elements;
pub mod graph;
pub mod loader;
pub mod parser;

use std::path::Path;

use tracing::warn;

use crate::types::EvoVisResult;

pub use elements::{
    compose_elements, flatten_genes, EdgeElement, FlatGene, NodeElement, NodeKind,
    VisualizationElement,
};
pub use graph::{
    build_group_graph, build_group_index, build_layer_graph, connected_layers, GroupGraph,
    GroupIndex, LayerGraph, START_LAYER,
};
pub use loader::{load_search_space, load_search_space_from_json, SEARCH_SPACE_FILE};
pub use parser::{Gene, GroupRule, SearchSpace, SearchSpaceParser};

/// Build the renderable gene pool graph of a run.
///
/// Public entry point for the presentation layer: returns the visualization
/// elements and the distinct group names (for layout and coloring), computed
/// fresh from `<run_dir>/search_space.json`.
///
/// An entirely empty rule set degrades to an empty element list; a non-empty
/// rule set without a `"Start"` node is a hard error, surfacing that the
/// authored search space has no entry point.
pub fn get_genepool<P: AsRef<Path>>(
    run_dir: P,
) -> EvoVisResult<(Vec<VisualizationElement>, Vec<String>)> {
    let space = loader::load_search_space(run_dir)?;

    let layer_graph = graph::build_layer_graph(&space, true);
    if layer_graph.is_empty() {
        warn!("search space has an empty rule set; rendering an empty graph");
        return Ok((Vec::new(), Vec::new()));
    }

    let reachable = graph::connected_layers(&layer_graph, START_LAYER)?;
    let group_graph = graph::build_group_graph(&space.rule_set_group);
    let genes = elements::flatten_genes(&space.gene_pool);

    Ok(elements::compose_elements(
        &reachable,
        &genes,
        &layer_graph,
        &group_graph,
    ))
}
