/*!
# EvoVis Core

Data services for EvoVis, a visualization tool for evolutionary
neural-architecture-search (EvoNAS) runs. The crate turns the files of a run
directory into typed, render-ready data; it knows nothing about how that
data is drawn.

## Modules

- `genepool` - the gene pool graph engine: rule specification -> directed
  graph -> reachable layers -> visualization elements
- `runval` - structural validation of a run directory
- `evolution` - per-generation result and chromosome aggregation

## Quick Start

```rust,ignore
use evovis_core::genepool::get_genepool;

let (elements, groups) = get_genepool("runs/evonas_2024")?;
```

Every call recomputes its result from disk; the crate holds no global state
and no caches, so concurrent requests never share data.
*/

pub mod evolution;
pub mod genepool;
pub mod runval;
pub mod types;

// Re-export commonly used types
pub use genepool::{get_genepool, SearchSpace, VisualizationElement};
pub use runval::{validate_run, ValidationReport};
pub use types::{EvoVisError, EvoVisResult};
