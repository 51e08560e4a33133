//! Developer tooling: read-only views over a spatial grid.
//!
//! # Invariants
//! - Nothing here mutates the grid; every function takes `&SpatialGrid`.

mod inspector;

pub use inspector::{GridInspector, GridSummary};

pub fn crate_info() -> &'static str {
    "agentgrid-tools v0.1.0"
}
