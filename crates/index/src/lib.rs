//! Uniform-grid spatial index for many moving agents.
//!
//! The world is a bounded square split into fixed-size square regions. Each
//! region keeps a dense list of entity keys; each entity keeps a
//! [`GridHandle`] recording where it sits, so removal is an O(1) swap-remove.
//! View queries turn a point and a radius into the regions that may hold
//! entities in range; exact distance checks are left to the caller.
//!
//! # Invariants
//! - Every registered entity appears in exactly one region.
//! - A handle's coordinate is the one the entity was last added or moved to.
//! - A handle's index is the entity's slot in its region.
//! - Region coordinates are always in `[0, num_regions)`.
//!
//! # Contract checks
//! Every mutation validates its preconditions up front and returns a
//! [`GridError`] without touching any state when they do not hold.

mod config;
mod error;
mod grid;
mod handle;
mod view;

pub use config::GridConfig;
pub use error::GridError;
pub use grid::SpatialGrid;
pub use handle::{GridHandle, GridSlot, HandleStore, HandleView};

pub use agentgrid_common::{RegionCoord, WorldCoord};

pub fn crate_info() -> &'static str {
    "agentgrid-index v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("index"));
    }
}
