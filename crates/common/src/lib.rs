//! Shared types used across the agentgrid crates.
//!
//! Coordinates are plain integer pairs; the index and its collaborators agree
//! on the meaning of each through the type rather than through convention.

mod types;

pub use types::{EntityId, RegionCoord, WorldCoord};
