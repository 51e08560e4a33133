//! Agent population: the world-side collaborator of the spatial grid.
//!
//! # Invariants
//! - Agent positions and grid registrations change together, through
//!   explicit operations only.
//! - Every tick applies all moves before any neighbour query runs.
//! - Stepping is deterministic for a given seed.

pub mod population;

pub use population::{Agent, Population, PopulationConfig, PopulationError};
