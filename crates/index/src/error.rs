use agentgrid_common::{RegionCoord, WorldCoord};
use std::fmt::Debug;

/// Errors reported by the spatial grid.
///
/// Apart from `InvalidConfiguration`, every variant is a caller contract
/// violation. They are detected before any state is touched, so the grid and
/// all handles are unchanged when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error(
        "invalid grid configuration: world_size={world_size}, region_size={region_size} (both must be positive)"
    )]
    InvalidConfiguration { world_size: i32, region_size: i32 },
    #[error("coordinate {coord} is outside the world [0, {world_size})")]
    OutOfBounds { coord: WorldCoord, world_size: i32 },
    #[error("no grid handle for entity {0}")]
    UnknownEntity(String),
    #[error("entity {entity} is already registered at {coord}")]
    AlreadyRegistered { entity: String, coord: WorldCoord },
    #[error("entity {0} is not registered in the grid")]
    NotRegistered(String),
    #[error("entity {entity} is registered at {cached}, not {given}")]
    CoordMismatch {
        entity: String,
        given: WorldCoord,
        cached: WorldCoord,
    },
    #[error("entity {entity} has stale slot {index} in region {region}")]
    StaleIndex {
        entity: String,
        region: RegionCoord,
        index: usize,
    },
    #[error("grid invariant violated: {0}")]
    Corrupted(String),
}

impl GridError {
    pub(crate) fn unknown<K: Debug>(key: &K) -> Self {
        Self::UnknownEntity(format!("{key:?}"))
    }

    pub(crate) fn not_registered<K: Debug>(key: &K) -> Self {
        Self::NotRegistered(format!("{key:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_entity() {
        let err = GridError::unknown(&42usize);
        assert_eq!(err.to_string(), "no grid handle for entity 42");

        let err = GridError::CoordMismatch {
            entity: "7".into(),
            given: WorldCoord::new(1, 1),
            cached: WorldCoord::new(2, 3),
        };
        assert_eq!(err.to_string(), "entity 7 is registered at (2, 3), not (1, 1)");
    }
}
