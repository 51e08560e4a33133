use serde::{Deserialize, Serialize};

use crate::error::GridError;

/// Construction parameters for a [`SpatialGrid`](crate::SpatialGrid).
///
/// Both sizes are in world units. The grid is square, so one size covers
/// both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Side length of the world. Valid coordinates are `[0, world_size)`.
    pub world_size: i32,
    /// Side length of one square region.
    pub region_size: i32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            world_size: 256,
            region_size: 16,
        }
    }
}

impl GridConfig {
    pub fn new(world_size: i32, region_size: i32) -> Self {
        Self {
            world_size,
            region_size,
        }
    }

    /// Reject non-positive sizes.
    pub fn validate(&self) -> Result<(), GridError> {
        if self.world_size <= 0 || self.region_size <= 0 {
            return Err(GridError::InvalidConfiguration {
                world_size: self.world_size,
                region_size: self.region_size,
            });
        }
        Ok(())
    }

    /// Regions per axis, `ceil(world_size / region_size)`.
    pub fn num_regions(&self) -> Result<i32, GridError> {
        self.validate()?;
        Ok((self.world_size as u32).div_ceil(self.region_size as u32) as i32)
    }
}
