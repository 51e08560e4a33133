use agentgrid_common::{RegionCoord, WorldCoord};
use glam::DVec2;
use std::fmt::Debug;

use crate::config::GridConfig;
use crate::error::GridError;
use crate::handle::{GridSlot, HandleStore, HandleView};

/// Fixed-size uniform grid over a bounded square world.
///
/// Regions are stored in one flat buffer addressed by `y * num_regions + x`,
/// with a parallel buffer of region centres used by view queries. The grid
/// stores only entity keys; the entities keep their own [`GridHandle`]s and
/// hand them to the grid through a [`HandleStore`].
///
/// [`GridHandle`]: crate::GridHandle
#[derive(Debug, Clone)]
pub struct SpatialGrid<K> {
    world_size: i32,
    region_size: i32,
    num_regions: i32,
    pub(crate) regions: Vec<Vec<K>>,
    pub(crate) centers: Vec<DVec2>,
    len: usize,
}

impl<K: Copy + Eq + Debug> SpatialGrid<K> {
    /// Create an empty grid covering `[0, world_size)` on both axes.
    pub fn new(world_size: i32, region_size: i32) -> Result<Self, GridError> {
        Self::from_config(&GridConfig::new(world_size, region_size))
    }

    pub fn from_config(config: &GridConfig) -> Result<Self, GridError> {
        let num_regions = config.num_regions()?;
        let side = num_regions as usize;
        let invalid = || GridError::InvalidConfiguration {
            world_size: config.world_size,
            region_size: config.region_size,
        };
        let count = side.checked_mul(side).ok_or_else(invalid)?;

        // Sizes whose buffers cannot be allocated are rejected, not aborted on.
        let mut regions: Vec<Vec<K>> = Vec::new();
        regions.try_reserve_exact(count).map_err(|_| invalid())?;
        regions.resize_with(count, Vec::new);
        let mut centers: Vec<DVec2> = Vec::new();
        centers.try_reserve_exact(count).map_err(|_| invalid())?;

        // f64 holds every i32 multiple of half a unit exactly.
        let size = f64::from(config.region_size);
        for y in 0..num_regions {
            for x in 0..num_regions {
                let min = DVec2::new(f64::from(x) * size, f64::from(y) * size);
                centers.push(min + DVec2::splat(size * 0.5));
            }
        }

        tracing::debug!(
            world_size = config.world_size,
            region_size = config.region_size,
            num_regions,
            "created spatial grid"
        );

        Ok(Self {
            world_size: config.world_size,
            region_size: config.region_size,
            num_regions,
            regions,
            centers,
            len: 0,
        })
    }

    pub fn world_size(&self) -> i32 {
        self.world_size
    }

    pub fn region_size(&self) -> i32 {
        self.region_size
    }

    /// Regions per axis.
    pub fn num_regions(&self) -> i32 {
        self.num_regions
    }

    /// Number of registered entities.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether `coord` lies inside `[0, world_size)` on both axes.
    pub fn contains(&self, coord: WorldCoord) -> bool {
        (0..self.world_size).contains(&coord.x) && (0..self.world_size).contains(&coord.y)
    }

    /// Region owning `coord`, by truncating division.
    pub fn region_of(&self, coord: WorldCoord) -> RegionCoord {
        RegionCoord::new(coord.x / self.region_size, coord.y / self.region_size)
    }

    pub fn region_in_bounds(&self, region: RegionCoord) -> bool {
        (0..self.num_regions).contains(&region.x) && (0..self.num_regions).contains(&region.y)
    }

    /// Entities currently in `region`, or `None` if it is outside the grid.
    pub fn region(&self, region: RegionCoord) -> Option<&[K]> {
        self.flat_index(region).map(|i| self.regions[i].as_slice())
    }

    /// World-space centre of `region`.
    pub fn region_center(&self, region: RegionCoord) -> Option<DVec2> {
        self.flat_index(region).map(|i| self.centers[i])
    }

    /// All regions in row-major order with their occupants.
    pub fn regions(&self) -> impl Iterator<Item = (RegionCoord, &[K])> + '_ {
        self.regions
            .iter()
            .enumerate()
            .map(|(i, cell)| (self.region_at(i), cell.as_slice()))
    }

    /// Register `key` at `coord`.
    ///
    /// The entity's handle must be unregistered; on success it records
    /// `coord` and the entity's slot in its region.
    pub fn add<S>(&mut self, store: &mut S, key: K, coord: WorldCoord) -> Result<(), GridError>
    where
        S: HandleStore<K> + ?Sized,
    {
        self.check_bounds(coord)?;
        let handle = store.handle_mut(key).ok_or_else(|| GridError::unknown(&key))?;
        if let Some(slot) = handle.slot() {
            tracing::warn!(entity = ?key, %coord, existing = %slot.coord, "entity added twice");
            return Err(GridError::AlreadyRegistered {
                entity: format!("{key:?}"),
                coord: slot.coord,
            });
        }

        let flat = self.flat_index_of(coord);
        let cell = &mut self.regions[flat];
        let index = cell.len();
        cell.push(key);
        handle.set(GridSlot { coord, index });
        self.len += 1;

        tracing::trace!(entity = ?key, %coord, index, "added entity");
        Ok(())
    }

    /// Unregister `key`, which must currently be registered at `coord`.
    ///
    /// Swap-remove: the last entity of the region takes the vacated slot and
    /// its handle is updated to match.
    pub fn remove<S>(&mut self, store: &mut S, key: K, coord: WorldCoord) -> Result<(), GridError>
    where
        S: HandleStore<K> + ?Sized,
    {
        self.check_bounds(coord)?;
        let flat = self.flat_index_of(coord);
        let index = self.checked_slot(&*store, key, coord, flat)?;

        let cell = &mut self.regions[flat];
        let last = cell.len() - 1;
        if index != last {
            let moved = cell[last];
            let moved_handle = store
                .handle_mut(moved)
                .ok_or_else(|| GridError::unknown(&moved))?;
            debug_assert_eq!(moved_handle.index(), Some(last));
            moved_handle.set_index(index);
        }
        cell.swap_remove(index);
        self.len -= 1;

        if let Some(handle) = store.handle_mut(key) {
            handle.clear();
        }

        tracing::trace!(entity = ?key, %coord, index, "removed entity");
        Ok(())
    }

    /// Relocate `key` from `from` to `to`: a remove followed by an add, even
    /// when both coordinates fall in the same region.
    pub fn move_entity<S>(
        &mut self,
        store: &mut S,
        key: K,
        from: WorldCoord,
        to: WorldCoord,
    ) -> Result<(), GridError>
    where
        S: HandleStore<K> + ?Sized,
    {
        // Checked first so a bad destination cannot leave the entity removed.
        self.check_bounds(to)?;
        self.remove(store, key, from)?;
        self.add(store, key, to)
    }

    /// Check every region against the handles in `store`.
    ///
    /// Fails on the first entity whose handle is missing, unregistered, points
    /// at a different slot, or records a coordinate outside its region.
    pub fn validate<S>(&self, store: &S) -> Result<(), GridError>
    where
        S: HandleView<K> + ?Sized,
    {
        let mut seen = 0usize;
        for (flat, cell) in self.regions.iter().enumerate() {
            let region = self.region_at(flat);
            for (index, key) in cell.iter().enumerate() {
                let handle = store.handle(*key).ok_or_else(|| GridError::unknown(key))?;
                let slot = handle.slot().ok_or_else(|| GridError::not_registered(key))?;
                if slot.index != index {
                    return Err(GridError::StaleIndex {
                        entity: format!("{key:?}"),
                        region,
                        index: slot.index,
                    });
                }
                if !self.contains(slot.coord) || self.region_of(slot.coord) != region {
                    return Err(GridError::Corrupted(format!(
                        "entity {key:?} stored in region {region} but registered at {}",
                        slot.coord
                    )));
                }
                seen += 1;
            }
        }
        if seen != self.len {
            return Err(GridError::Corrupted(format!(
                "grid counts {} entities but regions hold {seen}",
                self.len
            )));
        }
        Ok(())
    }

    fn check_bounds(&self, coord: WorldCoord) -> Result<(), GridError> {
        if self.contains(coord) {
            Ok(())
        } else {
            tracing::warn!(%coord, world_size = self.world_size, "coordinate out of bounds");
            Err(GridError::OutOfBounds {
                coord,
                world_size: self.world_size,
            })
        }
    }

    /// Slot of `key` in region `flat`, after checking its handle agrees.
    fn checked_slot<S>(
        &self,
        store: &S,
        key: K,
        coord: WorldCoord,
        flat: usize,
    ) -> Result<usize, GridError>
    where
        S: HandleView<K> + ?Sized,
    {
        let handle = store.handle(key).ok_or_else(|| GridError::unknown(&key))?;
        let slot = handle.slot().ok_or_else(|| GridError::not_registered(&key))?;
        if slot.coord != coord {
            tracing::warn!(entity = ?key, given = %coord, cached = %slot.coord, "coordinate mismatch");
            return Err(GridError::CoordMismatch {
                entity: format!("{key:?}"),
                given: coord,
                cached: slot.coord,
            });
        }
        if self.regions[flat].get(slot.index) != Some(&key) {
            tracing::warn!(entity = ?key, index = slot.index, "stale grid handle");
            return Err(GridError::StaleIndex {
                entity: format!("{key:?}"),
                region: self.region_at(flat),
                index: slot.index,
            });
        }
        Ok(slot.index)
    }

    /// Flat buffer index of an in-bounds world coordinate.
    fn flat_index_of(&self, coord: WorldCoord) -> usize {
        let region = self.region_of(coord);
        debug_assert!(self.region_in_bounds(region));
        region.y as usize * self.num_regions as usize + region.x as usize
    }

    pub(crate) fn flat_index(&self, region: RegionCoord) -> Option<usize> {
        self.region_in_bounds(region)
            .then(|| region.y as usize * self.num_regions as usize + region.x as usize)
    }

    pub(crate) fn region_at(&self, flat: usize) -> RegionCoord {
        let side = self.num_regions as usize;
        RegionCoord::new((flat % side) as i32, (flat / side) as i32)
    }
}
