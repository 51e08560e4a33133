use agentgrid_common::WorldCoord;
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

/// Where a registered entity currently sits in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSlot {
    /// Coordinate the entity was last added or moved to.
    pub coord: WorldCoord,
    /// Position inside the owning region's entity list.
    pub index: usize,
}

/// Per-entity back-reference into the grid.
///
/// The entity side owns one of these but only the grid writes it; outside
/// this crate it is read-only. A default handle is unregistered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridHandle {
    slot: Option<GridSlot>,
}

impl GridHandle {
    pub const fn unregistered() -> Self {
        Self { slot: None }
    }

    pub fn slot(&self) -> Option<GridSlot> {
        self.slot
    }

    pub fn coord(&self) -> Option<WorldCoord> {
        self.slot.map(|s| s.coord)
    }

    pub fn index(&self) -> Option<usize> {
        self.slot.map(|s| s.index)
    }

    pub fn is_registered(&self) -> bool {
        self.slot.is_some()
    }

    pub(crate) fn set(&mut self, slot: GridSlot) {
        self.slot = Some(slot);
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        if let Some(slot) = self.slot.as_mut() {
            slot.index = index;
        }
    }

    pub(crate) fn clear(&mut self) {
        self.slot = None;
    }
}

/// Read access to the handles of the entities stored in a grid.
pub trait HandleView<K> {
    fn handle(&self, key: K) -> Option<&GridHandle>;
}

/// Mutable access to entity handles, looked up by key.
///
/// The grid needs this on every mutation: a swap-remove relocates another
/// entity, whose cached index must follow it.
pub trait HandleStore<K>: HandleView<K> {
    fn handle_mut(&mut self, key: K) -> Option<&mut GridHandle>;
}

impl HandleView<usize> for [GridHandle] {
    fn handle(&self, key: usize) -> Option<&GridHandle> {
        self.get(key)
    }
}

impl HandleStore<usize> for [GridHandle] {
    fn handle_mut(&mut self, key: usize) -> Option<&mut GridHandle> {
        self.get_mut(key)
    }
}

impl HandleView<usize> for Vec<GridHandle> {
    fn handle(&self, key: usize) -> Option<&GridHandle> {
        self.as_slice().handle(key)
    }
}

impl HandleStore<usize> for Vec<GridHandle> {
    fn handle_mut(&mut self, key: usize) -> Option<&mut GridHandle> {
        self.as_mut_slice().handle_mut(key)
    }
}

impl<K: Hash + Eq, S: BuildHasher> HandleView<K> for HashMap<K, GridHandle, S> {
    fn handle(&self, key: K) -> Option<&GridHandle> {
        self.get(&key)
    }
}

impl<K: Hash + Eq, S: BuildHasher> HandleStore<K> for HashMap<K, GridHandle, S> {
    fn handle_mut(&mut self, key: K) -> Option<&mut GridHandle> {
        self.get_mut(&key)
    }
}

impl<K: Ord> HandleView<K> for BTreeMap<K, GridHandle> {
    fn handle(&self, key: K) -> Option<&GridHandle> {
        self.get(&key)
    }
}

impl<K: Ord> HandleStore<K> for BTreeMap<K, GridHandle> {
    fn handle_mut(&mut self, key: K) -> Option<&mut GridHandle> {
        self.get_mut(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_handle_is_unregistered() {
        let h = GridHandle::default();
        assert!(!h.is_registered());
        assert_eq!(h.coord(), None);
        assert_eq!(h.index(), None);
        assert_eq!(h, GridHandle::unregistered());
    }

    #[test]
    fn set_index_only_touches_registered_handles() {
        let mut h = GridHandle::default();
        h.set_index(3);
        assert!(!h.is_registered());

        h.set(GridSlot {
            coord: WorldCoord::new(4, 5),
            index: 0,
        });
        h.set_index(3);
        assert_eq!(h.index(), Some(3));
        assert_eq!(h.coord(), Some(WorldCoord::new(4, 5)));

        h.clear();
        assert!(!h.is_registered());
    }

    #[test]
    fn stores_look_up_by_key() {
        let mut dense = vec![GridHandle::default(); 2];
        assert!(dense.handle_mut(1).is_some());
        assert!(dense.handle(2).is_none());

        let mut map: HashMap<&str, GridHandle> = HashMap::new();
        map.insert("a", GridHandle::default());
        assert!(map.handle_mut("a").is_some());
        assert!(map.handle("b").is_none());

        let mut ordered: BTreeMap<u64, GridHandle> = BTreeMap::new();
        ordered.insert(9, GridHandle::default());
        assert!(ordered.handle_mut(9).is_some());
        assert!(ordered.handle(1).is_none());
    }
}
