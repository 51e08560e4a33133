use agentgrid_common::{RegionCoord, WorldCoord};
use glam::DVec2;
use std::fmt::Debug;

use crate::grid::SpatialGrid;

impl<K: Copy + Eq + Debug> SpatialGrid<K> {
    /// Regions that may hold entities within `view_distance` of `view`.
    ///
    /// Scans the square window of regions `ceil(view_distance / region_size)`
    /// around the view's region (at least one) and keeps those whose square
    /// comes within `view_distance` of the view cell's centre. The test is
    /// conservative: no region that intersects the view circle is dropped,
    /// but a returned region may hold nothing in range.
    ///
    /// Results are unique, in bounds, and ordered row-major over the scanned
    /// window. A negative or NaN distance yields nothing.
    pub fn regions_in_view(&self, view: WorldCoord, view_distance: f32) -> Vec<RegionCoord> {
        let mut found = Vec::new();
        self.visit_view(view, view_distance, |region, _| found.push(region));
        tracing::debug!(%view, view_distance, regions = found.len(), "view query");
        found
    }

    /// Every entity stored in the regions returned by [`Self::regions_in_view`].
    pub fn entities_in_view(&self, view: WorldCoord, view_distance: f32) -> Vec<K> {
        let mut found = Vec::new();
        self.visit_view(view, view_distance, |_, flat| {
            found.extend_from_slice(&self.regions[flat]);
        });
        found
    }

    /// Call `f` for every entity in the view's candidate regions.
    pub fn for_each_in_view<F>(&self, view: WorldCoord, view_distance: f32, mut f: F)
    where
        F: FnMut(K),
    {
        self.visit_view(view, view_distance, |_, flat| {
            self.regions[flat].iter().copied().for_each(&mut f);
        });
    }

    fn visit_view<F>(&self, view: WorldCoord, view_distance: f32, mut f: F)
    where
        F: FnMut(RegionCoord, usize),
    {
        if view_distance.is_nan() || view_distance < 0.0 {
            return;
        }

        let size = f64::from(self.region_size());
        let half = DVec2::splat(size * 0.5);
        // Squared distance in doubled units, where every gap is an integer.
        let limit = (2.0 * f64::from(view_distance)).powi(2);
        let origin = self.region_of(view);
        // Offsets past the grid width can never land in bounds.
        let search = ((f64::from(view_distance) / size).ceil() as i32).clamp(1, self.num_regions());
        let view_centre = DVec2::new(f64::from(view.x) + 0.5, f64::from(view.y) + 0.5);

        for dy in -search..=search {
            let Some(y) = origin.y.checked_add(dy) else {
                continue;
            };
            for dx in -search..=search {
                let Some(x) = origin.x.checked_add(dx) else {
                    continue;
                };
                let region = RegionCoord::new(x, y);
                let Some(flat) = self.flat_index(region) else {
                    continue;
                };
                let gap = ((view_centre - self.centers[flat]).abs() - half).max(DVec2::ZERO);
                if doubled_gap_squared(gap) <= limit {
                    f(region, flat);
                }
            }
        }
    }
}

/// `(2 * gap)` squared and summed exactly, rounded once to f64.
///
/// Each component of `gap` is a non-negative multiple of 0.5 below 2^32, so
/// doubling gives an integer and the sum fits in a u128. Rounding the exact
/// sum once keeps the comparison monotone: a gap within range never compares
/// greater than the limit.
fn doubled_gap_squared(gap: DVec2) -> f64 {
    let gx = (gap.x * 2.0) as u128;
    let gy = (gap.y * 2.0) as u128;
    (gx * gx + gy * gy) as f64
}
