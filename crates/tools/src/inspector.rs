use agentgrid_common::{RegionCoord, WorldCoord};
use agentgrid_index::SpatialGrid;
use std::collections::HashSet;
use std::fmt::{Debug, Write};

/// Grid inspector for developer tooling.
///
/// Produces summaries and text renderings of region occupancy for debugging
/// and the CLI. Only reads through the grid's public accessors.
pub struct GridInspector;

impl GridInspector {
    /// Produce a summary of region occupancy.
    pub fn summary<K: Copy + Eq + Debug>(grid: &SpatialGrid<K>) -> GridSummary {
        let occupancy = Self::occupancy(grid);
        let occupied = occupancy.iter().filter(|&&n| n > 0).count();
        let max = occupancy.iter().copied().max().unwrap_or(0);
        GridSummary {
            world_size: grid.world_size(),
            region_size: grid.region_size(),
            num_regions: grid.num_regions(),
            entity_count: grid.len(),
            occupied_regions: occupied,
            max_occupancy: max,
            mean_occupancy: if occupied == 0 {
                0.0
            } else {
                grid.len() as f32 / occupied as f32
            },
        }
    }

    /// Entity count per region, row-major.
    pub fn occupancy<K: Copy + Eq + Debug>(grid: &SpatialGrid<K>) -> Vec<usize> {
        grid.regions().map(|(_, keys)| keys.len()).collect()
    }

    /// One character per region, top row first: `.` empty, `1`-`9`, `+` for ten or more.
    pub fn render_occupancy<K: Copy + Eq + Debug>(grid: &SpatialGrid<K>) -> String {
        Self::render(grid, |_, count| occupancy_char(count))
    }

    /// Map of the regions a view query returns: `@` for the region holding the
    /// view point, `#` for other returned regions, `.` elsewhere.
    pub fn render_view<K: Copy + Eq + Debug>(
        grid: &SpatialGrid<K>,
        view: WorldCoord,
        view_distance: f32,
    ) -> String {
        let hits: HashSet<RegionCoord> = grid
            .regions_in_view(view, view_distance)
            .into_iter()
            .collect();
        let origin = grid.region_of(view);
        Self::render(grid, |region, _| {
            if region == origin {
                '@'
            } else if hits.contains(&region) {
                '#'
            } else {
                '.'
            }
        })
    }

    /// Write the per-region counts as `x,y,count` lines, skipping empty regions.
    pub fn write_occupancy_csv<K: Copy + Eq + Debug>(
        grid: &SpatialGrid<K>,
        out: &mut impl Write,
    ) -> std::fmt::Result {
        writeln!(out, "x,y,count")?;
        for (region, keys) in grid.regions() {
            if !keys.is_empty() {
                writeln!(out, "{},{},{}", region.x, region.y, keys.len())?;
            }
        }
        Ok(())
    }

    fn render<K, F>(grid: &SpatialGrid<K>, mut cell: F) -> String
    where
        K: Copy + Eq + Debug,
        F: FnMut(RegionCoord, usize) -> char,
    {
        let side = grid.num_regions() as usize;
        let mut out = String::with_capacity(side * (side + 1));
        for y in (0..grid.num_regions()).rev() {
            for x in 0..grid.num_regions() {
                let region = RegionCoord::new(x, y);
                let count = grid.region(region).map_or(0, <[K]>::len);
                out.push(cell(region, count));
            }
            out.push('\n');
        }
        out
    }
}

fn occupancy_char(count: usize) -> char {
    match count {
        0 => '.',
        1..=9 => char::from_digit(count as u32, 10).unwrap_or('?'),
        _ => '+',
    }
}

/// Occupancy summary for the inspector.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSummary {
    pub world_size: i32,
    pub region_size: i32,
    pub num_regions: i32,
    pub entity_count: usize,
    pub occupied_regions: usize,
    pub max_occupancy: usize,
    pub mean_occupancy: f32,
}

impl std::fmt::Display for GridSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Grid: world={} region={} regions={}x{} entities={} occupied={} max={} mean={:.2}",
            self.world_size,
            self.region_size,
            self.num_regions,
            self.num_regions,
            self.entity_count,
            self.occupied_regions,
            self.max_occupancy,
            self.mean_occupancy,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentgrid_index::GridHandle;

    fn populated() -> (SpatialGrid<usize>, Vec<GridHandle>) {
        let mut grid = SpatialGrid::new(30, 10).unwrap();
        let mut handles = vec![GridHandle::default(); 14];
        for key in 0..12 {
            grid.add(&mut handles, key, WorldCoord::new(1, 1)).unwrap();
        }
        grid.add(&mut handles, 12, WorldCoord::new(25, 5)).unwrap();
        grid.add(&mut handles, 13, WorldCoord::new(26, 6)).unwrap();
        (grid, handles)
    }

    #[test]
    fn summary_empty_grid() {
        let grid = SpatialGrid::<usize>::new(30, 10).unwrap();
        let summary = GridInspector::summary(&grid);
        assert_eq!(summary.num_regions, 3);
        assert_eq!(summary.entity_count, 0);
        assert_eq!(summary.occupied_regions, 0);
        assert_eq!(summary.mean_occupancy, 0.0);
    }

    #[test]
    fn summary_with_entities() {
        let (grid, _) = populated();
        let summary = GridInspector::summary(&grid);
        assert_eq!(summary.entity_count, 14);
        assert_eq!(summary.occupied_regions, 2);
        assert_eq!(summary.max_occupancy, 12);
        assert_eq!(summary.mean_occupancy, 7.0);
        assert!(summary.to_string().contains("entities=14"));
    }

    #[test]
    fn occupancy_is_row_major() {
        let (grid, _) = populated();
        assert_eq!(GridInspector::occupancy(&grid), vec![12, 0, 2, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn render_occupancy_puts_top_row_first() {
        let (grid, _) = populated();
        assert_eq!(GridInspector::render_occupancy(&grid), "...\n...\n+.2\n");
    }

    #[test]
    fn render_view_marks_origin_and_hits() {
        let grid = SpatialGrid::<usize>::new(30, 10).unwrap();
        let map = GridInspector::render_view(&grid, WorldCoord::new(5, 5), 6.0);
        assert_eq!(map, "...\n#..\n@#.\n");
    }

    #[test]
    fn csv_lists_occupied_regions() {
        let (grid, _) = populated();
        let mut out = String::new();
        GridInspector::write_occupancy_csv(&grid, &mut out).unwrap();
        assert_eq!(out, "x,y,count\n0,0,12\n2,0,2\n");
    }
}
