use std::hint::black_box;
use std::time::Instant;

use agentgrid_index::{GridHandle, SpatialGrid, WorldCoord};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const WORLD_SIZE: i32 = 1024;

fn populate(entity_count: usize, region_size: i32) -> (SpatialGrid<usize>, Vec<GridHandle>) {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let mut grid = SpatialGrid::new(WORLD_SIZE, region_size).expect("valid grid");
    let mut handles = vec![GridHandle::default(); entity_count];
    for key in 0..entity_count {
        let at = WorldCoord::new(
            rng.random_range(0..WORLD_SIZE),
            rng.random_range(0..WORLD_SIZE),
        );
        grid.add(&mut handles, key, at).expect("in bounds");
    }
    (grid, handles)
}

fn bench_move_tick(entity_count: usize, iterations: usize) {
    let (mut grid, mut handles) = populate(entity_count, 32);
    let mut rng = ChaCha8Rng::seed_from_u64(2);

    let start = Instant::now();
    for _ in 0..iterations {
        for key in 0..entity_count {
            let from = handles[key].coord().expect("registered");
            let to = WorldCoord::new(
                (from.x + rng.random_range(-2..=2)).clamp(0, WORLD_SIZE - 1),
                (from.y + rng.random_range(-2..=2)).clamp(0, WORLD_SIZE - 1),
            );
            grid.move_entity(black_box(&mut handles), key, from, to)
                .expect("valid move");
        }
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  move tick ({entity_count} entities, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}"
    );
}

fn bench_regions_in_view(region_size: i32, distance: f32, iterations: usize) {
    let (grid, _handles) = populate(10_000, region_size);
    let view = WorldCoord::new(WORLD_SIZE / 2, WORLD_SIZE / 2);

    let start = Instant::now();
    for _ in 0..iterations {
        let _ = black_box(grid.regions_in_view(black_box(view), black_box(distance)));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  view query (region={region_size}, d={distance}, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}"
    );
}

fn bench_entities_in_view(entity_count: usize, distance: f32, iterations: usize) {
    let (grid, _handles) = populate(entity_count, 32);
    let view = WorldCoord::new(WORLD_SIZE / 2, WORLD_SIZE / 2);

    let start = Instant::now();
    for _ in 0..iterations {
        let mut seen = 0usize;
        grid.for_each_in_view(black_box(view), black_box(distance), |k| seen += k & 1);
        black_box(seen);
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  broad phase ({entity_count} entities, d={distance}, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}"
    );
}

fn main() {
    println!("=== Region Grid Benchmarks ===\n");

    println!("Move every entity once:");
    bench_move_tick(1_000, 1_000);
    bench_move_tick(10_000, 100);
    bench_move_tick(100_000, 10);

    println!("\nRegion selection:");
    bench_regions_in_view(16, 32.0, 100_000);
    bench_regions_in_view(32, 32.0, 100_000);
    bench_regions_in_view(32, 128.0, 10_000);

    println!("\nBroad-phase entity visit:");
    bench_entities_in_view(10_000, 32.0, 10_000);
    bench_entities_in_view(100_000, 64.0, 1_000);

    println!("\n=== Done ===");
}
