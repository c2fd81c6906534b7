//! Grid query benchmarks for room_core.
//!
//! Run with: `cargo bench -p room_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use room_core::buildings::{BuildingData, BuildingKind};
use room_core::cell::{CellPos, Placement};
use room_core::grid::SpatialGrid;
use room_core::math::{Fixed, Vec2Fixed};

/// 40x40 grid with a bus spine along every fifth row.
fn networked_grid() -> SpatialGrid {
    let data = BuildingData::defaults();
    let template = |kind| {
        data.iter()
            .find(|d| d.kind == kind)
            .and_then(|d| d.to_template().ok())
            .unwrap()
    };
    let node = template(BuildingKind::DataNode);
    let bus = template(BuildingKind::Bus);
    let memory = template(BuildingKind::Memory);

    let mut grid = SpatialGrid::new(42, 42);
    for y in (0..40).step_by(5) {
        grid.try_construct(CellPos::new(0, y), &node, Placement::Seed)
            .unwrap();
        for x in 1..39 {
            grid.try_construct(CellPos::new(x, y), &bus, Placement::Player)
                .unwrap();
        }
        grid.try_construct(CellPos::new(39, y), &memory, Placement::Player)
            .unwrap();
    }
    grid
}

pub fn grid_query_benchmark(c: &mut Criterion) {
    let grid = networked_grid();
    let start = Vec2Fixed::new(Fixed::from_num(-19), Fixed::from_num(3));
    let end = Vec2Fixed::new(Fixed::from_num(19), Fixed::from_num(5));

    c.bench_function("cells_between_row", |b| {
        b.iter(|| black_box(grid.cells_between(black_box(start), black_box(end), true).len()))
    });

    c.bench_function("neighbors_interior", |b| {
        b.iter(|| black_box(grid.neighbors(black_box(20), black_box(20)).len()))
    });

    let mut rng = StdRng::seed_from_u64(7);
    c.bench_function("random_connected_path_12", |b| {
        b.iter(|| black_box(grid.random_connected_path(12, &mut rng).len()))
    });
}

criterion_group!(benches, grid_query_benchmark);
criterion_main!(benches);
