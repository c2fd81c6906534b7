//! Grid construction scenarios and property tests.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use room_core::buildings::BuildingKind;
use room_core::cell::{CellPos, CellState, Placement};
use room_core::grid::SpatialGrid;
use room_test_utils::determinism::strategies::{arb_cell_pos, arb_raw_size, arb_world_point};
use room_test_utils::fixtures::{assert_cell_invariants, seeded_grid, template, world_point};

#[test]
fn seed_scenario_on_twenty_by_twenty() {
    let mut grid = SpatialGrid::new(22, 22);
    assert_eq!((grid.width(), grid.height()), (20, 20));

    let mut rng = StdRng::seed_from_u64(2024);
    let node = template(BuildingKind::DataNode);
    let seed = grid.place_random_seed(&node, &mut rng).unwrap();
    assert_eq!(grid.cell_at(seed.x.into(), seed.y.into()).unwrap().state(), CellState::Blocked);

    // A cell with no adjacency to the seed
    let far = grid
        .cells()
        .map(|cell| cell.position())
        .find(|pos| pos.x.abs_diff(seed.x) + pos.y.abs_diff(seed.y) > 1)
        .unwrap();
    let memory = template(BuildingKind::Memory);
    assert!(!grid.try_construct(far, &memory, Placement::Player).unwrap());
    assert!(grid.cell_at(far.x.into(), far.y.into()).unwrap().is_available());

    // One of its four neighbors
    let neighbor = grid.neighbors(seed.x, seed.y)[0].position();
    assert!(grid.try_construct(neighbor, &memory, Placement::Player).unwrap());

    let leaf = grid.cell_at(neighbor.x.into(), neighbor.y.into()).unwrap();
    assert_eq!(leaf.state(), CellState::Built);
    assert!(!leaf.is_grid_connection_source());
    assert!(grid.cell_at(seed.x.into(), seed.y.into()).unwrap().is_grid_connection_source());
    assert_cell_invariants(&grid);
}

#[test]
fn bus_chain_extends_network() {
    let mut grid = seeded_grid(12, 5, &[(0, 1)]);
    let bus = template(BuildingKind::Bus);
    for x in 1..6 {
        assert!(grid
            .try_construct(CellPos::new(x, 1), &bus, Placement::Player)
            .unwrap());
    }
    let lab = template(BuildingKind::Science);
    assert!(grid
        .try_construct(CellPos::new(5, 2), &lab, Placement::Player)
        .unwrap());
    assert_eq!(grid.count_kind(BuildingKind::Bus), 5);
}

#[test]
fn random_path_over_bus_line_ends_on_leaf() {
    // Node at the west end, bus line, memory leaf at the east end
    let mut grid = seeded_grid(10, 3, &[(0, 0)]);
    let bus = template(BuildingKind::Bus);
    for x in 1..7 {
        grid.try_construct(CellPos::new(x, 0), &bus, Placement::Player)
            .unwrap();
    }
    grid.try_construct(CellPos::new(7, 0), &template(BuildingKind::Memory), Placement::Player)
        .unwrap();

    let mut rng = StdRng::seed_from_u64(8);
    for _ in 0..50 {
        let path = grid.random_connected_path(4, &mut rng);
        assert!(!path.is_empty() && path.len() <= 5);
        let cells: Vec<CellPos> = path.iter().map(|p| grid.world_to_cell(*p)).collect();
        // Consecutive waypoints are orthogonal neighbors
        for pair in cells.windows(2) {
            assert_eq!(pair[0].x.abs_diff(pair[1].x) + pair[0].y.abs_diff(pair[1].y), 1);
        }
    }
}

proptest! {
    #[test]
    fn isolated_player_construction_always_fails(
        (raw_w, raw_h) in arb_raw_size(),
        seed in any::<u64>(),
    ) {
        let mut grid = SpatialGrid::new(raw_w, raw_h);
        let mut rng = StdRng::seed_from_u64(seed);
        let pos = CellPos::new(rng.gen_range(0..grid.width()), rng.gen_range(0..grid.height()));

        let built = grid
            .try_construct(pos, &template(BuildingKind::Bus), Placement::Player)
            .unwrap();
        prop_assert!(!built);
        prop_assert!(grid.cells().all(|cell| cell.is_available()));
    }

    #[test]
    fn seed_always_succeeds_on_available_cell(
        pos in arb_cell_pos(20, 20),
    ) {
        let mut grid = SpatialGrid::new(22, 22);
        prop_assert!(grid
            .try_construct(pos, &template(BuildingKind::EnergyNode), Placement::Seed)
            .unwrap());
        assert_cell_invariants(&grid);
    }

    #[test]
    fn zero_length_drag_selects_containing_cell(point in arb_world_point(15)) {
        let grid = SpatialGrid::new(22, 22);
        let cells = grid.cells_between(point, point, false);
        prop_assert_eq!(cells.len(), 1);
        prop_assert_eq!(cells[0].position(), grid.world_to_cell(point));
    }

    #[test]
    fn horizontal_drag_row_length_and_order(
        start in arb_cell_pos(20, 20),
        end in arb_cell_pos(20, 20),
    ) {
        let grid = SpatialGrid::new(22, 22);
        let dx = start.x.abs_diff(end.x);
        let dy = start.y.abs_diff(end.y);
        prop_assume!(dx > dy);

        let cells = grid.cells_between(
            world_point(&grid, start.x, start.y),
            world_point(&grid, end.x, end.y),
            false,
        );
        prop_assert_eq!(cells.len() as u32, dx + 1);
        prop_assert_eq!(cells[0].position(), CellPos::new(start.x, start.y));
        prop_assert_eq!(cells[cells.len() - 1].position(), CellPos::new(end.x, start.y));
        prop_assert!(cells.iter().all(|cell| cell.position().y == start.y));
    }

    #[test]
    fn invariant_holds_through_random_operations(
        seed in any::<u64>(),
        ops in 1usize..200,
    ) {
        let mut grid = seeded_grid(12, 12, &[(4, 4)]);
        let mut rng = StdRng::seed_from_u64(seed);
        let kinds = [BuildingKind::Bus, BuildingKind::Memory, BuildingKind::Science];

        for _ in 0..ops {
            let pos = CellPos::new(rng.gen_range(0..10), rng.gen_range(0..10));
            if rng.gen_bool(0.25) {
                grid.demolish(pos).unwrap();
            } else {
                let kind = kinds[rng.gen_range(0..kinds.len())];
                grid.try_construct(pos, &template(kind), Placement::Player).unwrap();
            }
            assert_cell_invariants(&grid);
        }
        prop_assert_eq!(
            grid.cell_at(4, 4).unwrap().state(),
            CellState::Blocked
        );
    }
}
