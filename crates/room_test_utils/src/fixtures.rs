//! Test fixtures and helpers.
//!
//! Pre-built grids, templates and session configs for consistent testing.

use fixed::types::I32F32;
use room_core::buildings::{Building, BuildingData, BuildingKind};
use room_core::cell::{CellPos, CellState, Placement};
use room_core::config::SimConfig;
use room_core::controller::{ConstructionController, DragOutcome};
use room_core::grid::SpatialGrid;
use room_core::math::Vec2Fixed;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Default template for a building kind.
///
/// # Panics
///
/// Panics if the default definitions lack `kind`.
#[must_use]
pub fn template(kind: BuildingKind) -> Building {
    BuildingData::defaults()
        .into_iter()
        .find(|data| data.kind == kind)
        .and_then(|data| data.to_template().ok())
        .unwrap_or_else(|| panic!("no default template for {kind}"))
}

/// Grid from raw dimensions with data-node seeds at the given cells.
///
/// # Panics
///
/// Panics if a seed position is out of range or taken.
#[must_use]
pub fn seeded_grid(raw_width: u32, raw_height: u32, seeds: &[(u32, u32)]) -> SpatialGrid {
    let mut grid = SpatialGrid::new(raw_width, raw_height);
    let node = template(BuildingKind::DataNode);
    for &(x, y) in seeds {
        let placed = grid
            .try_construct(CellPos::new(x, y), &node, Placement::Seed)
            .unwrap_or_else(|err| panic!("seed at ({x}, {y}): {err}"));
        assert!(placed, "seed cell ({x}, {y}) already taken");
    }
    grid
}

/// World point at the center of a cell.
#[must_use]
pub fn world_point(grid: &SpatialGrid, x: u32, y: u32) -> Vec2Fixed {
    grid.cell_to_world(CellPos::new(x, y))
}

/// Assert the occupant/state invariant for every cell of a grid.
///
/// # Panics
///
/// Panics on the first cell that violates it.
pub fn assert_cell_invariants(grid: &SpatialGrid) {
    for cell in grid.cells() {
        assert_eq!(
            cell.occupant().is_some(),
            cell.state() != CellState::Available,
            "occupant/state mismatch at {}",
            cell.position()
        );
    }
}

/// Small session config: 10x10 effective cells per side.
#[must_use]
pub fn small_config(seed: u64) -> SimConfig {
    SimConfig {
        grid_width: 12,
        grid_height: 12,
        seed,
        ..SimConfig::default()
    }
}

/// Controller for [`small_config`].
///
/// # Panics
///
/// Panics if the default config fails validation.
#[must_use]
pub fn small_session(seed: u64) -> ConstructionController {
    ConstructionController::new(small_config(seed))
        .unwrap_or_else(|err| panic!("small session: {err}"))
}

/// Drag across the active side between two cells and apply the result.
///
/// # Panics
///
/// Panics if the drag was refused or errored.
pub fn drag_cells(controller: &mut ConstructionController, from: CellPos, to: CellPos) -> DragOutcome {
    let grid = controller.active_grid();
    let start = grid.cell_to_world(from);
    let end = grid.cell_to_world(to);
    assert!(controller.begin_drag(start), "drag refused at {from}");
    controller.update_drag(end);
    controller
        .end_drag(end)
        .unwrap_or_else(|err| panic!("drag {from} -> {to}: {err}"))
        .unwrap_or_else(|| panic!("drag {from} -> {to} produced no outcome"))
}

/// First available neighbor of a cell on the active side.
#[must_use]
pub fn free_neighbor(controller: &ConstructionController, pos: CellPos) -> Option<CellPos> {
    controller
        .active_grid()
        .neighbors(pos.x, pos.y)
        .into_iter()
        .find(|cell| cell.is_available())
        .map(|cell| cell.position())
}

/// Position of the first cell holding `kind` on the active side.
#[must_use]
pub fn find_kind(controller: &ConstructionController, kind: BuildingKind) -> Option<CellPos> {
    controller
        .active_grid()
        .cells()
        .find(|cell| cell.occupant().is_some_and(|b| b.kind() == kind))
        .map(|cell| cell.position())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_grid_places_sources() {
        let grid = seeded_grid(8, 8, &[(1, 1), (4, 2)]);
        assert_eq!(grid.occupied_positions().len(), 2);
        assert!(grid.cell_at(4, 2).unwrap().is_grid_connection_source());
        assert_cell_invariants(&grid);
    }

    #[test]
    fn test_small_session_has_seeds() {
        let session = small_session(3);
        assert!(find_kind(&session, BuildingKind::DataNode).is_some());
        assert!(find_kind(&session, BuildingKind::EnergyNode).is_some());
    }
}
