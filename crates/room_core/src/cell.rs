//! A single grid cell and its construction state machine.
//!
//! The occupant is stored inside the state variant, so a cell can never be
//! AVAILABLE with a building in it or BUILT/BLOCKED without one.
//!
//! ```text
//!             player construct            demolish
//! Available ────────────────────▶ Built ────────────▶ Available
//!     │
//!     │ seed placement
//!     ▼
//!  Blocked  (terminal)
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::buildings::Building;

/// Position of a cell inside its grid, 0-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellPos {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
}

impl CellPos {
    /// Create a new cell position.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for CellPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Observable construction state of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellState {
    /// Empty and buildable.
    Available,
    /// Occupied by a player-built building.
    Built,
    /// Occupied by a system-seeded building; never demolished by the player.
    Blocked,
}

/// How a construction was initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placement {
    /// Player construction: must touch the connection network.
    Player,
    /// System seed: bypasses the adjacency rule.
    Seed,
}

impl Placement {
    /// State a cell enters when this placement succeeds.
    #[must_use]
    pub const fn resulting_state(self) -> CellState {
        match self {
            Self::Player => CellState::Built,
            Self::Seed => CellState::Blocked,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Occupancy {
    Available,
    Built(Building),
    Blocked(Building),
}

/// One grid-addressable unit of the buildable surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridCell {
    position: CellPos,
    occupancy: Occupancy,
}

impl GridCell {
    /// Create an available cell at `position`.
    #[must_use]
    pub const fn new(position: CellPos) -> Self {
        Self {
            position,
            occupancy: Occupancy::Available,
        }
    }

    /// Cell position.
    #[must_use]
    pub const fn position(&self) -> CellPos {
        self.position
    }

    /// Current construction state.
    #[must_use]
    pub const fn state(&self) -> CellState {
        match self.occupancy {
            Occupancy::Available => CellState::Available,
            Occupancy::Built(_) => CellState::Built,
            Occupancy::Blocked(_) => CellState::Blocked,
        }
    }

    /// Building occupying the cell, if any.
    #[must_use]
    pub fn occupant(&self) -> Option<&Building> {
        match &self.occupancy {
            Occupancy::Available => None,
            Occupancy::Built(building) | Occupancy::Blocked(building) => Some(building),
        }
    }

    /// Whether the cell can accept a construction.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self.occupancy, Occupancy::Available)
    }

    /// True iff the cell holds a building that extends the network.
    #[must_use]
    pub fn is_grid_connection_source(&self) -> bool {
        self.occupant()
            .is_some_and(Building::is_grid_connection_source)
    }

    /// Place a building. Refused (returns `false`) unless available.
    ///
    /// Connectivity is checked by the owning grid before this is called.
    pub(crate) fn occupy(&mut self, building: Building, placement: Placement) -> bool {
        if !self.is_available() {
            return false;
        }
        self.occupancy = match placement {
            Placement::Player => Occupancy::Built(building),
            Placement::Seed => Occupancy::Blocked(building),
        };
        true
    }

    /// Remove a player-built building, returning it.
    ///
    /// Available and blocked cells are left untouched.
    pub(crate) fn clear(&mut self) -> Option<Building> {
        if !matches!(self.occupancy, Occupancy::Built(_)) {
            return None;
        }
        match std::mem::replace(&mut self.occupancy, Occupancy::Available) {
            Occupancy::Built(building) => Some(building),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buildings::BuildingKind;

    fn bus() -> Building {
        Building::new(BuildingKind::Bus, "Bus", -1, 0, true).unwrap()
    }

    fn memory() -> Building {
        Building::new(BuildingKind::Memory, "Memory", -4, 10, false).unwrap()
    }

    fn assert_invariant(cell: &GridCell) {
        assert_eq!(
            cell.occupant().is_some(),
            cell.state() != CellState::Available,
            "occupant/state mismatch at {}",
            cell.position()
        );
    }

    #[test]
    fn test_new_cell_is_available() {
        let cell = GridCell::new(CellPos::new(3, 4));
        assert!(cell.is_available());
        assert_eq!(cell.position(), CellPos::new(3, 4));
        assert!(!cell.is_grid_connection_source());
        assert_invariant(&cell);
    }

    #[test]
    fn test_occupy_sets_state_by_placement() {
        let mut built = GridCell::new(CellPos::new(0, 0));
        assert!(built.occupy(memory(), Placement::Player));
        assert_eq!(built.state(), CellState::Built);
        assert_invariant(&built);

        let mut seeded = GridCell::new(CellPos::new(1, 0));
        assert!(seeded.occupy(bus(), Placement::Seed));
        assert_eq!(seeded.state(), CellState::Blocked);
        assert!(seeded.is_grid_connection_source());
        assert_invariant(&seeded);
    }

    #[test]
    fn test_occupied_cell_refuses_second_building() {
        let mut cell = GridCell::new(CellPos::new(0, 0));
        assert!(cell.occupy(memory(), Placement::Player));
        assert!(!cell.occupy(bus(), Placement::Seed));
        assert_eq!(cell.occupant().unwrap().kind(), BuildingKind::Memory);
    }

    #[test]
    fn test_clear_only_affects_built_cells() {
        let mut built = GridCell::new(CellPos::new(0, 0));
        built.occupy(memory(), Placement::Player);
        assert_eq!(built.clear().unwrap().kind(), BuildingKind::Memory);
        assert!(built.is_available());
        assert_invariant(&built);

        // Already available: no-op
        assert!(built.clear().is_none());

        let mut seeded = GridCell::new(CellPos::new(1, 0));
        seeded.occupy(bus(), Placement::Seed);
        assert!(seeded.clear().is_none());
        assert_eq!(seeded.state(), CellState::Blocked);
    }
}
