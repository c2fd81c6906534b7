//! The cube room: six independent grids, one per side.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::buildings::Building;
use crate::cell::CellPos;
use crate::error::Result;
use crate::grid::{GridGeometry, SpatialGrid};

/// One face of the cube room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomSide {
    /// Ground face, active at session start.
    #[default]
    Floor,
    /// North wall.
    WallNorth,
    /// East wall.
    WallEast,
    /// South wall.
    WallSouth,
    /// West wall.
    WallWest,
    /// Top face.
    Ceiling,
}

impl RoomSide {
    /// All sides in storage order.
    pub const ALL: [Self; 6] = [
        Self::Floor,
        Self::WallNorth,
        Self::WallEast,
        Self::WallSouth,
        Self::WallWest,
        Self::Ceiling,
    ];

    const fn index(self) -> usize {
        match self {
            Self::Floor => 0,
            Self::WallNorth => 1,
            Self::WallEast => 2,
            Self::WallSouth => 3,
            Self::WallWest => 4,
            Self::Ceiling => 5,
        }
    }
}

impl fmt::Display for RoomSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Floor => "floor",
            Self::WallNorth => "wall_north",
            Self::WallEast => "wall_east",
            Self::WallSouth => "wall_south",
            Self::WallWest => "wall_west",
            Self::Ceiling => "ceiling",
        };
        f.write_str(name)
    }
}

/// All six grids of a room.
#[derive(Debug)]
pub struct Room {
    sides: [SpatialGrid; 6],
}

impl Room {
    /// Create six empty grids of the same raw size and geometry.
    #[must_use]
    pub fn new(raw_width: u32, raw_height: u32, geometry: GridGeometry) -> Self {
        Self {
            sides: std::array::from_fn(|_| {
                SpatialGrid::with_geometry(raw_width, raw_height, geometry)
            }),
        }
    }

    /// Grid of one side.
    #[must_use]
    pub fn side(&self, side: RoomSide) -> &SpatialGrid {
        &self.sides[side.index()]
    }

    /// Mutable grid of one side.
    pub fn side_mut(&mut self, side: RoomSide) -> &mut SpatialGrid {
        &mut self.sides[side.index()]
    }

    /// Seed every side with the given templates, in order.
    pub fn seed_all<R: Rng + ?Sized>(
        &mut self,
        seeds: &[Building],
        rng: &mut R,
    ) -> Result<Vec<(RoomSide, CellPos)>> {
        let mut placed = Vec::with_capacity(seeds.len() * RoomSide::ALL.len());
        for side in RoomSide::ALL {
            for seed in seeds {
                let pos = self.side_mut(side).place_random_seed(seed, rng)?;
                placed.push((side, pos));
            }
        }
        Ok(placed)
    }

    /// Iterate sides with their grids.
    pub fn iter(&self) -> impl Iterator<Item = (RoomSide, &SpatialGrid)> {
        RoomSide::ALL.into_iter().map(move |side| (side, self.side(side)))
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::buildings::BuildingKind;
    use crate::cell::CellState;

    #[test]
    fn test_sides_are_independent() {
        let mut room = Room::new(8, 8, GridGeometry::default());
        let node = Building::new(BuildingKind::DataNode, "Node", 0, 5, true).unwrap();
        room.side_mut(RoomSide::Ceiling)
            .try_construct(CellPos::new(1, 1), &node, crate::cell::Placement::Seed)
            .unwrap();

        assert_eq!(
            room.side(RoomSide::Ceiling).cell_at(1, 1).unwrap().state(),
            CellState::Blocked
        );
        assert!(room.side(RoomSide::Floor).cell_at(1, 1).unwrap().is_available());
    }

    #[test]
    fn test_seed_all_places_on_every_side() {
        let mut room = Room::new(10, 10, GridGeometry::default());
        let seeds = [
            Building::new(BuildingKind::DataNode, "Data", 0, 5, true).unwrap(),
            Building::new(BuildingKind::EnergyNode, "Energy", 40, 0, true).unwrap(),
        ];
        let mut rng = StdRng::seed_from_u64(11);

        let placed = room.seed_all(&seeds, &mut rng).unwrap();
        assert_eq!(placed.len(), 12);
        for (side, grid) in room.iter() {
            assert_eq!(grid.occupied_positions().len(), 2, "side {side}");
        }
    }

    #[test]
    fn test_side_names() {
        assert_eq!(RoomSide::WallNorth.to_string(), "wall_north");
        assert_eq!(RoomSide::default(), RoomSide::Floor);
    }
}
