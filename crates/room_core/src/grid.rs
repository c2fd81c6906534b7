//! Spatial grid: cell ownership, neighbors, line selection and path search.
//!
//! The grid owns every [`GridCell`] of one room side and is the only place
//! construction happens, because the adjacency rule needs the neighbors of
//! the target cell. Cells are stored row-major, indexed `x + y * width`.
//!
//! World mapping treats `origin` as the world position of the grid center;
//! a world point maps to `floor((p - origin) / cell_size + size / 2)`,
//! clamped into the grid.

use std::fmt;

use rand::Rng;
use tracing::{debug, error, info};

use crate::buildings::{Building, BuildingKind};
use crate::cell::{CellPos, CellState, GridCell, Placement};
use crate::error::{CoreError, Result};
use crate::math::{Fixed, Vec2Fixed};

/// Width of the unused rendering margin baked into raw dimensions.
pub const BORDER_CELLS: u32 = 1;

/// Orthogonal neighbor directions, in lookup order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// x - 1
    West,
    /// x + 1
    East,
    /// y + 1
    North,
    /// y - 1
    South,
}

impl Direction {
    /// Fixed neighbor order. Path search depends on it.
    pub const ALL: [Self; 4] = [Self::West, Self::East, Self::North, Self::South];

    /// Grid offset of this direction.
    #[must_use]
    pub const fn offset(self) -> (i64, i64) {
        match self {
            Self::West => (-1, 0),
            Self::East => (1, 0),
            Self::North => (0, 1),
            Self::South => (0, -1),
        }
    }
}

/// Placement of the grid in world space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridGeometry {
    /// World position of the grid center.
    pub origin: Vec2Fixed,
    /// World size of one cell edge.
    pub cell_size: Fixed,
}

impl Default for GridGeometry {
    fn default() -> Self {
        Self {
            origin: Vec2Fixed::ZERO,
            cell_size: Fixed::ONE,
        }
    }
}

/// Handle returned by [`SpatialGrid::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Callback invoked with the new state and the cell after a state change.
pub type CellListener = Box<dyn FnMut(CellState, &GridCell)>;

/// Ordered list of cell listeners, invoked in registration order.
#[derive(Default)]
struct ListenerRegistry {
    listeners: Vec<(ListenerId, CellListener)>,
    next_id: u64,
}

impl ListenerRegistry {
    fn add(&mut self, listener: CellListener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    fn notify(&mut self, state: CellState, cell: &GridCell) {
        for (_, listener) in &mut self.listeners {
            listener(state, cell);
        }
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.listeners.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

/// Grid of construction cells for one room side.
#[derive(Debug)]
pub struct SpatialGrid {
    /// Effective width in cells (border excluded).
    width: u32,
    /// Effective height in cells (border excluded).
    height: u32,
    /// Cell data stored in row-major order.
    cells: Vec<GridCell>,
    geometry: GridGeometry,
    listeners: ListenerRegistry,
}

impl SpatialGrid {
    /// Create a grid from raw dimensions that include the 1-cell border.
    ///
    /// # Panics
    ///
    /// Panics if either raw dimension leaves no cells after removing the
    /// border.
    #[must_use]
    pub fn new(raw_width: u32, raw_height: u32) -> Self {
        Self::with_geometry(raw_width, raw_height, GridGeometry::default())
    }

    /// Create a grid with explicit world placement.
    ///
    /// # Panics
    ///
    /// Panics on raw dimensions below 3 or a non-positive cell size.
    #[must_use]
    pub fn with_geometry(raw_width: u32, raw_height: u32, geometry: GridGeometry) -> Self {
        assert!(
            raw_width > 2 * BORDER_CELLS,
            "SpatialGrid raw width must exceed the border"
        );
        assert!(
            raw_height > 2 * BORDER_CELLS,
            "SpatialGrid raw height must exceed the border"
        );
        assert!(
            geometry.cell_size > Fixed::ZERO,
            "SpatialGrid cell_size must be positive"
        );

        let width = raw_width - 2 * BORDER_CELLS;
        let height = raw_height - 2 * BORDER_CELLS;
        let mut cells = Vec::with_capacity((width as usize) * (height as usize));
        for y in 0..height {
            for x in 0..width {
                cells.push(GridCell::new(CellPos::new(x, y)));
            }
        }

        Self {
            width,
            height,
            cells,
            geometry,
            listeners: ListenerRegistry::default(),
        }
    }

    /// Effective width in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Effective height in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// World placement of the grid.
    #[must_use]
    pub const fn geometry(&self) -> GridGeometry {
        self.geometry
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &GridCell> {
        self.cells.iter()
    }

    /// Check if coordinates are within grid bounds.
    #[must_use]
    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < i64::from(self.width) && y < i64::from(self.height)
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (x as usize) + (y as usize) * (self.width as usize)
    }

    fn checked_index(&self, x: i64, y: i64) -> Result<usize> {
        if self.in_bounds(x, y) {
            Ok(self.index(x as u32, y as u32))
        } else {
            error!(x, y, width = self.width, height = self.height, "Cell lookup out of range");
            Err(CoreError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Cell at coordinates, `None` when out of range.
    #[must_use]
    pub fn get(&self, x: i64, y: i64) -> Option<&GridCell> {
        self.in_bounds(x, y)
            .then(|| &self.cells[self.index(x as u32, y as u32)])
    }

    /// Cell at coordinates. Out-of-range coordinates are a caller bug and
    /// are reported, never clamped.
    pub fn cell_at(&self, x: i64, y: i64) -> Result<&GridCell> {
        let index = self.checked_index(x, y)?;
        Ok(&self.cells[index])
    }

    /// In-bounds orthogonal neighbors in West, East, North, South order.
    #[must_use]
    pub fn neighbors(&self, x: u32, y: u32) -> Vec<&GridCell> {
        Direction::ALL
            .iter()
            .filter_map(|direction| {
                let (dx, dy) = direction.offset();
                self.get(i64::from(x) + dx, i64::from(y) + dy)
            })
            .collect()
    }

    /// Whether any neighbor of `pos` extends the connection network.
    #[must_use]
    pub fn touches_network(&self, pos: CellPos) -> bool {
        self.neighbors(pos.x, pos.y)
            .iter()
            .any(|cell| cell.is_grid_connection_source())
    }

    // ------------------------------------------------------------------
    // World mapping
    // ------------------------------------------------------------------

    fn axis_to_cell(&self, value: Fixed, origin: Fixed, cells: u32) -> u32 {
        let last = i64::from(cells) - 1;
        let half = Fixed::from_num(cells) / Fixed::from_num(2);
        let coord = value
            .checked_sub(origin)
            .and_then(|offset| offset.checked_div(self.geometry.cell_size))
            .and_then(|steps| steps.checked_add(half))
            .map(|coord| coord.floor().to_num::<i64>());
        // Overflow means far outside the grid: clamp by sign
        match coord {
            Some(coord) => coord.clamp(0, last) as u32,
            None if value >= origin => last as u32,
            None => 0,
        }
    }

    /// Map a world point to the cell containing it, clamped into the grid.
    #[must_use]
    pub fn world_to_cell(&self, point: Vec2Fixed) -> CellPos {
        CellPos::new(
            self.axis_to_cell(point.x, self.geometry.origin.x, self.width),
            self.axis_to_cell(point.y, self.geometry.origin.y, self.height),
        )
    }

    /// World position of a cell center.
    #[must_use]
    pub fn cell_to_world(&self, pos: CellPos) -> Vec2Fixed {
        let half = Fixed::from_num(0.5);
        let half_w = Fixed::from_num(self.width) / Fixed::from_num(2);
        let half_h = Fixed::from_num(self.height) / Fixed::from_num(2);
        Vec2Fixed::new(
            self.geometry.origin.x + (Fixed::from_num(pos.x) + half - half_w) * self.geometry.cell_size,
            self.geometry.origin.y + (Fixed::from_num(pos.y) + half - half_h) * self.geometry.cell_size,
        )
    }

    /// Cells along the dominant axis of a drag from `start` to `end`.
    ///
    /// Horizontal if `|dx| >= |dy|`, vertical otherwise. The line runs on
    /// the start cell's row (or column) and keeps gesture order. With
    /// `only_available`, occupied cells are skipped rather than padded.
    #[must_use]
    pub fn cells_between(
        &self,
        start: Vec2Fixed,
        end: Vec2Fixed,
        only_available: bool,
    ) -> Vec<&GridCell> {
        let from = self.world_to_cell(start);
        let to = self.world_to_cell(end);
        let dx = i64::from(to.x) - i64::from(from.x);
        let dy = i64::from(to.y) - i64::from(from.y);

        let line: Vec<CellPos> = if dx.abs() >= dy.abs() {
            axis_range(from.x, to.x)
                .map(|x| CellPos::new(x, from.y))
                .collect()
        } else {
            axis_range(from.y, to.y)
                .map(|y| CellPos::new(from.x, y))
                .collect()
        };

        line.into_iter()
            .map(|pos| &self.cells[self.index(pos.x, pos.y)])
            .filter(|cell| !only_available || cell.is_available())
            .collect()
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Attempt to construct `building` at `pos`.
    ///
    /// Returns `Ok(false)` without mutation when the cell is not available,
    /// or when a player placement has no connection-source neighbor. Seed
    /// placements skip the adjacency rule. Listeners are notified only on
    /// success.
    pub fn try_construct(
        &mut self,
        pos: CellPos,
        building: &Building,
        placement: Placement,
    ) -> Result<bool> {
        let index = self.checked_index(i64::from(pos.x), i64::from(pos.y))?;

        if !self.cells[index].is_available() {
            debug!(%pos, kind = %building.kind(), "Construction refused: cell occupied");
            return Ok(false);
        }
        if placement == Placement::Player && !self.touches_network(pos) {
            debug!(%pos, kind = %building.kind(), "Construction refused: not connected");
            return Ok(false);
        }
        if !self.cells[index].occupy(building.clone(), placement) {
            return Ok(false);
        }

        let state = placement.resulting_state();
        debug!(%pos, kind = %building.kind(), ?state, "Constructed");
        let cell = &self.cells[index];
        self.listeners.notify(state, cell);
        Ok(true)
    }

    /// Demolish a player-built building, returning it.
    ///
    /// Available cells are a no-op and blocked cells are refused; both
    /// return `Ok(None)`.
    pub fn demolish(&mut self, pos: CellPos) -> Result<Option<Building>> {
        let index = self.checked_index(i64::from(pos.x), i64::from(pos.y))?;
        let Some(building) = self.cells[index].clear() else {
            return Ok(None);
        };

        debug!(%pos, kind = %building.kind(), "Demolished");
        let cell = &self.cells[index];
        self.listeners.notify(CellState::Available, cell);
        Ok(Some(building))
    }

    /// Drop a seed building on a uniformly random available cell.
    ///
    /// A grid without available cells is a precondition violation.
    pub fn place_random_seed<R: Rng + ?Sized>(
        &mut self,
        building: &Building,
        rng: &mut R,
    ) -> Result<CellPos> {
        if self.available_count() == 0 {
            error!(kind = %building.kind(), "Seed placement on a full grid");
            return Err(CoreError::GridFull);
        }

        loop {
            let pos = CellPos::new(rng.gen_range(0..self.width), rng.gen_range(0..self.height));
            if self.cells[self.index(pos.x, pos.y)].is_available()
                && self.try_construct(pos, building, Placement::Seed)?
            {
                info!(%pos, kind = %building.kind(), "Seed placed");
                return Ok(pos);
            }
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Walk the connection network from a random occupied cell.
    ///
    /// The first element is the start cell's world position. Each step
    /// moves to the first neighbor (in [`Direction::ALL`] order) holding a
    /// connection source; the last step instead takes the first neighbor
    /// holding a non-source building. The walk keeps no visited set, so it
    /// may revisit cells, and stops early at a dead end.
    #[must_use]
    pub fn random_connected_path<R: Rng + ?Sized>(
        &self,
        length: usize,
        rng: &mut R,
    ) -> Vec<Vec2Fixed> {
        let occupied = self.occupied_positions();
        if occupied.is_empty() {
            return Vec::new();
        }

        let mut current = occupied[rng.gen_range(0..occupied.len())];
        let mut path = Vec::with_capacity(length + 1);
        path.push(self.cell_to_world(current));

        for step in 0..length {
            let final_step = step + 1 == length;
            let next = self
                .neighbors(current.x, current.y)
                .into_iter()
                .filter(|cell| cell.position() != current)
                .find(|cell| {
                    if final_step {
                        cell.occupant()
                            .is_some_and(|building| !building.is_grid_connection_source())
                    } else {
                        cell.is_grid_connection_source()
                    }
                });

            let Some(cell) = next else {
                break;
            };
            current = cell.position();
            path.push(self.cell_to_world(current));
        }

        path
    }

    /// Positions of all occupied cells in row-major order.
    #[must_use]
    pub fn occupied_positions(&self) -> Vec<CellPos> {
        self.cells
            .iter()
            .filter(|cell| cell.occupant().is_some())
            .map(GridCell::position)
            .collect()
    }

    /// Number of available cells.
    #[must_use]
    pub fn available_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_available()).count()
    }

    /// Number of cells holding a building of `kind`.
    #[must_use]
    pub fn count_kind(&self, kind: BuildingKind) -> usize {
        self.cells
            .iter()
            .filter(|cell| cell.occupant().is_some_and(|b| b.kind() == kind))
            .count()
    }

    // ------------------------------------------------------------------
    // Listeners
    // ------------------------------------------------------------------

    /// Attach a state-change listener.
    pub fn subscribe(&mut self, listener: CellListener) -> ListenerId {
        self.listeners.add(listener)
    }

    /// Detach a listener. Returns `false` if it was not attached.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }
}

/// Inclusive range from `from` to `to` in either direction.
fn axis_range(from: u32, to: u32) -> Box<dyn Iterator<Item = u32>> {
    if from <= to {
        Box::new(from..=to)
    } else {
        Box::new((to..=from).rev())
    }
}
