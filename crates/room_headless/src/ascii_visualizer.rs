//! ASCII grid visualizer.
//!
//! Renders one side of the room as text for quick terminal review.
//! North (higher y) is at the top.

use room_core::cell::CellState;
use room_core::controller::ConstructionController;
use room_core::grid::SpatialGrid;
use room_core::room::RoomSide;

/// ASCII visualization configuration.
#[derive(Debug, Clone)]
pub struct AsciiConfig {
    /// Show the glyph legend.
    pub show_legend: bool,
    /// Use colored output (ANSI).
    pub use_color: bool,
}

impl Default for AsciiConfig {
    fn default() -> Self {
        Self {
            show_legend: true,
            use_color: true,
        }
    }
}

/// ANSI color codes.
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const GRAY: &str = "\x1b[90m";
    pub const RED: &str = "\x1b[31m";
    pub const YELLOW: &str = "\x1b[33m";
}

/// Glyph and color for a cell state.
fn cell_style(state: CellState) -> &'static str {
    match state {
        CellState::Available => colors::GRAY,
        CellState::Built => colors::RED,
        CellState::Blocked => colors::YELLOW,
    }
}

/// Render a grid as ASCII art.
pub fn render_grid(side: RoomSide, grid: &SpatialGrid, config: &AsciiConfig) -> String {
    let mut output = String::new();
    let width = grid.width() as usize;

    output.push_str(&format!(
        "{}╔══ {} {}x{} ══╗{}\n",
        if config.use_color { colors::BOLD } else { "" },
        side,
        grid.width(),
        grid.height(),
        if config.use_color { colors::RESET } else { "" }
    ));

    output.push('║');
    output.push_str(&"═".repeat(width));
    output.push_str("║\n");

    for y in (0..i64::from(grid.height())).rev() {
        output.push('║');
        for x in 0..i64::from(grid.width()) {
            let Some(cell) = grid.get(x, y) else {
                continue;
            };
            let glyph = cell.occupant().map_or('.', |b| b.kind().glyph());
            if config.use_color {
                output.push_str(cell_style(cell.state()));
                output.push(glyph);
                output.push_str(colors::RESET);
            } else {
                output.push(glyph);
            }
        }
        output.push_str("║\n");
    }

    output.push('╚');
    output.push_str(&"═".repeat(width));
    output.push_str("╝\n");

    if config.show_legend {
        output.push_str(". empty  + bus  M memory  S science  E storage  # energy node  @ data node\n");
    }

    output
}

/// Render the active side of a session with a ledger summary line.
pub fn render_session(controller: &ConstructionController, config: &AsciiConfig) -> String {
    let ledger = controller.ledger().snapshot();
    let mut output = render_grid(controller.active_side(), controller.active_grid(), config);
    output.push_str(&format!(
        "stock {}/{}  energy {}  material {}  research {}%  milestones {}{}\n",
        ledger.stock,
        ledger.capacity,
        ledger.energy,
        ledger.material,
        ledger.research,
        ledger.milestones_completed,
        if controller.is_lost() { "  LOST" } else { "" }
    ));
    output
}

#[cfg(test)]
mod tests {
    use room_core::buildings::{Building, BuildingKind};
    use room_core::cell::{CellPos, Placement};

    use super::*;

    fn plain() -> AsciiConfig {
        AsciiConfig {
            show_legend: false,
            use_color: false,
        }
    }

    #[test]
    fn test_render_empty_grid() {
        let grid = SpatialGrid::new(5, 4);
        let output = render_grid(RoomSide::Floor, &grid, &plain());
        let rows: Vec<&str> = output.lines().collect();
        assert!(rows[0].contains("floor 3x2"));
        assert_eq!(rows[2], "║...║");
        assert_eq!(rows[3], "║...║");
        assert_eq!(rows.len(), 5);
    }

    #[test]
    fn test_north_is_up() {
        let mut grid = SpatialGrid::new(5, 4);
        let node = Building::new(BuildingKind::DataNode, "Data Node", 0, 5, true).unwrap();
        let bus = Building::new(BuildingKind::Bus, "Bus", -1, 0, true).unwrap();
        grid.try_construct(CellPos::new(0, 1), &node, Placement::Seed)
            .unwrap();
        grid.try_construct(CellPos::new(1, 1), &bus, Placement::Player)
            .unwrap();

        let output = render_grid(RoomSide::Ceiling, &grid, &plain());
        let rows: Vec<&str> = output.lines().collect();
        assert_eq!(rows[2], "║@+.║");
        assert_eq!(rows[3], "║...║");
    }

    #[test]
    fn test_color_wraps_glyphs() {
        let grid = SpatialGrid::new(3, 3);
        let output = render_grid(RoomSide::Floor, &grid, &AsciiConfig::default());
        assert!(output.contains("\x1b[90m.\x1b[0m"));
        assert!(output.contains("data node"));
    }
}
