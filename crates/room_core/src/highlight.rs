//! Cell color commands for the render sink.

use serde::{Deserialize, Serialize};

use crate::cell::CellState;

/// Abstract highlight color of a cell; the renderer picks the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellColor {
    /// Empty, buildable cell.
    Empty,
    /// Player-built cell.
    Built,
    /// Seeded cell.
    Generated,
    /// Part of the current build selection.
    Selected,
    /// Part of the current demolition selection.
    MarkedForDemolition,
}

/// Color of a cell outside any selection.
#[must_use]
pub const fn default_color(state: CellState) -> CellColor {
    match state {
        CellState::Available => CellColor::Empty,
        CellState::Built => CellColor::Built,
        CellState::Blocked => CellColor::Generated,
    }
}

/// Color of a cell inside the current drag selection.
#[must_use]
pub const fn selection_color(state: CellState, demolishing: bool) -> CellColor {
    match state {
        CellState::Available => CellColor::Selected,
        CellState::Built if demolishing => CellColor::MarkedForDemolition,
        CellState::Built => CellColor::Built,
        CellState::Blocked => CellColor::Generated,
    }
}
