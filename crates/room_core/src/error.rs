//! Error types for the room simulation.
//!
//! Only precondition violations are errors. A construction that fails
//! because of cell state or connectivity is an ordinary `false`, and
//! domain signals (overflow, milestones) travel through the ledger.

use thiserror::Error;

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;

/// Top-level error type for all room simulation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Cell coordinates outside the grid.
    #[error("Cell ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        /// Requested column.
        x: i64,
        /// Requested row.
        y: i64,
        /// Grid width in cells.
        width: u32,
        /// Grid height in cells.
        height: u32,
    },

    /// The event timer elapsed with no event armed.
    #[error("Event timer elapsed with no pending event armed")]
    UnarmedEvent,

    /// Seed placement requested on a grid without any available cell.
    #[error("No available cell left for seed placement")]
    GridFull,

    /// A building template violates its value ranges.
    #[error("Invalid building template '{name}': {reason}")]
    InvalidTemplate {
        /// Template name.
        name: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A building kind has no template in the catalog.
    #[error("No building template registered for {0}")]
    UnknownBuilding(String),

    /// Configuration values are inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
