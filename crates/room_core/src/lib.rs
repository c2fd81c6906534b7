//! # Room Core
//!
//! Simulation core of the cube room base-building game.
//!
//! This crate contains **only** the model:
//! - No rendering
//! - No IO beyond loading a config file
//! - No unseeded randomness (one `StdRng` per session, seeded from config)
//! - Fixed-point world math and time
//!
//! Hosts feed abstract world points and elapsed time into a
//! [`controller::ConstructionController`] and drain its events.
//!
//! ## Crate Structure
//!
//! - [`cell`] - Per-cell construction state machine
//! - [`grid`] - Spatial grid: neighbors, line selection, path search
//! - [`room`] - The six sides of the cube room
//! - [`ledger`] - Resource counters and milestones
//! - [`scheduler`] - Tick and weighted event timers
//! - [`controller`] - Construction commands and the session loop
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod buildings;
pub mod cell;
pub mod config;
pub mod controller;
pub mod error;
pub mod grid;
pub mod highlight;
pub mod ledger;
pub mod math;
pub mod room;
pub mod scheduler;
pub mod units;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::buildings::{Building, BuildingCatalog, BuildingData, BuildingKind};
    pub use crate::cell::{CellPos, CellState, GridCell, Placement};
    pub use crate::config::{ConfigError, SimConfig};
    pub use crate::controller::{
        ConstructionController, ConstructionMode, ControllerEvent, DragOutcome, SoundCue,
    };
    pub use crate::error::{CoreError, Result};
    pub use crate::grid::{GridGeometry, SpatialGrid};
    pub use crate::highlight::CellColor;
    pub use crate::ledger::{LedgerSignal, LedgerSnapshot, ResourceLedger, StartingResources};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::room::{Room, RoomSide};
    pub use crate::scheduler::{EventScheduler, Firing, GameEvent, WeightedEvent};
    pub use crate::units::{UnitId, UnitWalker};
}
