//! Session configuration, loadable from RON.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```ron
//! SimConfig(
//!     grid_width: 12,
//!     grid_height: 12,
//!     seed: 7,
//!     starting: (stock: 0, capacity: 10, energy: 0, material: 40, research: 0),
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::buildings::{BuildingCatalog, BuildingData, BuildingKind};
use crate::error::CoreError;
use crate::grid::{GridGeometry, BORDER_CELLS};
use crate::ledger::StartingResources;
use crate::math::{Fixed, Vec2Fixed};
use crate::scheduler::{default_catalog, SchedulerTiming, WeightedEvent};

/// Error type for configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File not found.
    #[error("Config file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Parsed but inconsistent.
    #[error("Config rejected: {0}")]
    Invalid(#[from] CoreError),
}

/// Largest raw grid edge, border included.
pub const MAX_RAW_GRID: u32 = 1024;

/// Longest walker route requested for arriving units.
pub const MAX_UNIT_PATH: usize = 256;

/// Longest tick or event interval, in seconds.
pub const MAX_INTERVAL_SECONDS: u32 = 86_400;

/// Complete session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Raw grid width, including the 1-cell border on each side.
    pub grid_width: u32,
    /// Raw grid height, including the border.
    pub grid_height: u32,
    /// World size of one cell.
    pub cell_size: f32,
    /// World position of the grid center.
    pub origin: (f32, f32),
    /// Seed for every random draw of the session.
    pub seed: u64,
    /// Base tick interval in seconds.
    pub tick_interval: f32,
    /// Initial event interval in seconds.
    pub event_interval: f32,
    /// Event interval reduction per milestone.
    pub event_interval_step: f32,
    /// Lowest event interval.
    pub event_interval_floor: f32,
    /// Starting ledger values.
    pub starting: StartingResources,
    /// Material gained every tick.
    pub material_per_tick: u32,
    /// Research gained every tick per science building.
    pub research_per_science: u32,
    /// Steps requested when routing arriving units.
    pub unit_path_length: usize,
    /// Unit walking speed in world units per second.
    pub unit_speed: f32,
    /// Weighted random event catalog.
    pub events: Vec<WeightedEvent>,
    /// Building definitions.
    pub buildings: Vec<BuildingData>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            grid_width: 22,
            grid_height: 22,
            cell_size: 1.0,
            origin: (0.0, 0.0),
            seed: 0,
            tick_interval: 1.0,
            event_interval: 20.0,
            event_interval_step: 2.0,
            event_interval_floor: 6.0,
            starting: StartingResources::default(),
            material_per_tick: 1,
            research_per_science: 1,
            unit_path_length: 6,
            unit_speed: 2.0,
            events: default_catalog(),
            buildings: BuildingData::defaults(),
        }
    }
}

impl SimConfig {
    /// Load and validate a config from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Parse and validate a config from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = ron::from_str(ron)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges and catalog completeness.
    pub fn validate(&self) -> Result<(), CoreError> {
        let min_raw = 2 * BORDER_CELLS;
        if self.grid_width <= min_raw || self.grid_height <= min_raw {
            return Err(invalid(format!(
                "raw grid {}x{} leaves no cells inside the border",
                self.grid_width, self.grid_height
            )));
        }
        if self.grid_width > MAX_RAW_GRID || self.grid_height > MAX_RAW_GRID {
            return Err(invalid(format!(
                "raw grid {}x{} exceeds {MAX_RAW_GRID} cells per axis",
                self.grid_width, self.grid_height
            )));
        }
        if self.unit_path_length > MAX_UNIT_PATH {
            return Err(invalid(format!(
                "unit_path_length {} exceeds {MAX_UNIT_PATH}",
                self.unit_path_length
            )));
        }

        let cell_size = fixed_positive("cell_size", self.cell_size)?;
        for (name, value) in [
            ("tick_interval", self.tick_interval),
            ("event_interval", self.event_interval),
            ("event_interval_floor", self.event_interval_floor),
        ] {
            interval(name, value)?;
        }
        let step_in_range = to_fixed(self.event_interval_step)
            .is_some_and(|step| step >= Fixed::ZERO && step <= Fixed::from_num(MAX_INTERVAL_SECONDS));
        if !step_in_range {
            return Err(invalid(format!(
                "event_interval_step must be within 0..={MAX_INTERVAL_SECONDS}, got {}",
                self.event_interval_step
            )));
        }
        fixed_positive("unit_speed", self.unit_speed)?;

        let origin = [self.origin.0, self.origin.1].map(to_fixed);
        let [Some(origin_x), Some(origin_y)] = origin else {
            return Err(invalid(format!("origin {:?} is out of range", self.origin)));
        };
        let extents_fit = [(origin_x, self.grid_width), (origin_y, self.grid_height)]
            .into_iter()
            .all(|(center, raw)| {
                Fixed::from_num(raw / 2 + 1)
                    .checked_mul(cell_size)
                    .is_some_and(|extent| {
                        center.checked_add(extent).is_some() && center.checked_sub(extent).is_some()
                    })
            });
        if !extents_fit {
            return Err(invalid(format!(
                "grid of {}x{} cells of size {} around {:?} leaves the world range",
                self.grid_width, self.grid_height, self.cell_size, self.origin
            )));
        }
        if self.events.iter().all(|entry| entry.weight == 0) {
            return Err(invalid(
                "event catalog needs at least one positive weight".to_string(),
            ));
        }

        let catalog = self.building_catalog()?;
        for kind in BuildingKind::PLAYER_BUILDABLE
            .into_iter()
            .chain(BuildingKind::SEEDS)
        {
            catalog.get(kind)?;
        }
        for kind in BuildingKind::SEEDS {
            if !catalog.get(kind)?.is_grid_connection_source() {
                return Err(invalid(format!("seed building {kind} must be a connection source")));
            }
        }
        Ok(())
    }

    /// World placement of every side grid.
    #[must_use]
    pub fn geometry(&self) -> GridGeometry {
        GridGeometry {
            origin: Vec2Fixed::from_f32(self.origin.0, self.origin.1),
            cell_size: Fixed::from_num(self.cell_size),
        }
    }

    /// Scheduler intervals.
    #[must_use]
    pub fn timing(&self) -> SchedulerTiming {
        SchedulerTiming {
            tick_interval: Fixed::from_num(self.tick_interval),
            event_interval: Fixed::from_num(self.event_interval),
            event_interval_step: Fixed::from_num(self.event_interval_step),
            event_interval_floor: Fixed::from_num(self.event_interval_floor),
        }
    }

    /// Validated building catalog.
    pub fn building_catalog(&self) -> Result<BuildingCatalog, CoreError> {
        BuildingCatalog::from_data(&self.buildings)
    }
}

fn invalid(reason: String) -> CoreError {
    tracing::error!(%reason, "Invalid configuration");
    CoreError::InvalidConfig(reason)
}

fn to_fixed(value: f32) -> Option<Fixed> {
    if value.is_finite() {
        Fixed::checked_from_num(value)
    } else {
        None
    }
}

fn fixed_positive(name: &str, value: f32) -> Result<Fixed, CoreError> {
    match to_fixed(value) {
        Some(fixed) if fixed > Fixed::ZERO => Ok(fixed),
        _ => Err(invalid(format!("{name} must be positive, got {value}"))),
    }
}

fn interval(name: &str, value: f32) -> Result<Fixed, CoreError> {
    let fixed = fixed_positive(name, value)?;
    if fixed > Fixed::from_num(MAX_INTERVAL_SECONDS) {
        return Err(invalid(format!(
            "{name} must not exceed {MAX_INTERVAL_SECONDS} seconds, got {value}"
        )));
    }
    Ok(fixed)
}
