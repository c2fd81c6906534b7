//! Building templates and the catalog the controller builds from.
//!
//! A [`Building`] is a template record, not an instance: every occupied
//! cell holds its own clone of the template it was built from.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Lowest energy delta a template may declare.
pub const MIN_ENERGY_DELTA: i32 = -20;
/// Highest energy delta a template may declare.
pub const MAX_ENERGY_DELTA: i32 = 100;
/// Highest population capacity a template may declare.
pub const MAX_POPULATION_CAPACITY: u32 = 20;

/// Every kind of building that can occupy a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BuildingKind {
    /// Connection line carrying the grid network.
    Bus,
    /// Storage for arriving units.
    Memory,
    /// Generates research each tick.
    Science,
    /// Raises the energy budget.
    EnergyStorage,
    /// Seeded energy source.
    EnergyNode,
    /// Seeded arrival point for units.
    DataNode,
}

impl BuildingKind {
    /// Kinds the player may construct.
    pub const PLAYER_BUILDABLE: [Self; 4] =
        [Self::Bus, Self::Memory, Self::Science, Self::EnergyStorage];

    /// Kinds dropped by seed placement at room setup.
    pub const SEEDS: [Self; 2] = [Self::DataNode, Self::EnergyNode];

    /// One-letter glyph used by text visualizers.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Bus => '+',
            Self::Memory => 'M',
            Self::Science => 'S',
            Self::EnergyStorage => 'E',
            Self::EnergyNode => '#',
            Self::DataNode => '@',
        }
    }
}

impl fmt::Display for BuildingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bus => "bus",
            Self::Memory => "memory",
            Self::Science => "science",
            Self::EnergyStorage => "energy_storage",
            Self::EnergyNode => "energy_node",
            Self::DataNode => "data_node",
        };
        f.write_str(name)
    }
}

/// Immutable building template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Building {
    kind: BuildingKind,
    name: String,
    energy_delta: i32,
    population_capacity: u32,
    is_grid_connection_source: bool,
}

impl Building {
    /// Create a template, validating its value ranges.
    pub fn new(
        kind: BuildingKind,
        name: impl Into<String>,
        energy_delta: i32,
        population_capacity: u32,
        is_grid_connection_source: bool,
    ) -> Result<Self> {
        let name = name.into();
        if !(MIN_ENERGY_DELTA..=MAX_ENERGY_DELTA).contains(&energy_delta) {
            return Err(CoreError::InvalidTemplate {
                name,
                reason: format!(
                    "energy delta {energy_delta} outside {MIN_ENERGY_DELTA}..={MAX_ENERGY_DELTA}"
                ),
            });
        }
        if population_capacity > MAX_POPULATION_CAPACITY {
            return Err(CoreError::InvalidTemplate {
                name,
                reason: format!(
                    "population capacity {population_capacity} above {MAX_POPULATION_CAPACITY}"
                ),
            });
        }

        Ok(Self {
            kind,
            name,
            energy_delta,
            population_capacity,
            is_grid_connection_source,
        })
    }

    /// Building kind.
    #[must_use]
    pub const fn kind(&self) -> BuildingKind {
        self.kind
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Energy added to (or drawn from) the ledger while the building stands.
    #[must_use]
    pub const fn energy_delta(&self) -> i32 {
        self.energy_delta
    }

    /// Capacity added to the ledger while the building stands.
    #[must_use]
    pub const fn population_capacity(&self) -> u32 {
        self.population_capacity
    }

    /// Whether this building extends the connection network.
    #[must_use]
    pub const fn is_grid_connection_source(&self) -> bool {
        self.is_grid_connection_source
    }
}

/// Data-driven building definition, deserialized from RON.
///
/// # Example RON
///
/// ```ron
/// BuildingData(
///     kind: Memory,
///     name: "Memory Bank",
///     energy_delta: -4,
///     population_capacity: 10,
///     is_grid_connection_source: false,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingData {
    /// Kind this definition describes.
    pub kind: BuildingKind,
    /// Display name.
    pub name: String,
    /// Energy delta (-20..=100).
    pub energy_delta: i32,
    /// Population capacity (0..=20).
    #[serde(default)]
    pub population_capacity: u32,
    /// Whether the building extends the connection network.
    #[serde(default)]
    pub is_grid_connection_source: bool,
}

impl BuildingData {
    /// Validate and convert into a template.
    pub fn to_template(&self) -> Result<Building> {
        Building::new(
            self.kind,
            self.name.clone(),
            self.energy_delta,
            self.population_capacity,
            self.is_grid_connection_source,
        )
    }

    /// Default definitions for every building kind.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        let entry = |kind, name: &str, energy_delta, population_capacity, source| Self {
            kind,
            name: name.to_string(),
            energy_delta,
            population_capacity,
            is_grid_connection_source: source,
        };
        vec![
            entry(BuildingKind::Bus, "Bus", -1, 0, true),
            entry(BuildingKind::Memory, "Memory Bank", -4, 10, false),
            entry(BuildingKind::Science, "Science Lab", -8, 2, false),
            entry(BuildingKind::EnergyStorage, "Energy Storage", 20, 0, false),
            entry(BuildingKind::EnergyNode, "Energy Node", 40, 0, true),
            entry(BuildingKind::DataNode, "Data Node", 0, 5, true),
        ]
    }
}

/// Lookup of validated templates by kind.
#[derive(Debug, Clone, Default)]
pub struct BuildingCatalog {
    templates: Vec<Building>,
}

impl BuildingCatalog {
    /// Build a catalog from data records. Later records for the same kind
    /// replace earlier ones.
    pub fn from_data(data: &[BuildingData]) -> Result<Self> {
        let mut catalog = Self::default();
        for record in data {
            catalog.register(record.to_template()?);
        }
        Ok(catalog)
    }

    /// Register a template, replacing any existing one of the same kind.
    pub fn register(&mut self, template: Building) {
        match self.templates.iter_mut().find(|t| t.kind == template.kind) {
            Some(existing) => *existing = template,
            None => self.templates.push(template),
        }
    }

    /// Template for a kind.
    pub fn get(&self, kind: BuildingKind) -> Result<&Building> {
        self.templates
            .iter()
            .find(|t| t.kind == kind)
            .ok_or_else(|| CoreError::UnknownBuilding(kind.to_string()))
    }

    /// Number of registered templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
