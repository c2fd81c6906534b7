//! Resource ledger: stock, capacity, energy, material and research.
//!
//! Counters are only changed through the add/consume methods. Threshold
//! crossings are queued as [`LedgerSignal`]s for the controller to drain,
//! and every mutation refreshes a display-ready [`LedgerSnapshot`].
//!
//! All calculations use integer math for deterministic simulation.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Research points needed to complete one milestone.
pub const RESEARCH_PER_MILESTONE: u32 = 100;

/// Starting counter values for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartingResources {
    /// Units housed at start.
    pub stock: u32,
    /// Housing capacity at start.
    pub capacity: u32,
    /// Net energy at start.
    pub energy: i32,
    /// Construction material at start.
    pub material: u32,
    /// Research progress at start (0..100).
    pub research: u32,
}

impl Default for StartingResources {
    fn default() -> Self {
        Self {
            stock: 0,
            capacity: 10,
            energy: 0,
            material: 20,
            research: 0,
        }
    }
}

/// Which one-time unlock a milestone granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlockTier {
    /// Granted by the first completed milestone.
    First,
    /// Granted by the second completed milestone.
    Second,
}

/// One-shot domain signals raised by ledger mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerSignal {
    /// Stock exceeded capacity: the session is lost. Raised once.
    Overflow {
        /// Stock at the moment of overflow.
        stock: i32,
        /// Capacity at the moment of overflow.
        capacity: i32,
    },
    /// Research wrapped past 100.
    MilestoneReached {
        /// Milestones completed so far, including this one.
        count: u32,
    },
    /// A milestone granted new construction options.
    Unlock(UnlockTier),
}

/// Display-ready view of the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Units housed.
    pub stock: i32,
    /// Housing capacity.
    pub capacity: i32,
    /// Net energy, may be negative.
    pub energy: i32,
    /// Construction material.
    pub material: i32,
    /// Research progress toward the next milestone (0..100).
    pub research: u32,
    /// Milestones completed.
    pub milestones_completed: u32,
    /// Free housing, negative once overflowing.
    pub free_capacity: i32,
}

/// Session resource counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLedger {
    stock: i32,
    capacity: i32,
    energy: i32,
    material: i32,
    research: u32,
    milestones_completed: u32,
    overflow_reported: bool,
    signals: Vec<LedgerSignal>,
    snapshot: LedgerSnapshot,
}

impl ResourceLedger {
    /// Create a ledger with starting values.
    #[must_use]
    pub fn new(start: StartingResources) -> Self {
        let mut ledger = Self {
            stock: start.stock as i32,
            capacity: start.capacity as i32,
            energy: start.energy,
            material: start.material as i32,
            research: 0,
            milestones_completed: 0,
            overflow_reported: false,
            signals: Vec::new(),
            snapshot: LedgerSnapshot::default(),
        };
        ledger.add_research(start.research);
        ledger.check_overflow();
        ledger.refresh();
        ledger
    }

    /// Units housed.
    #[must_use]
    pub const fn stock(&self) -> i32 {
        self.stock
    }

    /// Housing capacity.
    #[must_use]
    pub const fn capacity(&self) -> i32 {
        self.capacity
    }

    /// Net energy.
    #[must_use]
    pub const fn energy(&self) -> i32 {
        self.energy
    }

    /// Construction material; also the per-drag placement budget.
    #[must_use]
    pub const fn material(&self) -> i32 {
        self.material
    }

    /// Research progress toward the next milestone.
    #[must_use]
    pub const fn research(&self) -> u32 {
        self.research
    }

    /// Milestones completed.
    #[must_use]
    pub const fn milestones_completed(&self) -> u32 {
        self.milestones_completed
    }

    /// Whether stock currently exceeds capacity.
    #[must_use]
    pub const fn is_overflowing(&self) -> bool {
        self.stock > self.capacity
    }

    /// Latest display snapshot.
    #[must_use]
    pub const fn snapshot(&self) -> &LedgerSnapshot {
        &self.snapshot
    }

    /// Take all queued signals, oldest first.
    pub fn drain_signals(&mut self) -> Vec<LedgerSignal> {
        std::mem::take(&mut self.signals)
    }

    /// Add arriving units.
    pub fn add_stock(&mut self, amount: u32) {
        self.stock = self.stock.saturating_add(amount as i32);
        self.check_overflow();
        self.refresh();
    }

    /// Raise housing capacity.
    pub fn add_capacity(&mut self, amount: u32) {
        self.capacity = self.capacity.saturating_add(amount as i32);
        self.refresh();
    }

    /// Lower housing capacity, clamped at zero.
    pub fn remove_capacity(&mut self, amount: u32) {
        self.capacity = (self.capacity - amount as i32).max(0);
        self.check_overflow();
        self.refresh();
    }

    /// Raise net energy.
    pub fn add_energy(&mut self, amount: u32) {
        self.energy = self.energy.saturating_add(amount as i32);
        self.refresh();
    }

    /// Lower net energy. Energy may go negative.
    pub fn consume_energy(&mut self, amount: u32) {
        self.energy = self.energy.saturating_sub(amount as i32);
        self.refresh();
    }

    /// Apply a signed energy delta from a building template.
    pub fn apply_energy_delta(&mut self, delta: i32) {
        if delta >= 0 {
            self.add_energy(delta.unsigned_abs());
        } else {
            self.consume_energy(delta.unsigned_abs());
        }
    }

    /// Add construction material.
    pub fn add_material(&mut self, amount: u32) {
        self.material = self.material.saturating_add(amount as i32);
        self.refresh();
    }

    /// Spend material, clamped at zero. Returns the amount actually spent.
    pub fn consume_material(&mut self, amount: u32) -> u32 {
        let spent = (amount as i32).min(self.material);
        self.material -= spent;
        self.refresh();
        spent as u32
    }

    /// Add research, completing milestones every 100 points.
    pub fn add_research(&mut self, amount: u32) {
        self.research = self.research.saturating_add(amount);
        while self.research >= RESEARCH_PER_MILESTONE {
            self.research -= RESEARCH_PER_MILESTONE;
            self.milestones_completed += 1;
            let count = self.milestones_completed;
            info!(count, carry = self.research, "Research milestone completed");
            self.signals.push(LedgerSignal::MilestoneReached { count });

            let unlock = match count {
                1 => Some(UnlockTier::First),
                2 => Some(UnlockTier::Second),
                _ => None,
            };
            if let Some(tier) = unlock {
                self.signals.push(LedgerSignal::Unlock(tier));
            }
        }
        self.refresh();
    }

    fn check_overflow(&mut self) {
        if self.overflow_reported || !self.is_overflowing() {
            return;
        }
        self.overflow_reported = true;
        warn!(
            stock = self.stock,
            capacity = self.capacity,
            "Stock exceeded capacity"
        );
        self.signals.push(LedgerSignal::Overflow {
            stock: self.stock,
            capacity: self.capacity,
        });
    }

    fn refresh(&mut self) {
        self.snapshot = LedgerSnapshot {
            stock: self.stock,
            capacity: self.capacity,
            energy: self.energy,
            material: self.material,
            research: self.research,
            milestones_completed: self.milestones_completed,
            free_capacity: self.capacity - self.stock,
        };
        debug!(snapshot = ?self.snapshot, "Ledger updated");
    }
}

impl Default for ResourceLedger {
    fn default() -> Self {
        Self::new(StartingResources::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty() -> ResourceLedger {
        ResourceLedger::new(StartingResources {
            stock: 0,
            capacity: 10,
            energy: 0,
            material: 0,
            research: 0,
        })
    }

    #[test]
    fn test_material_clamps_at_zero() {
        let mut ledger = empty();
        ledger.add_material(5);
        assert_eq!(ledger.consume_material(8), 5);
        assert_eq!(ledger.material(), 0);
    }

    #[test]
    fn test_energy_may_go_negative() {
        let mut ledger = empty();
        ledger.add_energy(5);
        ledger.consume_energy(20);
        assert_eq!(ledger.energy(), -15);

        ledger.apply_energy_delta(40);
        assert_eq!(ledger.energy(), 25);
        ledger.apply_energy_delta(-8);
        assert_eq!(ledger.energy(), 17);
    }

    #[test]
    fn test_research_wraps_with_carry() {
        let mut ledger = empty();
        ledger.add_research(95);
        assert!(ledger.drain_signals().is_empty());

        ledger.add_research(10);
        assert_eq!(ledger.research(), 5);
        assert_eq!(ledger.milestones_completed(), 1);

        let signals = ledger.drain_signals();
        let unlocks: Vec<_> = signals
            .iter()
            .filter(|s| matches!(s, LedgerSignal::Unlock(UnlockTier::First)))
            .collect();
        assert_eq!(unlocks.len(), 1);
        assert!(signals.contains(&LedgerSignal::MilestoneReached { count: 1 }));

        // Drained: not reported again
        assert!(ledger.drain_signals().is_empty());
    }

    #[test]
    fn test_large_research_gain_completes_several_milestones() {
        let mut ledger = empty();
        ledger.add_research(250);
        assert_eq!(ledger.research(), 50);
        assert_eq!(ledger.milestones_completed(), 2);
        assert_eq!(
            ledger.drain_signals(),
            vec![
                LedgerSignal::MilestoneReached { count: 1 },
                LedgerSignal::Unlock(UnlockTier::First),
                LedgerSignal::MilestoneReached { count: 2 },
                LedgerSignal::Unlock(UnlockTier::Second),
            ]
        );

        // Third milestone unlocks nothing new
        ledger.add_research(50);
        assert_eq!(
            ledger.drain_signals(),
            vec![LedgerSignal::MilestoneReached { count: 3 }]
        );
    }

    #[test]
    fn test_overflow_reported_once() {
        let mut ledger = empty();
        ledger.add_stock(10);
        assert!(ledger.drain_signals().is_empty());

        ledger.add_stock(1);
        assert_eq!(
            ledger.drain_signals(),
            vec![LedgerSignal::Overflow {
                stock: 11,
                capacity: 10
            }]
        );
        // Stock is not reset and the signal does not repeat
        ledger.add_stock(3);
        assert_eq!(ledger.stock(), 14);
        assert!(ledger.drain_signals().is_empty());
    }

    #[test]
    fn test_capacity_loss_can_overflow() {
        let mut ledger = empty();
        ledger.add_stock(8);
        ledger.remove_capacity(5);
        assert_eq!(ledger.capacity(), 5);
        assert!(matches!(
            ledger.drain_signals().as_slice(),
            [LedgerSignal::Overflow { stock: 8, capacity: 5 }]
        ));

        ledger.remove_capacity(50);
        assert_eq!(ledger.capacity(), 0);
    }

    #[test]
    fn test_snapshot_tracks_every_mutation() {
        let mut ledger = empty();
        ledger.add_capacity(5);
        ledger.add_stock(3);
        ledger.add_material(7);
        ledger.consume_energy(2);

        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.capacity, 15);
        assert_eq!(snapshot.stock, 3);
        assert_eq!(snapshot.free_capacity, 12);
        assert_eq!(snapshot.material, 7);
        assert_eq!(snapshot.energy, -2);
    }

    #[test]
    fn test_starting_research_past_threshold() {
        let ledger = ResourceLedger::new(StartingResources {
            research: 120,
            ..StartingResources::default()
        });
        assert_eq!(ledger.research(), 20);
        assert_eq!(ledger.milestones_completed(), 1);
    }
}
