//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a session produces identical
//! results given the same config seed and the same command sequence.
//!
//! # Sources of non-determinism
//!
//! - **Floating-point math**: world points and time go through
//!   [`room_core::math::Fixed`].
//! - **Unseeded randomness**: seed placement, event selection and unit
//!   paths all draw from the controller's seeded RNG.
//! - **Iteration order**: grids are walked in row-major order, sides in
//!   storage order.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use room_core::controller::ConstructionController;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps simulated.
    pub steps: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic session).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run matched, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Session is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a scenario multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the scenario
/// * `steps` - Number of steps per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance the state by one step
/// * `hash` - Function to compute the state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S, u64),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for index in 0..steps {
            step(&mut state, index);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

/// Hash everything observable about a session: every cell of every side,
/// the ledger, scheduler state and walker positions.
#[must_use]
pub fn session_hash(controller: &ConstructionController) -> u64 {
    let mut hasher = DefaultHasher::new();

    for (side, grid) in controller.room().iter() {
        side.hash(&mut hasher);
        for cell in grid.cells() {
            cell.position().hash(&mut hasher);
            cell.state().hash(&mut hasher);
            cell.occupant().map(|b| b.kind()).hash(&mut hasher);
        }
    }

    let snapshot = controller.ledger().snapshot();
    (
        snapshot.stock,
        snapshot.capacity,
        snapshot.energy,
        snapshot.material,
        snapshot.research,
        snapshot.milestones_completed,
    )
        .hash(&mut hasher);

    let scheduler = controller.scheduler();
    scheduler.pending().hash(&mut hasher);
    scheduler.tick_accumulator().to_bits().hash(&mut hasher);
    scheduler.event_accumulator().to_bits().hash(&mut hasher);
    scheduler.event_interval().to_bits().hash(&mut hasher);

    for walker in controller.walkers() {
        walker.id().hash(&mut hasher);
        walker.position().hash(&mut hasher);
    }
    controller.ticks().hash(&mut hasher);
    controller.is_lost().hash(&mut hasher);

    hasher.finish()
}

/// Compare two sessions step by step, finding the first divergence.
///
/// # Returns
///
/// `None` if the sessions stay identical, `Some(step)` if they diverge
/// after that step (0 means the initial states differ).
pub fn find_first_divergence<Setup, Step>(setup: Setup, step: Step, steps: u64) -> Option<u64>
where
    Setup: Fn() -> ConstructionController,
    Step: Fn(&mut ConstructionController, u64),
{
    let mut first = setup();
    let mut second = setup();

    if session_hash(&first) != session_hash(&second) {
        return Some(0);
    }

    for index in 1..=steps {
        step(&mut first, index);
        step(&mut second, index);

        if session_hash(&first) != session_hash(&second) {
            return Some(index);
        }
    }

    None
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for grid and session inputs.
pub mod strategies {
    use proptest::prelude::*;
    use room_core::cell::CellPos;
    use room_core::math::{Fixed, Vec2Fixed};
    use room_core::scheduler::GameEvent;

    /// Raw grid dimensions, border included.
    pub fn arb_raw_size() -> impl Strategy<Value = (u32, u32)> {
        (3u32..40, 3u32..40)
    }

    /// A cell inside a grid of the given effective size.
    pub fn arb_cell_pos(width: u32, height: u32) -> impl Strategy<Value = CellPos> {
        (0..width, 0..height).prop_map(|(x, y)| CellPos::new(x, y))
    }

    /// World point within `extent` units of the origin, in quarter steps.
    pub fn arb_world_point(extent: i32) -> impl Strategy<Value = Vec2Fixed> {
        let quarters = extent * 4;
        (-quarters..=quarters, -quarters..=quarters).prop_map(|(x, y)| {
            Vec2Fixed::new(
                Fixed::from_num(x) / Fixed::from_num(4),
                Fixed::from_num(y) / Fixed::from_num(4),
            )
        })
    }

    /// Any catalog event with a modest payload.
    pub fn arb_game_event() -> impl Strategy<Value = GameEvent> {
        prop_oneof![
            (1u32..6).prop_map(|count| GameEvent::UnitsArrive { count }),
            (1u32..20).prop_map(|amount| GameEvent::EnergySurge { amount }),
            (1u32..20).prop_map(|amount| GameEvent::EnergyDrain { amount }),
            (1u32..20).prop_map(|amount| GameEvent::MaterialBonus { amount }),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{fixed, small_session};

    #[test]
    fn test_verify_determinism_detects_match() {
        let result = verify_determinism(3, 10, || 0u64, |n, i| *n += i, |n| *n);
        assert!(result.is_deterministic);
        assert_eq!(result.unique_hashes().len(), 1);
    }

    #[test]
    fn test_verify_determinism_detects_mismatch() {
        let counter = std::cell::Cell::new(0u64);
        let result = verify_determinism(
            2,
            1,
            || {
                counter.set(counter.get() + 1);
                counter.get()
            },
            |_, _| {},
            |n| *n,
        );
        assert!(!result.is_deterministic);
    }

    #[test]
    fn test_same_seed_sessions_match() {
        let divergence = find_first_divergence(
            || small_session(21),
            |session, _| session.advance(fixed(1)).unwrap(),
            60,
        );
        assert_eq!(divergence, None);
    }

    #[test]
    fn test_different_seeds_differ() {
        assert_ne!(
            session_hash(&small_session(1)),
            session_hash(&small_session(2))
        );
    }
}
