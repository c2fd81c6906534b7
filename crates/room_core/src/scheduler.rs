//! Tick and event timers.
//!
//! Two independent accumulators advance with elapsed time. The tick timer
//! drives resource accrual and slows down under an energy deficit; the
//! event timer fires the single armed [`GameEvent`] and arms a successor
//! drawn by weight from the catalog.
//!
//! Firings are polled one at a time so the caller can apply each before
//! the next becomes due:
//!
//! ```ignore
//! scheduler.advance(dt);
//! while let Some(firing) = scheduler.poll(ledger.energy(), &mut rng)? {
//!     // apply firing
//! }
//! ```

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{CoreError, Result};
use crate::math::Fixed;

/// A random game event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameEvent {
    /// New units arrive and need housing.
    UnitsArrive {
        /// Number of arriving units.
        count: u32,
    },
    /// Energy rises.
    EnergySurge {
        /// Energy gained.
        amount: u32,
    },
    /// Energy falls.
    EnergyDrain {
        /// Energy lost.
        amount: u32,
    },
    /// One-off construction material bonus.
    MaterialBonus {
        /// Material gained.
        amount: u32,
    },
}

/// Catalog entry: an event and its selection weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedEvent {
    /// Event fired when selected.
    pub event: GameEvent,
    /// Relative selection weight.
    pub weight: u32,
}

/// The standard event catalog.
#[must_use]
pub fn default_catalog() -> Vec<WeightedEvent> {
    vec![
        WeightedEvent {
            event: GameEvent::UnitsArrive { count: 2 },
            weight: 5,
        },
        WeightedEvent {
            event: GameEvent::UnitsArrive { count: 4 },
            weight: 3,
        },
        WeightedEvent {
            event: GameEvent::EnergySurge { amount: 10 },
            weight: 2,
        },
        WeightedEvent {
            event: GameEvent::EnergyDrain { amount: 10 },
            weight: 2,
        },
        WeightedEvent {
            event: GameEvent::MaterialBonus { amount: 15 },
            weight: 1,
        },
    ]
}

/// Tick interval multiplier for the current energy level.
///
/// Energy deficits slow the simulation down instead of failing it.
#[must_use]
pub const fn tick_multiplier(energy: i32) -> u32 {
    if energy < -10 {
        4
    } else if energy < 0 {
        2
    } else {
        1
    }
}

/// Interval settings, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerTiming {
    /// Base tick interval.
    pub tick_interval: Fixed,
    /// Initial event interval.
    pub event_interval: Fixed,
    /// Amount each milestone removes from the event interval.
    pub event_interval_step: Fixed,
    /// Event interval never drops below this.
    pub event_interval_floor: Fixed,
}

impl Default for SchedulerTiming {
    fn default() -> Self {
        Self {
            tick_interval: Fixed::ONE,
            event_interval: Fixed::from_num(20),
            event_interval_step: Fixed::from_num(2),
            event_interval_floor: Fixed::from_num(6),
        }
    }
}

/// What became due on a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Firing {
    /// Periodic resource accrual.
    Tick,
    /// The armed event fired; a successor is already armed.
    Event(GameEvent),
}

/// Tick timer plus a single-slot weighted event timer.
#[derive(Debug, Clone)]
pub struct EventScheduler {
    timing: SchedulerTiming,
    tick_accumulator: Fixed,
    current_tick_interval: Fixed,
    event_accumulator: Fixed,
    event_interval: Fixed,
    pending: Option<GameEvent>,
    catalog: Vec<WeightedEvent>,
    weights: WeightedIndex<u32>,
}

impl EventScheduler {
    /// Create a scheduler and arm its first event.
    pub fn new<R: Rng + ?Sized>(
        timing: SchedulerTiming,
        catalog: Vec<WeightedEvent>,
        rng: &mut R,
    ) -> Result<Self> {
        if timing.tick_interval <= Fixed::ZERO || timing.event_interval <= Fixed::ZERO {
            error!(?timing, "Non-positive scheduler interval");
            return Err(CoreError::InvalidConfig(
                "scheduler intervals must be positive".to_string(),
            ));
        }
        if timing.event_interval_floor <= Fixed::ZERO
            || timing.event_interval_step < Fixed::ZERO
        {
            return Err(CoreError::InvalidConfig(
                "event interval floor must be positive and step non-negative".to_string(),
            ));
        }

        let weights = WeightedIndex::new(catalog.iter().map(|entry| entry.weight))
            .map_err(|err| {
                error!(%err, "Event catalog rejected");
                CoreError::InvalidConfig(format!("event catalog: {err}"))
            })?;

        let mut scheduler = Self {
            timing,
            tick_accumulator: Fixed::ZERO,
            current_tick_interval: timing.tick_interval,
            event_accumulator: Fixed::ZERO,
            event_interval: timing.event_interval,
            pending: None,
            catalog,
            weights,
        };
        scheduler.arm_random(rng);
        Ok(scheduler)
    }

    /// Add elapsed time to both accumulators.
    pub fn advance(&mut self, dt: Fixed) {
        if dt <= Fixed::ZERO {
            return;
        }
        self.tick_accumulator = self.tick_accumulator.saturating_add(dt);
        self.event_accumulator = self.event_accumulator.saturating_add(dt);
    }

    /// Take the next due firing, ticks first.
    ///
    /// Returns `Err(UnarmedEvent)` if the event timer elapses with nothing
    /// armed.
    pub fn poll<R: Rng + ?Sized>(&mut self, energy: i32, rng: &mut R) -> Result<Option<Firing>> {
        if self.tick_accumulator >= self.current_tick_interval {
            self.tick_accumulator -= self.current_tick_interval;
            let multiplier = tick_multiplier(energy);
            self.current_tick_interval = self.timing.tick_interval * Fixed::from_num(multiplier);
            debug!(
                energy,
                multiplier,
                next_interval = %self.current_tick_interval,
                "Tick"
            );
            return Ok(Some(Firing::Tick));
        }

        if self.event_accumulator >= self.event_interval {
            let Some(event) = self.pending.take() else {
                error!(
                    accumulator = %self.event_accumulator,
                    "Event timer elapsed with nothing armed"
                );
                return Err(CoreError::UnarmedEvent);
            };
            self.event_accumulator -= self.event_interval;
            let next = self.arm_random(rng);
            debug!(?event, ?next, "Event fired");
            return Ok(Some(Firing::Event(event)));
        }

        Ok(None)
    }

    /// Arm `event`, replacing and returning any previously armed one.
    pub fn arm(&mut self, event: GameEvent) -> Option<GameEvent> {
        self.pending.replace(event)
    }

    /// Remove the armed event without firing it.
    pub fn disarm(&mut self) -> Option<GameEvent> {
        self.pending.take()
    }

    /// Currently armed event.
    #[must_use]
    pub const fn pending(&self) -> Option<&GameEvent> {
        self.pending.as_ref()
    }

    /// Shorten the event interval by one step, down to the floor.
    pub fn shorten_event_interval(&mut self) -> Fixed {
        let shortened = self.event_interval.saturating_sub(self.timing.event_interval_step);
        self.event_interval = shortened.max(self.timing.event_interval_floor);
        debug!(interval = %self.event_interval, "Event interval shortened");
        self.event_interval
    }

    /// Restore starting intervals, clear accumulators and arm a fresh event.
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.tick_accumulator = Fixed::ZERO;
        self.event_accumulator = Fixed::ZERO;
        self.current_tick_interval = self.timing.tick_interval;
        self.event_interval = self.timing.event_interval;
        self.arm_random(rng);
    }

    /// Interval until the next tick once the current one elapses.
    #[must_use]
    pub const fn current_tick_interval(&self) -> Fixed {
        self.current_tick_interval
    }

    /// Current event interval.
    #[must_use]
    pub const fn event_interval(&self) -> Fixed {
        self.event_interval
    }

    /// Time accumulated toward the next tick.
    #[must_use]
    pub const fn tick_accumulator(&self) -> Fixed {
        self.tick_accumulator
    }

    /// Time accumulated toward the next event.
    #[must_use]
    pub const fn event_accumulator(&self) -> Fixed {
        self.event_accumulator
    }

    fn arm_random<R: Rng + ?Sized>(&mut self, rng: &mut R) -> GameEvent {
        let event = self.catalog[self.weights.sample(rng)].event;
        self.pending = Some(event);
        event
    }
}
