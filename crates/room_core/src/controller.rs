//! Construction controller: the composition root of a session.
//!
//! The controller owns the room, the ledger, the scheduler and the session
//! RNG. Hosts drive it with construction commands and `advance(dt)`, then
//! drain [`ControllerEvent`]s for rendering, audio and UI.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::buildings::{BuildingCatalog, BuildingKind};
use crate::cell::{CellPos, Placement};
use crate::config::SimConfig;
use crate::error::Result;
use crate::grid::{CellListener, ListenerId, SpatialGrid};
use crate::highlight::{default_color, selection_color, CellColor};
use crate::ledger::{LedgerSignal, LedgerSnapshot, ResourceLedger, UnlockTier};
use crate::math::{Fixed, Vec2Fixed};
use crate::room::{Room, RoomSide};
use crate::scheduler::{EventScheduler, Firing, GameEvent};
use crate::units::{UnitId, UnitWalker};

/// Active construction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructionMode {
    /// Nothing selected; drags are ignored.
    #[default]
    None,
    /// Mode A: connection lines.
    Bus,
    /// Mode B: unit storage.
    Memory,
    /// Mode C: research.
    Science,
    /// Mode D: energy.
    EnergyStorage,
    /// Demolish player-built cells.
    Destroy,
}

impl ConstructionMode {
    /// Modes available when a session starts.
    pub const STARTING: [Self; 3] = [Self::Bus, Self::Memory, Self::Destroy];

    /// Building placed by this mode, if it builds.
    #[must_use]
    pub const fn building_kind(self) -> Option<BuildingKind> {
        match self {
            Self::Bus => Some(BuildingKind::Bus),
            Self::Memory => Some(BuildingKind::Memory),
            Self::Science => Some(BuildingKind::Science),
            Self::EnergyStorage => Some(BuildingKind::EnergyStorage),
            Self::None | Self::Destroy => None,
        }
    }

    /// Mode granted by a milestone unlock.
    #[must_use]
    pub const fn unlocked_by(tier: UnlockTier) -> Self {
        match tier {
            UnlockTier::First => Self::Science,
            UnlockTier::Second => Self::EnergyStorage,
        }
    }
}

/// Audio cue for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundCue {
    /// Something was built.
    Place,
    /// Something was demolished.
    Destroy,
    /// An event fired or a mode unlocked.
    Message,
    /// The active side changed.
    Rotate,
}

/// Notifications queued for the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControllerEvent {
    /// Recolor one cell.
    CellHighlight {
        /// Side the cell belongs to.
        side: RoomSide,
        /// Cell position.
        position: CellPos,
        /// New color.
        color: CellColor,
    },
    /// The active side changed; every cell color follows.
    GridRebuilt {
        /// New active side.
        side: RoomSide,
    },
    /// Play a sound.
    Sound {
        /// Cue to play.
        cue: SoundCue,
    },
    /// A construction mode became available.
    Unlocked {
        /// The unlocked mode.
        mode: ConstructionMode,
    },
    /// A research milestone completed.
    MilestoneReached {
        /// Milestones completed so far.
        count: u32,
    },
    /// Stock exceeded capacity. The session is paused.
    GameLost {
        /// Stock at the time of loss.
        stock: i32,
        /// Capacity at the time of loss.
        capacity: i32,
    },
    /// A random event fired.
    EventFired {
        /// The fired event.
        event: GameEvent,
    },
    /// Arriving units started walking.
    UnitsDispatched {
        /// Walker id.
        unit: UnitId,
        /// Units in the group.
        count: u32,
        /// Waypoints on the active side.
        path: Vec<Vec2Fixed>,
    },
    /// A walker reached the end of its path.
    UnitsArrived {
        /// Walker id.
        unit: UnitId,
    },
    /// Ledger values changed.
    LedgerChanged {
        /// Current values.
        snapshot: LedgerSnapshot,
    },
}

/// Result of a completed drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragOutcome {
    /// Mode the drag ran in.
    pub mode: ConstructionMode,
    /// Cells a construction or demolition was attempted on.
    pub attempted: usize,
    /// Cells that changed state.
    pub succeeded: usize,
    /// Material consumed.
    pub material_spent: u32,
}

#[derive(Debug, Clone)]
struct DragState {
    start: Vec2Fixed,
    current: Vec2Fixed,
    highlighted: Vec<CellPos>,
}

/// Session state and command surface.
#[derive(Debug)]
pub struct ConstructionController {
    config: SimConfig,
    catalog: BuildingCatalog,
    room: Room,
    active_side: RoomSide,
    ledger: ResourceLedger,
    scheduler: EventScheduler,
    rng: StdRng,
    mode: ConstructionMode,
    unlocked: Vec<ConstructionMode>,
    drag: Option<DragState>,
    paused: bool,
    lost: bool,
    walkers: Vec<UnitWalker>,
    next_unit: u64,
    events: Vec<ControllerEvent>,
    elapsed: Fixed,
    ticks: u64,
}

impl ConstructionController {
    /// Set up a session: validate the config, seed every side and arm the
    /// first event.
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;
        let catalog = config.building_catalog()?;
        let mut rng = StdRng::seed_from_u64(config.seed);

        let mut room = Room::new(config.grid_width, config.grid_height, config.geometry());
        let seeds = BuildingKind::SEEDS
            .into_iter()
            .map(|kind| catalog.get(kind).cloned())
            .collect::<Result<Vec<_>>>()?;
        room.seed_all(&seeds, &mut rng)?;

        let scheduler = EventScheduler::new(config.timing(), config.events.clone(), &mut rng)?;
        let ledger = ResourceLedger::new(config.starting);

        info!(
            seed = config.seed,
            width = config.grid_width,
            height = config.grid_height,
            "Session started"
        );

        let mut controller = Self {
            config,
            catalog,
            room,
            active_side: RoomSide::default(),
            ledger,
            scheduler,
            rng,
            mode: ConstructionMode::None,
            unlocked: ConstructionMode::STARTING.to_vec(),
            drag: None,
            paused: false,
            lost: false,
            walkers: Vec::new(),
            next_unit: 0,
            events: Vec::new(),
            elapsed: Fixed::ZERO,
            ticks: 0,
        };
        controller.rebuild_active_side();
        controller.handle_ledger_signals();
        controller.push_snapshot();
        Ok(controller)
    }

    /// Throw the session away and start again from the same config.
    pub fn restart(&mut self) -> Result<()> {
        let fresh = Self::new(self.config.clone())?;
        *self = fresh;
        info!("Session restarted");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Session configuration.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Validated building templates.
    #[must_use]
    pub const fn catalog(&self) -> &BuildingCatalog {
        &self.catalog
    }

    /// All six sides.
    #[must_use]
    pub const fn room(&self) -> &Room {
        &self.room
    }

    /// Side drags apply to.
    #[must_use]
    pub const fn active_side(&self) -> RoomSide {
        self.active_side
    }

    /// Grid of the active side.
    #[must_use]
    pub fn active_grid(&self) -> &SpatialGrid {
        self.room.side(self.active_side)
    }

    /// Resource counters.
    #[must_use]
    pub const fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    /// Tick and event timers.
    #[must_use]
    pub const fn scheduler(&self) -> &EventScheduler {
        &self.scheduler
    }

    /// Current construction mode.
    #[must_use]
    pub const fn mode(&self) -> ConstructionMode {
        self.mode
    }

    /// Whether a mode may be selected.
    #[must_use]
    pub fn is_unlocked(&self, mode: ConstructionMode) -> bool {
        mode == ConstructionMode::None || self.unlocked.contains(&mode)
    }

    /// Unlocked modes in unlock order.
    #[must_use]
    pub fn unlocked_modes(&self) -> &[ConstructionMode] {
        &self.unlocked
    }

    /// Whether a drag is in progress.
    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// World point the current drag started at.
    #[must_use]
    pub fn drag_start(&self) -> Option<Vec2Fixed> {
        self.drag.as_ref().map(|drag| drag.start)
    }

    /// Whether time is frozen.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether the session has been lost.
    #[must_use]
    pub const fn is_lost(&self) -> bool {
        self.lost
    }

    /// Walkers still on their way.
    #[must_use]
    pub fn walkers(&self) -> &[UnitWalker] {
        &self.walkers
    }

    /// Unpaused time simulated so far.
    #[must_use]
    pub const fn elapsed(&self) -> Fixed {
        self.elapsed
    }

    /// Ticks processed so far.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Events queued since the last drain.
    #[must_use]
    pub fn pending_events(&self) -> &[ControllerEvent] {
        &self.events
    }

    /// Take all queued events, oldest first.
    pub fn drain_events(&mut self) -> Vec<ControllerEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Select a construction mode. Locked modes are refused.
    pub fn set_mode(&mut self, mode: ConstructionMode) -> bool {
        if !self.is_unlocked(mode) {
            warn!(?mode, "Construction mode is locked");
            return false;
        }
        if self.mode != mode {
            self.cancel();
            debug!(?mode, "Construction mode set");
        }
        self.mode = mode;
        true
    }

    /// Start a drag at a world point on the active side.
    pub fn begin_drag(&mut self, point: Vec2Fixed) -> bool {
        if self.paused || self.lost {
            warn!(paused = self.paused, lost = self.lost, "Drag refused while halted");
            return false;
        }
        if self.mode == ConstructionMode::None {
            debug!("Drag ignored without a construction mode");
            return false;
        }
        self.cancel();
        self.drag = Some(DragState {
            start: point,
            current: point,
            highlighted: Vec::new(),
        });
        self.highlight_selection();
        true
    }

    /// Move the drag end point, refreshing the selection highlight.
    pub fn update_drag(&mut self, point: Vec2Fixed) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        drag.current = point;
        self.clear_selection();
        self.highlight_selection();
    }

    /// Finish the drag at `point` and apply it.
    ///
    /// Returns `Ok(None)` when no drag was in progress.
    pub fn end_drag(&mut self, point: Vec2Fixed) -> Result<Option<DragOutcome>> {
        if self.drag.is_none() {
            return Ok(None);
        }
        self.clear_selection();
        let Some(drag) = self.drag.take() else {
            return Ok(None);
        };

        let outcome = match self.mode.building_kind() {
            Some(kind) => self.build_line(kind, drag.start, point)?,
            None if self.mode == ConstructionMode::Destroy => {
                self.demolish_line(drag.start, point)?
            }
            None => return Ok(None),
        };

        debug!(
            mode = ?outcome.mode,
            attempted = outcome.attempted,
            succeeded = outcome.succeeded,
            material_spent = outcome.material_spent,
            "Drag applied"
        );
        if outcome.succeeded > 0 {
            self.handle_ledger_signals();
            self.push_snapshot();
        }
        Ok(Some(outcome))
    }

    /// Abort the drag without applying it.
    pub fn cancel(&mut self) {
        if self.drag.is_some() {
            self.clear_selection();
            self.drag = None;
        }
    }

    /// Switch the side drags apply to.
    pub fn set_active_side(&mut self, side: RoomSide) {
        self.cancel();
        self.active_side = side;
        self.rebuild_active_side();
        self.events.push(ControllerEvent::Sound {
            cue: SoundCue::Rotate,
        });
        debug!(%side, "Active side changed");
    }

    /// Freeze or resume time. A lost session stays paused.
    pub fn set_paused(&mut self, paused: bool) {
        if !paused && self.lost {
            warn!("Cannot resume a lost session");
            return;
        }
        if paused {
            self.cancel();
        }
        self.paused = paused;
    }

    /// Attach a cell listener to one side.
    pub fn subscribe(&mut self, side: RoomSide, listener: CellListener) -> ListenerId {
        self.room.side_mut(side).subscribe(listener)
    }

    /// Detach a cell listener from one side.
    pub fn unsubscribe(&mut self, side: RoomSide, id: ListenerId) -> bool {
        self.room.side_mut(side).unsubscribe(id)
    }

    // ------------------------------------------------------------------
    // Simulation
    // ------------------------------------------------------------------

    /// Advance the session by `dt` seconds.
    ///
    /// Does nothing while paused. Due ticks and events are applied in
    /// order; a loss stops processing for the rest of the step. One
    /// `LedgerChanged` event is queued per call, however many firings ran.
    pub fn advance(&mut self, dt: Fixed) -> Result<()> {
        if self.paused || self.lost || dt <= Fixed::ZERO {
            return Ok(());
        }
        self.elapsed = self.elapsed.saturating_add(dt);
        self.scheduler.advance(dt);

        let mut fired = false;
        while let Some(firing) = self.scheduler.poll(self.ledger.energy(), &mut self.rng)? {
            fired = true;
            match firing {
                Firing::Tick => self.accrue_tick(),
                Firing::Event(event) => self.apply_event_effect(event),
            }
            self.handle_ledger_signals();
            if self.lost {
                break;
            }
        }
        if fired {
            self.push_snapshot();
        }

        self.advance_walkers(dt);
        Ok(())
    }

    /// Periodic accrual: material, and research from every science
    /// building in the room.
    pub fn process_tick(&mut self) {
        self.accrue_tick();
        self.handle_ledger_signals();
        self.push_snapshot();
    }

    fn accrue_tick(&mut self) {
        self.ticks += 1;
        self.ledger.add_material(self.config.material_per_tick);

        let labs: usize = self
            .room
            .iter()
            .map(|(_, grid)| grid.count_kind(BuildingKind::Science))
            .sum();
        let research = labs as u32 * self.config.research_per_science;
        if research > 0 {
            self.ledger.add_research(research);
        }

        debug!(tick = self.ticks, labs, research, "Tick processed");
    }

    /// Apply a random event's effect.
    pub fn apply_event(&mut self, event: GameEvent) {
        self.apply_event_effect(event);
        self.handle_ledger_signals();
        self.push_snapshot();
    }

    fn apply_event_effect(&mut self, event: GameEvent) {
        info!(?event, "Event fired");
        self.events.push(ControllerEvent::EventFired { event });
        self.events.push(ControllerEvent::Sound {
            cue: SoundCue::Message,
        });

        match event {
            GameEvent::UnitsArrive { count } => {
                self.ledger.add_stock(count);
                self.dispatch_units(count);
            }
            GameEvent::EnergySurge { amount } => self.ledger.add_energy(amount),
            GameEvent::EnergyDrain { amount } => self.ledger.consume_energy(amount),
            GameEvent::MaterialBonus { amount } => self.ledger.add_material(amount),
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn build_line(
        &mut self,
        kind: BuildingKind,
        start: Vec2Fixed,
        end: Vec2Fixed,
    ) -> Result<DragOutcome> {
        let template = self.catalog.get(kind)?.clone();
        let side = self.active_side;
        let grid = self.room.side_mut(side);

        let mut line: Vec<CellPos> = grid
            .cells_between(start, end, true)
            .iter()
            .map(|cell| cell.position())
            .collect();
        let budget = self.ledger.material().max(0) as usize;
        line.truncate(budget);

        let mut succeeded = 0;
        for &pos in &line {
            if !grid.try_construct(pos, &template, Placement::Player)? {
                continue;
            }
            succeeded += 1;
            self.ledger.add_capacity(template.population_capacity());
            self.ledger.apply_energy_delta(template.energy_delta());
            self.events.push(ControllerEvent::CellHighlight {
                side,
                position: pos,
                color: CellColor::Built,
            });
        }

        let material_spent = self.ledger.consume_material(succeeded as u32);
        if succeeded > 0 {
            self.events.push(ControllerEvent::Sound {
                cue: SoundCue::Place,
            });
        }

        Ok(DragOutcome {
            mode: self.mode,
            attempted: line.len(),
            succeeded,
            material_spent,
        })
    }

    fn demolish_line(&mut self, start: Vec2Fixed, end: Vec2Fixed) -> Result<DragOutcome> {
        let side = self.active_side;
        let grid = self.room.side_mut(side);

        let line: Vec<CellPos> = grid
            .cells_between(start, end, false)
            .iter()
            .map(|cell| cell.position())
            .collect();

        let mut succeeded = 0;
        for &pos in &line {
            let Some(building) = grid.demolish(pos)? else {
                continue;
            };
            succeeded += 1;
            self.ledger.remove_capacity(building.population_capacity());
            self.ledger.apply_energy_delta(-building.energy_delta());
            self.events.push(ControllerEvent::CellHighlight {
                side,
                position: pos,
                color: CellColor::Empty,
            });
        }

        if succeeded > 0 {
            self.events.push(ControllerEvent::Sound {
                cue: SoundCue::Destroy,
            });
        }

        Ok(DragOutcome {
            mode: ConstructionMode::Destroy,
            attempted: line.len(),
            succeeded,
            material_spent: 0,
        })
    }

    fn highlight_selection(&mut self) {
        let Some(drag) = self.drag.as_ref() else {
            return;
        };
        let (start, current) = (drag.start, drag.current);
        let demolishing = self.mode == ConstructionMode::Destroy;
        let side = self.active_side;

        let mut highlighted = Vec::new();
        for cell in self.room.side(side).cells_between(start, current, false) {
            self.events.push(ControllerEvent::CellHighlight {
                side,
                position: cell.position(),
                color: selection_color(cell.state(), demolishing),
            });
            highlighted.push(cell.position());
        }

        if let Some(drag) = self.drag.as_mut() {
            drag.highlighted = highlighted;
        }
    }

    fn clear_selection(&mut self) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        let side = self.active_side;
        let grid = self.room.side(side);
        for pos in std::mem::take(&mut drag.highlighted) {
            if let Some(cell) = grid.get(pos.x.into(), pos.y.into()) {
                self.events.push(ControllerEvent::CellHighlight {
                    side,
                    position: pos,
                    color: default_color(cell.state()),
                });
            }
        }
    }

    fn rebuild_active_side(&mut self) {
        let side = self.active_side;
        self.events.push(ControllerEvent::GridRebuilt { side });
        for cell in self.room.side(side).cells() {
            self.events.push(ControllerEvent::CellHighlight {
                side,
                position: cell.position(),
                color: default_color(cell.state()),
            });
        }
    }

    fn dispatch_units(&mut self, count: u32) {
        let path = self
            .room
            .side(self.active_side)
            .random_connected_path(self.config.unit_path_length, &mut self.rng);
        let unit = UnitId(self.next_unit);
        let speed = Fixed::from_num(self.config.unit_speed);

        let Some(walker) = UnitWalker::new(unit, path.clone(), speed) else {
            debug!(count, waypoints = path.len(), "Arrival path too short to walk");
            return;
        };
        self.next_unit += 1;
        self.walkers.push(walker);
        self.events
            .push(ControllerEvent::UnitsDispatched { unit, count, path });
    }

    fn advance_walkers(&mut self, dt: Fixed) {
        let events = &mut self.events;
        self.walkers.retain_mut(|walker| {
            if walker.advance(dt) {
                events.push(ControllerEvent::UnitsArrived { unit: walker.id() });
                false
            } else {
                true
            }
        });
    }

    fn handle_ledger_signals(&mut self) {
        for signal in self.ledger.drain_signals() {
            match signal {
                LedgerSignal::Overflow { stock, capacity } => {
                    warn!(stock, capacity, "Session lost: stock exceeded capacity");
                    self.cancel();
                    self.lost = true;
                    self.paused = true;
                    self.events
                        .push(ControllerEvent::GameLost { stock, capacity });
                }
                LedgerSignal::MilestoneReached { count } => {
                    let interval = self.scheduler.shorten_event_interval();
                    info!(count, %interval, "Milestone reached");
                    self.events.push(ControllerEvent::MilestoneReached { count });
                }
                LedgerSignal::Unlock(tier) => {
                    let mode = ConstructionMode::unlocked_by(tier);
                    if self.unlocked.contains(&mode) {
                        continue;
                    }
                    info!(?mode, "Construction mode unlocked");
                    self.unlocked.push(mode);
                    self.events.push(ControllerEvent::Unlocked { mode });
                    self.events.push(ControllerEvent::Sound {
                        cue: SoundCue::Message,
                    });
                }
            }
        }
    }

    fn push_snapshot(&mut self) {
        self.events.push(ControllerEvent::LedgerChanged {
            snapshot: *self.ledger.snapshot(),
        });
    }
}
