//! JSON protocol for headless session control.
//!
//! The runner communicates via JSON lines (one JSON object per line):
//!
//! **Input (stdin or script file):** construction and time commands
//! **Output (stdout):** acknowledgments, queued controller events, state
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","seed":0}
//! -> {"cmd":"set_mode","mode":"bus"}
//! <- {"type":"ack","cmd":"set_mode"}
//! -> {"cmd":"begin_drag","x":-3.5,"y":0.5}
//! <- {"type":"ack","cmd":"begin_drag"}
//! <- {"type":"events","events":[{"type":"cell_highlight",...}]}
//! -> {"cmd":"end_drag","x":0.5,"y":0.5}
//! <- {"type":"ack","cmd":"end_drag","outcome":{"mode":"bus","attempted":4,...}}
//! -> {"cmd":"advance","seconds":5.0}
//! <- {"type":"ack","cmd":"advance"}
//! <- {"type":"events","events":[...]}
//! -> {"cmd":"quit"}
//! <- {"type":"bye"}
//! ```

use room_core::controller::{ConstructionMode, ControllerEvent, DragOutcome};
use room_core::ledger::LedgerSnapshot;
use room_core::math::{Fixed, Vec2Fixed};
use room_core::room::RoomSide;
use room_core::scheduler::GameEvent;
use serde::{Deserialize, Serialize};

/// Protocol version reported in the ready message.
pub const PROTOCOL_VERSION: &str = "1.0";

// ============================================================================
// Input Commands (client -> runner)
// ============================================================================

/// Commands accepted by the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Select a construction mode.
    SetMode { mode: ConstructionMode },

    /// Start a drag at a world point on the active side.
    BeginDrag { x: f64, y: f64 },

    /// Move the drag end point.
    UpdateDrag { x: f64, y: f64 },

    /// Finish the drag and apply it.
    EndDrag { x: f64, y: f64 },

    /// Abort the drag.
    Cancel,

    /// Advance simulated time (default: 1 second).
    Advance {
        #[serde(default = "default_seconds")]
        seconds: f64,
    },

    /// Switch the active side.
    Side { side: RoomSide },

    /// Pause or resume.
    Pause { paused: bool },

    /// Report session state without advancing time.
    Query,

    /// Render the active side as text.
    Ascii,

    /// Start the session over from its config.
    Restart,

    /// Quit the runner.
    Quit,
}

fn default_seconds() -> f64 {
    1.0
}

// ============================================================================
// Output Responses (runner -> client)
// ============================================================================

/// Responses written by the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept commands.
    Ready { version: String, seed: u64 },

    /// Acknowledgment of a command.
    Ack {
        cmd: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        outcome: Option<DragOutcome>,
    },

    /// Error processing a command.
    Error {
        message: String,
        cmd: Option<String>,
    },

    /// Current session state.
    State(SessionState),

    /// Controller events queued since the last flush.
    Events { events: Vec<ControllerEvent> },

    /// Text rendering of a side.
    Ascii { side: RoomSide, grid: String },

    /// Goodbye message before shutdown.
    Bye,
}

/// Session summary returned by `query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Simulated seconds.
    pub elapsed: f64,
    /// Ticks processed.
    pub ticks: u64,
    /// Active side.
    pub side: RoomSide,
    /// Active construction mode.
    pub mode: ConstructionMode,
    /// Modes that may be selected.
    pub unlocked: Vec<ConstructionMode>,
    /// Whether time is frozen.
    pub paused: bool,
    /// Whether the session is lost.
    pub lost: bool,
    /// Whether a drag is in progress.
    pub dragging: bool,
    /// Ledger values.
    pub ledger: LedgerSnapshot,
    /// Event armed to fire next.
    pub pending_event: Option<GameEvent>,
    /// Walkers still moving.
    pub walkers: usize,
    /// Available cells on the active side.
    pub available_cells: usize,
}

// ============================================================================
// Helpers
// ============================================================================

impl Response {
    /// Create a ready response.
    pub fn ready(seed: u64) -> Self {
        Self::Ready {
            version: PROTOCOL_VERSION.to_string(),
            seed,
        }
    }

    /// Create an acknowledgment.
    pub fn ack(cmd: &str) -> Self {
        Self::Ack {
            cmd: cmd.to_string(),
            outcome: None,
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Serialize to JSON line (with newline).
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"Serialization failed: {e}"}}"#)
        });
        json.push('\n');
        json
    }
}

impl Command {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Get command name for acknowledgment.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetMode { .. } => "set_mode",
            Self::BeginDrag { .. } => "begin_drag",
            Self::UpdateDrag { .. } => "update_drag",
            Self::EndDrag { .. } => "end_drag",
            Self::Cancel => "cancel",
            Self::Advance { .. } => "advance",
            Self::Side { .. } => "side",
            Self::Pause { .. } => "pause",
            Self::Query => "query",
            Self::Ascii => "ascii",
            Self::Restart => "restart",
            Self::Quit => "quit",
        }
    }
}

/// Convert a client world point to fixed point.
///
/// Returns `None` for NaN, infinite or out-of-range coordinates.
pub fn world_point(x: f64, y: f64) -> Option<Vec2Fixed> {
    Some(Vec2Fixed::new(
        Fixed::checked_from_num(x)?,
        Fixed::checked_from_num(y)?,
    ))
}

/// Longest duration one `advance` command may cover.
pub const MAX_ADVANCE_SECONDS: f64 = 3600.0;

/// Convert a client duration in seconds to fixed point.
///
/// Rejects negative, non-finite and over-long durations.
pub fn seconds(value: f64) -> Option<Fixed> {
    if value.is_finite() && (0.0..=MAX_ADVANCE_SECONDS).contains(&value) {
        Fixed::checked_from_num(value)
    } else {
        None
    }
}
