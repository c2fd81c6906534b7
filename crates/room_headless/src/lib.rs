//! Headless cube room runner for scripted sessions and CI verification.
//!
//! This crate drives a [`room_core::controller::ConstructionController`]
//! from JSON commands, one per line, and writes responses the same way:
//!
//! - **stdin / script file**: commands (set_mode, drags, advance, etc.)
//! - **stdout**: acknowledgments, queued controller events, state (JSON)
//! - **stderr**: logs (human-readable)
//!
//! See the [`protocol`] module for the full command/response format.
//!
//! # Example
//!
//! ```bash
//! # Run interactively
//! echo '{"cmd":"advance","seconds":30}' | cargo run -p room_headless
//!
//! # Replay a script against a custom config
//! cargo run -p room_headless -- --config session.ron script --file build.jsonl
//!
//! # Print one side of the room
//! cargo run -p room_headless -- ascii --side ceiling --seconds 60
//! ```

pub mod ascii_visualizer;
pub mod protocol;
pub mod runner;

pub use ascii_visualizer::{render_grid, render_session, AsciiConfig};
pub use protocol::{Command, Response, SessionState};
pub use runner::{HeadlessConfig, HeadlessRunner, RunnerError};
