//! Headless session runner implementation.

use std::io::{self, BufRead, Write};

use room_core::config::{ConfigError, SimConfig};
use room_core::controller::ConstructionController;
use room_core::error::CoreError;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::ascii_visualizer::{render_session, AsciiConfig};
use crate::protocol::{seconds, world_point, Command, Response, SessionState};

/// Errors that stop the runner.
#[derive(Error, Debug)]
pub enum RunnerError {
    /// Config could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Session could not be built or advanced.
    #[error(transparent)]
    Core(#[from] CoreError),
    /// Reading commands or writing responses failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Headless runner configuration.
#[derive(Debug, Clone, Default)]
pub struct HeadlessConfig {
    /// Session config.
    pub sim: SimConfig,
    /// Output state after every `advance` (vs only on query).
    pub auto_state_output: bool,
    /// Rendering options for the `ascii` command.
    pub ascii: AsciiConfig,
}

/// Drives one construction session from JSON-line commands.
#[derive(Debug)]
pub struct HeadlessRunner {
    config: HeadlessConfig,
    controller: ConstructionController,
    finished: bool,
}

impl HeadlessRunner {
    /// Create a runner, building the session from `config.sim`.
    pub fn new(config: HeadlessConfig) -> Result<Self, RunnerError> {
        let controller = ConstructionController::new(config.sim.clone())?;
        info!(
            seed = config.sim.seed,
            width = config.sim.grid_width,
            height = config.sim.grid_height,
            "Headless session created"
        );
        Ok(Self {
            config,
            controller,
            finished: false,
        })
    }

    /// The session being driven.
    pub fn controller(&self) -> &ConstructionController {
        &self.controller
    }

    /// Whether a `quit` command was processed.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Ready message announcing the protocol version.
    pub fn ready(&self) -> Response {
        Response::ready(self.config.sim.seed)
    }

    /// Parse and handle one input line.
    ///
    /// Blank lines and lines starting with `#` are skipped so script files
    /// can carry comments.
    pub fn handle_line(&mut self, line: &str) -> Vec<Response> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Vec::new();
        }
        match Command::from_json(line) {
            Ok(cmd) => self.handle(cmd),
            Err(e) => {
                warn!(error = %e, "Unparseable command");
                vec![Response::error(format!("Parse error: {e}"), None)]
            }
        }
    }

    /// Handle one command and collect every response it produces.
    pub fn handle(&mut self, cmd: Command) -> Vec<Response> {
        let cmd_name = cmd.name();
        debug!(cmd = cmd_name, "Handling command");
        let mut responses = Vec::new();

        match cmd {
            Command::SetMode { mode } => {
                if self.controller.set_mode(mode) {
                    responses.push(Response::ack(cmd_name));
                } else {
                    responses.push(Response::error(
                        format!("Mode {mode:?} is locked"),
                        Some(cmd_name),
                    ));
                }
            }

            Command::BeginDrag { x, y } => match world_point(x, y) {
                Some(point) if self.controller.begin_drag(point) => {
                    responses.push(Response::ack(cmd_name));
                }
                Some(_) => responses.push(Response::error(
                    "Drag refused: no mode selected or session halted",
                    Some(cmd_name),
                )),
                None => responses.push(invalid_point(x, y, cmd_name)),
            },

            Command::UpdateDrag { x, y } => match world_point(x, y) {
                Some(point) => {
                    self.controller.update_drag(point);
                    responses.push(Response::ack(cmd_name));
                }
                None => responses.push(invalid_point(x, y, cmd_name)),
            },

            Command::EndDrag { x, y } => match world_point(x, y) {
                Some(point) => match self.controller.end_drag(point) {
                    Ok(Some(outcome)) => responses.push(Response::Ack {
                        cmd: cmd_name.to_string(),
                        outcome: Some(outcome),
                    }),
                    Ok(None) => {
                        responses.push(Response::error("No drag in progress", Some(cmd_name)));
                    }
                    Err(e) => responses.push(Response::error(e.to_string(), Some(cmd_name))),
                },
                None => responses.push(invalid_point(x, y, cmd_name)),
            },

            Command::Cancel => {
                self.controller.cancel();
                responses.push(Response::ack(cmd_name));
            }

            Command::Advance { seconds: value } => match seconds(value) {
                Some(dt) => match self.controller.advance(dt) {
                    Ok(()) => {
                        responses.push(Response::ack(cmd_name));
                        if self.config.auto_state_output {
                            responses.push(Response::State(self.state()));
                        }
                    }
                    Err(e) => responses.push(Response::error(e.to_string(), Some(cmd_name))),
                },
                None => responses.push(Response::error(
                    format!("Invalid duration: {value}"),
                    Some(cmd_name),
                )),
            },

            Command::Side { side } => {
                self.controller.set_active_side(side);
                responses.push(Response::ack(cmd_name));
            }

            Command::Pause { paused } => {
                self.controller.set_paused(paused);
                if self.controller.is_paused() == paused {
                    responses.push(Response::ack(cmd_name));
                } else {
                    responses.push(Response::error(
                        "Cannot resume a lost session",
                        Some(cmd_name),
                    ));
                }
            }

            Command::Query => responses.push(Response::State(self.state())),

            Command::Ascii => responses.push(Response::Ascii {
                side: self.controller.active_side(),
                grid: render_session(&self.controller, &self.config.ascii),
            }),

            Command::Restart => match self.controller.restart() {
                Ok(()) => responses.push(Response::ack(cmd_name)),
                Err(e) => responses.push(Response::error(e.to_string(), Some(cmd_name))),
            },

            Command::Quit => {
                self.finished = true;
                responses.push(Response::Bye);
                return responses;
            }
        }

        let events = self.controller.drain_events();
        if !events.is_empty() {
            responses.push(Response::Events { events });
        }
        responses
    }

    /// Snapshot of the session for `query`.
    pub fn state(&self) -> SessionState {
        let controller = &self.controller;
        SessionState {
            elapsed: controller.elapsed().to_num::<f64>(),
            ticks: controller.ticks(),
            side: controller.active_side(),
            mode: controller.mode(),
            unlocked: controller.unlocked_modes().to_vec(),
            paused: controller.is_paused(),
            lost: controller.is_lost(),
            dragging: controller.is_dragging(),
            ledger: *controller.ledger().snapshot(),
            pending_event: controller.scheduler().pending().copied(),
            walkers: controller.walkers().len(),
            available_cells: controller.active_grid().available_count(),
        }
    }

    /// Run the command loop until `quit` or end of input.
    ///
    /// Writes the ready message first and a goodbye at end of input when
    /// no `quit` arrived.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> Result<(), RunnerError> {
        write_responses(&mut output, &[self.ready()])?;

        // Setup events (initial grid colors) are flushed before any command
        let events = self.controller.drain_events();
        if !events.is_empty() {
            write_responses(&mut output, &[Response::Events { events }])?;
        }

        for line in input.lines() {
            let line = line?;
            let responses = self.handle_line(&line);
            write_responses(&mut output, &responses)?;
            if self.finished {
                break;
            }
        }

        if !self.finished {
            self.finished = true;
            write_responses(&mut output, &[Response::Bye])?;
        }
        info!(
            ticks = self.controller.ticks(),
            lost = self.controller.is_lost(),
            "Headless session finished"
        );
        Ok(())
    }
}

fn invalid_point(x: f64, y: f64, cmd_name: &str) -> Response {
    Response::error(format!("Invalid world point ({x}, {y})"), Some(cmd_name))
}

fn write_responses<W: Write>(output: &mut W, responses: &[Response]) -> io::Result<()> {
    for response in responses {
        output.write_all(response.to_json_line().as_bytes())?;
    }
    output.flush()
}
