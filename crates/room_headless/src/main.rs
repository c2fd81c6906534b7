//! Headless cube room runner.
//!
//! Runs a construction session without graphics, controlled via JSON on
//! stdin/stdout or from a script file.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode - read commands from stdin
//! cargo run -p room_headless
//!
//! # Replay a command script
//! cargo run -p room_headless -- script --file build.jsonl
//!
//! # Render a side after some simulated time
//! cargo run -p room_headless -- ascii --side floor --seconds 120
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON commands, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use room_core::config::SimConfig;
use room_core::controller::ConstructionController;
use room_core::room::RoomSide;
use room_headless::{
    ascii_visualizer::{render_session, AsciiConfig},
    protocol::seconds,
    runner::{HeadlessConfig, HeadlessRunner, RunnerError},
};

#[derive(Parser)]
#[command(name = "room_headless")]
#[command(about = "Headless cube room runner for scripted sessions and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Session config (RON); defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the config seed
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive session on stdin/stdout
    Run {
        /// Output state after every advance
        #[arg(long)]
        auto_state: bool,
    },

    /// Replay a file of JSON-line commands
    Script {
        /// Script file path
        #[arg(short, long)]
        file: PathBuf,

        /// Output state after every advance
        #[arg(long)]
        auto_state: bool,
    },

    /// Print one side of the room as ASCII
    Ascii {
        /// Side to render (floor, wall_north, wall_east, wall_south, wall_west, ceiling)
        #[arg(short, long, default_value = "floor", value_parser = parse_side)]
        side: RoomSide,

        /// Simulated seconds to advance before rendering
        #[arg(long, default_value = "0")]
        seconds: f64,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for protocol)
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .init();

    let result = load_config(cli.config.as_deref(), cli.seed).and_then(|sim| {
        match cli.command.unwrap_or(Commands::Run { auto_state: false }) {
            Commands::Run { auto_state } => cmd_run(sim, auto_state),
            Commands::Script { file, auto_state } => cmd_script(sim, &file, auto_state),
            Commands::Ascii {
                side,
                seconds,
                no_color,
            } => cmd_ascii(sim, side, seconds, no_color),
        }
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Headless runner failed");
            ExitCode::FAILURE
        }
    }
}

fn parse_side(value: &str) -> Result<RoomSide, String> {
    RoomSide::ALL
        .into_iter()
        .find(|side| side.to_string() == value)
        .ok_or_else(|| format!("unknown side '{value}'"))
}

fn load_config(path: Option<&Path>, seed: Option<u64>) -> Result<SimConfig, RunnerError> {
    let mut sim = match path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading session config");
            SimConfig::load(path)?
        }
        None => SimConfig::default(),
    };
    if let Some(seed) = seed {
        sim.seed = seed;
    }
    Ok(sim)
}

fn cmd_run(sim: SimConfig, auto_state: bool) -> Result<(), RunnerError> {
    let mut runner = HeadlessRunner::new(HeadlessConfig {
        sim,
        auto_state_output: auto_state,
        ..HeadlessConfig::default()
    })?;
    let stdin = io::stdin();
    runner.run(stdin.lock(), io::stdout().lock())
}

fn cmd_script(sim: SimConfig, file: &Path, auto_state: bool) -> Result<(), RunnerError> {
    tracing::info!(file = %file.display(), "Replaying script");
    let reader = BufReader::new(File::open(file)?);
    let mut runner = HeadlessRunner::new(HeadlessConfig {
        sim,
        auto_state_output: auto_state,
        ..HeadlessConfig::default()
    })?;
    runner.run(reader, io::stdout().lock())
}

fn cmd_ascii(sim: SimConfig, side: RoomSide, value: f64, no_color: bool) -> Result<(), RunnerError> {
    let mut controller = ConstructionController::new(sim)?;
    if let Some(dt) = seconds(value) {
        controller.advance(dt)?;
    } else {
        tracing::warn!(seconds = value, "Ignoring invalid duration");
    }
    controller.set_active_side(side);

    let config = AsciiConfig {
        use_color: !no_color,
        ..AsciiConfig::default()
    };
    print!("{}", render_session(&controller, &config));
    Ok(())
}
