//! Headless Mooncrete runner.
//!
//! This binary runs the game without graphics, controlled via JSON on stdin/stdout.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode - read commands from stdin
//! cargo run -p mooncrete_headless
//!
//! # Autopilot session, printing the final board
//! cargo run -p mooncrete_headless -- simulate --seed 7 --ascii
//!
//! # Verify determinism
//! cargo run -p mooncrete_headless -- verify --seed 12345 --runs 5
//!
//! # Write a starting tuning file
//! cargo run -p mooncrete_headless -- config > tuning.ron
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON commands, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mooncrete_core::config::GameConfig;
use mooncrete_headless::{
    config_loader::{config_to_ron, load_or_default},
    render_game,
    runner::{HeadlessRunner, DEFAULT_TICK_MS},
    simulate, verify, SessionConfig,
};

#[derive(Parser)]
#[command(name = "mooncrete_headless")]
#[command(about = "Headless Mooncrete runner for scripted play and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// RON tuning file (defaults are used when absent)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the JSON protocol on stdin/stdout
    Run {
        /// Virtual milliseconds per tick
        #[arg(long, default_value_t = DEFAULT_TICK_MS)]
        tick_ms: u64,
    },

    /// Play one seeded game with the autopilot
    Simulate {
        /// Maximum ticks to run
        #[arg(short, long, default_value = "20000")]
        ticks: u64,

        /// Virtual milliseconds per tick
        #[arg(long, default_value_t = DEFAULT_TICK_MS)]
        tick_ms: u64,

        /// Override the configured seed
        #[arg(long)]
        seed: Option<u64>,

        /// Seed for the autopilot
        #[arg(long, default_value = "1")]
        pilot_seed: u64,

        /// Print the final board and playfield to stderr
        #[arg(long)]
        ascii: bool,
    },

    /// Verify determinism by running the same seed multiple times
    Verify {
        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,

        /// Ticks per run
        #[arg(short, long, default_value = "20000")]
        ticks: u64,

        /// Virtual milliseconds per tick
        #[arg(long, default_value_t = DEFAULT_TICK_MS)]
        tick_ms: u64,

        /// Override the configured seed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print the effective configuration as RON
    Config,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for protocol)
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    let config = load_game_config(cli.config.as_deref());

    match cli.command {
        Some(Commands::Run { tick_ms }) => cmd_run(config, tick_ms),
        Some(Commands::Simulate {
            ticks,
            tick_ms,
            seed,
            pilot_seed,
            ascii,
        }) => {
            let session = SessionConfig {
                game: with_seed(config, seed),
                ticks,
                tick_ms,
                pilot_seed,
            };
            cmd_simulate(&session, ascii);
        }
        Some(Commands::Verify {
            runs,
            ticks,
            tick_ms,
            seed,
        }) => {
            let session = SessionConfig {
                game: with_seed(config, seed),
                ticks,
                tick_ms,
                ..SessionConfig::default()
            };
            cmd_verify(&session, runs);
        }
        Some(Commands::Config) => cmd_config(&config),
        None => {
            // Default: interactive mode
            cmd_run(config, DEFAULT_TICK_MS);
        }
    }
}

fn load_game_config(path: Option<&Path>) -> GameConfig {
    match load_or_default(path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load config");
            std::process::exit(1);
        }
    }
}

fn with_seed(config: GameConfig, seed: Option<u64>) -> GameConfig {
    match seed {
        Some(seed) => config.with_seed(seed),
        None => config,
    }
}

/// Serve the protocol on stdin/stdout
fn cmd_run(config: GameConfig, tick_ms: u64) {
    tracing::info!(seed = config.seed, tick_ms, "Starting interactive session");

    let mut runner = match HeadlessRunner::new(config, tick_ms) {
        Ok(runner) => runner,
        Err(e) => {
            tracing::error!(error = %e, "Failed to create game");
            std::process::exit(1);
        }
    };

    if let Err(e) = runner.run_stdio() {
        tracing::error!(error = %e, "Protocol I/O failed");
        std::process::exit(1);
    }
}

/// Run one autopilot session and print its summary
fn cmd_simulate(config: &SessionConfig, ascii: bool) {
    let session = match simulate(config) {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(error = %e, "Simulation failed");
            std::process::exit(1);
        }
    };

    if ascii {
        for line in render_game(&session.game) {
            eprintln!("{line}");
        }
    }

    match serde_json::to_string_pretty(&session.summary) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize summary");
            std::process::exit(1);
        }
    }
}

/// Verify determinism
fn cmd_verify(config: &SessionConfig, runs: u32) {
    tracing::info!(
        "Verifying determinism: seed {} ({} runs of {} ticks)",
        config.game.seed,
        runs,
        config.ticks
    );

    let report = match verify(config, runs) {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(error = %e, "Verification failed");
            std::process::exit(1);
        }
    };

    if report.deterministic {
        eprintln!("PASS: All {runs} runs produced identical results");
        eprintln!("  Hash: {:016x}", report.hashes.first().copied().unwrap_or(0));
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        for (run, hash) in report.hashes.iter().enumerate() {
            eprintln!("  Run {run}: {hash:016x}");
        }
        std::process::exit(1);
    }
}

/// Print the effective configuration
fn cmd_config(config: &GameConfig) {
    match config_to_ron(config) {
        Ok(ron) => println!("{ron}"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to write config");
            std::process::exit(1);
        }
    }
}
