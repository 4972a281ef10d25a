//! Headless game runner for scripted play and CI verification.
//!
//! This crate drives the simulation core without graphics. A virtual
//! millisecond clock stands in for the frame timer, and the outside world
//! talks to the game with JSON commands on stdin, reading responses on
//! stdout. This enables:
//!
//! - **Scripted play**: an external agent plays the game through the protocol
//! - **Tuning runs**: seeded autopilot sessions summarised as JSON
//! - **CI verification**: repeated runs of one seed must hash identically
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: Commands from the controller (tick, left, fire, etc.)
//! - **stdout**: Responses and snapshots (JSON)
//! - **stderr**: Logs (human-readable)
//!
//! See the [`protocol`] module for the full command/response format.
//!
//! # Example
//!
//! ```bash
//! # Run interactively
//! echo '{"cmd":"begin"}' | cargo run -p mooncrete_headless
//!
//! # Autopilot session with a tuning file
//! cargo run -p mooncrete_headless -- --config tuning.ron simulate --ticks 20000
//!
//! # Verify determinism
//! cargo run -p mooncrete_headless -- verify --runs 5
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod ascii;
pub mod autopilot;
pub mod config_loader;
pub mod metrics;
pub mod protocol;
pub mod runner;
pub mod session;

pub use ascii::{render_arcade, render_board, render_game};
pub use autopilot::Autopilot;
pub use config_loader::{load_config, ConfigLoadError};
pub use metrics::RunMetrics;
pub use protocol::{Command, ProtocolError, Response};
pub use runner::HeadlessRunner;
pub use session::{simulate, verify, RunSummary, Session, SessionConfig, VerifyReport};
