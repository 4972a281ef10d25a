//! JSON protocol for headless game communication.
//!
//! The headless runner communicates via JSON lines (one JSON object per line):
//!
//! **Input (stdin):** Commands from the controller
//! **Output (stdout):** Responses, snapshots and event batches
//!
//! # Protocol Flow
//!
//! 1. Runner starts, outputs `{"type":"ready","version":"1.0",...}`
//! 2. Controller sends commands as JSON lines
//! 3. Every command gets exactly one response line
//! 4. `quit`, or escaping the last state, ends with `{"type":"bye"}`
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","seed":12345,"tick_ms":25}
//! -> {"cmd":"begin"}
//! <- {"type":"ack","cmd":"begin","accepted":true}
//! -> {"cmd":"tick","count":40}
//! <- {"type":"events","now":1000,"events":[...]}
//! -> {"cmd":"left"}
//! <- {"type":"ack","cmd":"left","accepted":true}
//! -> {"cmd":"query"}
//! <- {"type":"state","snapshot":{...},"hash":...}
//! ```

use mooncrete_core::events::GameEvent;
use mooncrete_core::game::GameSnapshot;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Protocol version reported in the ready line.
pub const PROTOCOL_VERSION: &str = "1.0";

/// Errors decoding a command line.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The line was blank.
    #[error("Empty command line")]
    Empty,

    /// The line was not a valid command.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

// ============================================================================
// Input Commands (Controller -> Runner)
// ============================================================================

/// Commands that can be sent to the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Advance the virtual clock by N ticks (default: 1).
    Tick {
        /// Number of ticks.
        #[serde(default = "default_tick_count")]
        count: u32,
    },

    /// Move the piece left.
    Left,

    /// Move the piece right.
    Right,

    /// Move the piece down.
    Down,

    /// Rotate the piece.
    Rotate {
        /// Clockwise when true, the default.
        #[serde(default = "default_clockwise")]
        clockwise: bool,
    },

    /// Fire the nearest ready turret at a point.
    Fire {
        /// Target x in world units.
        x: i32,
        /// Target y in world units.
        y: i32,
    },

    /// Skip to the next phase.
    Next,

    /// Leave the current state.
    Escape,

    /// Start a new game or toggle the menu.
    Begin,

    /// Pause or resume ticking.
    Pause {
        /// New pause flag.
        paused: bool,
    },

    /// Snapshot the game without advancing time.
    Query,

    /// Render the board and playfield as text.
    Board,

    /// Stop the runner.
    Quit,
}

fn default_tick_count() -> u32 {
    1
}

fn default_clockwise() -> bool {
    true
}

impl Command {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, ProtocolError> {
        let json = json.trim();
        if json.is_empty() {
            return Err(ProtocolError::Empty);
        }
        Ok(serde_json::from_str(json)?)
    }

    /// Get command name for acknowledgment.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tick { .. } => "tick",
            Self::Left => "left",
            Self::Right => "right",
            Self::Down => "down",
            Self::Rotate { .. } => "rotate",
            Self::Fire { .. } => "fire",
            Self::Next => "next",
            Self::Escape => "escape",
            Self::Begin => "begin",
            Self::Pause { .. } => "pause",
            Self::Query => "query",
            Self::Board => "board",
            Self::Quit => "quit",
        }
    }
}

// ============================================================================
// Output Responses (Runner -> Controller)
// ============================================================================

/// Responses sent from the headless runner.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept commands.
    Ready {
        /// Protocol version.
        version: String,
        /// Seed of the session.
        seed: u64,
        /// Virtual milliseconds per tick.
        tick_ms: u64,
    },

    /// Acknowledgment of an input command.
    Ack {
        /// Command name.
        cmd: String,
        /// Whether the game took the input.
        accepted: bool,
    },

    /// Error processing a command.
    Error {
        /// What went wrong.
        message: String,
        /// Command name, when the line parsed that far.
        cmd: Option<String>,
    },

    /// Current game state.
    State {
        /// Serializable view of the game.
        snapshot: GameSnapshot,
        /// Determinism hash.
        hash: u64,
    },

    /// Text rendering of the board and playfield.
    Board {
        /// Lines of text, top first.
        rows: Vec<String>,
    },

    /// Events published while ticking.
    Events {
        /// Virtual clock after the ticks.
        now: u64,
        /// Events in publish order.
        events: Vec<GameEvent>,
    },

    /// Goodbye message before shutdown.
    Bye,
}

impl Response {
    /// Create a ready response.
    pub fn ready(seed: u64, tick_ms: u64) -> Self {
        Self::Ready {
            version: PROTOCOL_VERSION.to_string(),
            seed,
            tick_ms,
        }
    }

    /// Create an acknowledgment.
    pub fn ack(cmd: &str, accepted: bool) -> Self {
        Self::Ack {
            cmd: cmd.to_string(),
            accepted,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tick_command() {
        let cmd = Command::from_json(r#"{"cmd":"tick","count":60}"#).unwrap();
        assert_eq!(cmd, Command::Tick { count: 60 });
    }

    #[test]
    fn test_default_tick_count() {
        let cmd = Command::from_json(r#"{"cmd":"tick"}"#).unwrap();
        assert_eq!(cmd, Command::Tick { count: 1 });
    }

    #[test]
    fn test_parse_fire_and_rotate() {
        let fire = Command::from_json(r#"{"cmd":"fire","x":10,"y":20}"#).unwrap();
        assert_eq!(fire, Command::Fire { x: 10, y: 20 });
        let rotate = Command::from_json(r#"{"cmd":"rotate"}"#).unwrap();
        assert_eq!(rotate, Command::Rotate { clockwise: true });
        assert_eq!(rotate.name(), "rotate");
    }

    #[test]
    fn test_rejects_blank_and_unknown() {
        assert!(matches!(Command::from_json("   "), Err(ProtocolError::Empty)));
        assert!(matches!(
            Command::from_json(r#"{"cmd":"warp"}"#),
            Err(ProtocolError::Parse(_))
        ));
    }

    #[test]
    fn test_serialize_responses() {
        let ack = Response::ack("left", false).to_json_line();
        assert_eq!(ack, "{\"type\":\"ack\",\"cmd\":\"left\",\"accepted\":false}\n");

        let events = Response::Events {
            now: 50,
            events: vec![GameEvent::RowCleared { row: 9 }],
        }
        .to_json_line();
        assert!(events.contains(r#""type":"events""#));
        assert!(events.contains(r#""event":"row_cleared""#));
    }
}
