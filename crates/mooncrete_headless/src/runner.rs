//! Headless game runner implementation.
//!
//! [`HeadlessRunner`] owns a game and a virtual clock. Each `tick` command
//! advances the clock by a fixed step; the runner never reads the wall
//! clock, so a command transcript replays exactly.

use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

use mooncrete_core::config::GameConfig;
use mooncrete_core::error::Result;
use mooncrete_core::events::EventLog;
use mooncrete_core::game::MoonGame;
use mooncrete_core::math::Point;
use mooncrete_core::puzzle::Rotation;

use crate::ascii::render_game;
use crate::protocol::{Command, Response};

/// Default virtual milliseconds per tick.
pub const DEFAULT_TICK_MS: u64 = 25;

/// Headless runner for protocol-driven play.
#[derive(Debug)]
pub struct HeadlessRunner {
    game: MoonGame,
    log: Rc<RefCell<EventLog>>,
    tick_ms: u64,
    now: u64,
}

impl HeadlessRunner {
    /// Create a runner for a configuration.
    pub fn new(config: GameConfig, tick_ms: u64) -> Result<Self> {
        let mut game = MoonGame::new(config)?;
        let log = EventLog::shared();
        game.subscribe(Rc::clone(&log));
        // Publish the opening menu state so the first batch carries it.
        game.flush_events();
        Ok(Self {
            game,
            log,
            tick_ms: tick_ms.max(1),
            now: 0,
        })
    }

    /// The game being driven.
    pub fn game(&self) -> &MoonGame {
        &self.game
    }

    /// Current virtual time in milliseconds.
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Handle one command.
    ///
    /// Events published by inputs are held until the next `tick` response.
    pub fn handle(&mut self, command: &Command) -> Response {
        let name = command.name();
        match *command {
            Command::Tick { count } => {
                for _ in 0..count {
                    self.now = self.now.saturating_add(self.tick_ms);
                    self.game.tick(self.now);
                }
                Response::Events {
                    now: self.now,
                    events: self.log.borrow_mut().take(),
                }
            }
            Command::Left => Response::ack(name, self.game.move_left()),
            Command::Right => Response::ack(name, self.game.move_right()),
            Command::Down => Response::ack(name, self.game.move_down()),
            Command::Rotate { clockwise } => {
                let rotation = if clockwise {
                    Rotation::Clockwise
                } else {
                    Rotation::CounterClockwise
                };
                Response::ack(name, self.game.rotate(rotation))
            }
            Command::Fire { x, y } => {
                let fired = self.game.fire_missile(Point::new(x, y)).is_some();
                Response::ack(name, fired)
            }
            Command::Next => {
                self.game.request_next_phase();
                Response::ack(name, true)
            }
            Command::Escape => {
                self.game.escape();
                Response::ack(name, true)
            }
            Command::Begin => {
                self.game.begin();
                Response::ack(name, true)
            }
            Command::Pause { paused } => {
                self.game.set_paused(paused);
                Response::ack(name, true)
            }
            Command::Query => Response::State {
                snapshot: self.game.snapshot(),
                hash: self.game.state_hash(),
            },
            Command::Board => Response::Board {
                rows: render_game(&self.game),
            },
            Command::Quit => Response::Bye,
        }
    }

    /// Handle one protocol line. Blank lines get no response.
    pub fn handle_line(&mut self, line: &str) -> Option<Response> {
        if line.trim().is_empty() {
            return None;
        }
        match Command::from_json(line) {
            Ok(command) => {
                tracing::debug!(cmd = command.name(), "Command");
                Some(self.handle(&command))
            }
            Err(err) => {
                tracing::warn!(%err, line, "Rejected command line");
                Some(Response::error(err.to_string(), None))
            }
        }
    }

    /// Serve the protocol until `quit`, the game quits, or input ends.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        let ready = Response::ready(self.game.config().seed, self.tick_ms);
        output.write_all(ready.to_json_line().as_bytes())?;
        output.flush()?;

        for line in input.lines() {
            let line = line?;
            let Some(response) = self.handle_line(&line) else {
                continue;
            };
            output.write_all(response.to_json_line().as_bytes())?;
            if matches!(response, Response::Bye) {
                output.flush()?;
                return Ok(());
            }
            if !self.game.is_running() {
                tracing::info!("Game quit, closing session");
                break;
            }
            output.flush()?;
        }

        output.write_all(Response::Bye.to_json_line().as_bytes())?;
        output.flush()
    }

    /// Serve the protocol on stdin and stdout.
    pub fn run_stdio(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.run(stdin.lock(), stdout.lock())
    }
}
