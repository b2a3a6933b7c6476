use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CEvent, KeyEvent, KeyEventKind};

/// Events that the application can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// A periodic tick event.
    Tick,
    /// A key press event from the user.
    Input(KeyEvent),
}

/// Polls for user input and timer ticks on the calling thread.
///
/// `next` blocks on terminal input for at most the time remaining until
/// the next tick, so ticks keep a fixed cadence while keys are handled as
/// soon as they arrive. Nothing here spawns a thread: the dispatcher tick
/// runs on whichever thread owns the terminal.
pub struct EventHandler {
    /// How often a tick event should be produced.
    tick_rate: Duration,
    last_tick: Instant,
}

impl EventHandler {
    /// Create a new `EventHandler` with the given tick rate.
    pub fn new(tick_rate: Duration) -> Self {
        EventHandler {
            tick_rate,
            last_tick: Instant::now(),
        }
    }

    /// Wait for the next key press or tick, whichever comes first.
    pub fn next_event(&mut self) -> io::Result<AppEvent> {
        loop {
            let elapsed = self.last_tick.elapsed();
            if elapsed >= self.tick_rate {
                self.last_tick = Instant::now();
                return Ok(AppEvent::Tick);
            }
            if event::poll(self.tick_rate - elapsed)? {
                if let CEvent::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        return Ok(AppEvent::Input(key));
                    }
                }
                // Ignore other event types and key releases.
            }
        }
    }
}
