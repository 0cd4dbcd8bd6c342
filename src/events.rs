//! Event types and the main event loop driver for the air-quality TUI.
//!
//! This module defines the [`Event`] enum (keyboard input, ticks and the
//! results of background lookups) and the [`EventHandler`], which runs a
//! background task that polls crossterm for key events and emits periodic
//! [`Event::Tick`]s. The main loop in `main.rs` receives events via
//! [`EventHandler::next`]; lookup tasks spawned by the
//! [`Dispatcher`](crate::dispatch::Dispatcher) send theirs via [`EventHandler::tx`].

use crate::error::AppError;
use crate::models::{AirQualityReading, CoordinatePair, PlaceCandidate};
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::error;

/// Events processed by the application event loop.
///
/// The main loop matches on these to update [`App`](crate::app::App) state.
/// Lookup results carry the generation they were issued under so the
/// controller can drop responses that have been superseded.
#[derive(Debug)]
pub enum Event {
    /// Periodic tick used for UI refresh.
    Tick,
    /// User key press from the terminal.
    Input(KeyEvent),
    /// Outcome of the startup geolocation attempt.
    Located(Result<CoordinatePair, AppError>),
    /// Geocoding candidates for a place-name search.
    Candidates {
        generation: u64,
        result: Result<Vec<PlaceCandidate>, AppError>,
    },
    /// Air-quality reading for the current coordinates.
    AirQuality {
        generation: u64,
        result: Result<AirQualityReading, AppError>,
    },
}

/// Multiplexes terminal input and ticks into a single event stream.
///
/// Holds an unbounded channel: the sender ([`tx`](EventHandler::tx)) can be
/// cloned and given to other tasks, while the receiver is consumed by
/// [`next`](EventHandler::next) in the main loop.
pub struct EventHandler {
    /// Sender for posting events from lookup tasks.
    pub tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    /// Creates a new event handler and spawns the input/tick task.
    ///
    /// The spawned task polls crossterm with a timeout of `tick_rate_ms`;
    /// key presses become [`Event::Input`] and each elapsed interval an
    /// [`Event::Tick`]. If the terminal stops answering the task logs the
    /// error and exits, after which [`next`](EventHandler::next) only yields
    /// lookup results.
    pub fn new(tick_rate_ms: u64) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let event_tx = tx.clone();

        tokio::spawn(async move {
            let tick_rate = Duration::from_millis(tick_rate_ms);
            let mut last_tick = Instant::now();
            loop {
                let timeout = tick_rate
                    .checked_sub(last_tick.elapsed())
                    .unwrap_or(Duration::from_secs(0));
                match event::poll(timeout) {
                    Ok(true) => match event::read() {
                        // Windows reports releases too; only presses edit text.
                        Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                            event_tx.send(Event::Input(key)).ok();
                        }
                        Ok(_) => {}
                        Err(e) => {
                            error!("Terminal read failed: {}", e);
                            break;
                        }
                    },
                    Ok(false) => {}
                    Err(e) => {
                        error!("Terminal poll failed: {}", e);
                        break;
                    }
                }
                if last_tick.elapsed() >= tick_rate {
                    event_tx.send(Event::Tick).ok();
                    last_tick = Instant::now();
                }
            }
        });

        Self { tx, rx }
    }

    /// Receives the next event from the channel.
    ///
    /// Returns `None` when all senders have been dropped.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}
