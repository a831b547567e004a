// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::io;
use std::sync::Arc;

use tokio::sync::mpsc::{self, Sender};
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, span, Instrument, Level};

use crate::control::{ControlError, ControlSurface};
use crate::grid::Stroke;
use crate::sequencer::SequencerError;

pub mod keyboard;

/// Controller events that will trigger behavior in the sequencer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Starts playback if stopped, stops it if playing.
    Play,

    /// Starts playback from the first step. If already playing, does nothing.
    Start,

    /// Stops playback and rewinds to the first step.
    Stop,

    /// Clears the grid and stops.
    Reset,

    /// Sets the tempo from typed input.
    Tempo(String),

    /// Switches the time signature.
    Signature(String),

    /// Flips a single cell.
    Toggle { row: usize, col: usize },

    /// Drags across a row from one step to another, painting the value
    /// opposite to the first cell's.
    Paint { row: usize, from: usize, to: usize },

    /// Grabs the tempo control. Playback pauses until it is released.
    Hold,

    /// Releases the tempo control.
    Release,

    /// Prints the grid.
    Show,
}

pub trait Driver: Send + Sync + 'static {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>>;
}

/// Drives a sequencer from controller events.
pub struct Controller {
    handle: JoinHandle<()>,
}

impl Controller {
    /// Creates a new controller with the given driver.
    pub fn new(surface: ControlSurface, driver: Arc<dyn Driver>) -> Controller {
        let span = span!(Level::INFO, "controller");
        Controller {
            handle: tokio::spawn(Controller::trigger_events(surface, driver).instrument(span)),
        }
    }

    /// Join will block until the controller finishes.
    pub async fn join(&mut self) -> Result<(), JoinError> {
        (&mut self.handle).await
    }

    /// Watches the driver and applies each event to the sequencer. Returns
    /// once the driver stops sending events.
    async fn trigger_events(mut surface: ControlSurface, driver: Arc<dyn Driver>) {
        let (events_tx, mut events_rx) = mpsc::channel(1);
        let join_handle = driver.monitor_events(events_tx);

        info!(
            bpm = surface.tempo().bpm(),
            signature = surface.time_signature().id(),
            "Controller started."
        );

        while let Some(event) = events_rx.recv().await {
            info!(event = format!("{:?}", event), "Received event.");
            if let Err(e) = Controller::handle(&mut surface, event).await {
                error!(err = e.to_string(), "Error handling event");
                if matches!(e, ControlError::Sequencer(SequencerError::Closed)) {
                    break;
                }
            }
        }

        info!("Controller closing.");
        match join_handle.await {
            Ok(Err(e)) => error!(err = e.to_string(), "Event monitor failed"),
            Err(e) => error!(err = e.to_string(), "Error waiting for event monitor to stop"),
            Ok(Ok(())) => {}
        }
    }

    async fn handle(surface: &mut ControlSurface, event: Event) -> Result<(), ControlError> {
        let sequencer = surface.sequencer().clone();
        match event {
            Event::Play => {
                sequencer.toggle_play().await?;
            }
            Event::Start => {
                sequencer.start().await?;
            }
            Event::Stop => {
                sequencer.stop().await?;
            }
            Event::Reset => {
                sequencer.reset().await?;
            }
            Event::Tempo(raw) => {
                surface.set_tempo(&raw).await?;
            }
            Event::Signature(id) => {
                surface.set_time_signature(&id).await?;
            }
            Event::Toggle { row, col } => {
                sequencer.toggle_cell(row, col).await?;
            }
            Event::Paint { row, from, to } => {
                let mut grid = sequencer.snapshot().await?.grid;
                let mut stroke = Stroke::begin(&grid, row, from).map_err(SequencerError::from)?;
                grid = sequencer.toggle_cell(row, from).await?.grid;

                let cols: Vec<usize> = if from <= to {
                    (from..=to).collect()
                } else {
                    (to..=from).rev().collect()
                };
                for col in cols {
                    if stroke.enter(&grid, row, col).map_err(SequencerError::from)? {
                        grid = sequencer.toggle_cell(row, col).await?.grid;
                    }
                }
            }
            Event::Hold => {
                surface.begin_adjustment().await?;
            }
            Event::Release => {
                surface.end_adjustment().await?;
            }
            Event::Show => {
                println!("{}", sequencer.snapshot().await?);
            }
        }
        Ok(())
    }
}
