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

//! The play/pause state machine and step pointer.
//!
//! Nothing in here touches a timer. Every transition returns an [Effect] that
//! tells the owner what to do with its schedule and which step, if any, must
//! be fired right away.

use std::fmt;
use std::sync::Arc;

use crate::grid::{Grid, GridError};
use crate::signature::{Layout, TimeSignature};
use crate::tempo::Tempo;

/// Whether the clock is ticking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Stopped,
    Running,
    /// Ticking is suspended while a tempo or signature control is held.
    /// Remembers whether playback should resume when it is released.
    Adjusting { was_playing: bool },
}

impl TransportState {
    /// True if playback is running, or will resume after an adjustment.
    pub fn is_playing(&self) -> bool {
        match self {
            TransportState::Stopped => false,
            TransportState::Running => true,
            TransportState::Adjusting { was_playing } => *was_playing,
        }
    }
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportState::Stopped => write!(f, "stopped"),
            TransportState::Running => write!(f, "playing"),
            TransportState::Adjusting { was_playing: true } => write!(f, "paused (adjusting)"),
            TransportState::Adjusting { was_playing: false } => write!(f, "stopped (adjusting)"),
        }
    }
}

/// What the owner of the schedule must do after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Leave the schedule as it is.
    None,
    /// Replace any armed schedule with a fresh one at the current tempo, then
    /// fire the step, if given.
    Arm { fire: Option<usize> },
    /// Disarm the schedule.
    Cancel,
}

/// The full mutable state of a sequencer.
#[derive(Debug, Clone)]
pub struct SequencerState {
    instruments: Arc<[String]>,
    signature: TimeSignature,
    layout: Layout,
    grid: Grid,
    tempo: Tempo,
    transport: TransportState,
    step: usize,
}

impl SequencerState {
    /// Creates a stopped state with an empty grid sized for the instruments and signature.
    pub fn new(instruments: Vec<String>, signature: TimeSignature, tempo: Tempo) -> SequencerState {
        let layout = signature.layout();
        let grid = Grid::new(instruments.len(), layout.total_steps());
        SequencerState {
            instruments: instruments.into(),
            signature,
            layout,
            grid,
            tempo,
            transport: TransportState::Stopped,
            step: 0,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    pub fn transport(&self) -> TransportState {
        self.transport
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn signature(&self) -> TimeSignature {
        self.signature
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn start(&mut self) -> Effect {
        match self.transport {
            TransportState::Stopped => {
                self.transport = TransportState::Running;
                self.step = 0;
                Effect::Arm { fire: Some(0) }
            }
            TransportState::Running => Effect::None,
            TransportState::Adjusting { .. } => {
                self.transport = TransportState::Adjusting { was_playing: true };
                self.step = 0;
                Effect::None
            }
        }
    }

    pub fn stop(&mut self) -> Effect {
        self.step = 0;
        match self.transport {
            TransportState::Stopped => Effect::None,
            TransportState::Running => {
                self.transport = TransportState::Stopped;
                Effect::Cancel
            }
            TransportState::Adjusting { .. } => {
                self.transport = TransportState::Adjusting { was_playing: false };
                Effect::None
            }
        }
    }

    /// Starts if stopped, stops if playing.
    pub fn toggle_play(&mut self) -> Effect {
        if self.transport.is_playing() {
            self.stop()
        } else {
            self.start()
        }
    }

    /// Clears the grid and stops.
    pub fn reset(&mut self) -> Effect {
        self.grid = self.grid.cleared();
        self.step = 0;
        let previous = self.transport;
        self.transport = TransportState::Stopped;
        match previous {
            TransportState::Running => Effect::Cancel,
            _ => Effect::None,
        }
    }

    pub fn begin_adjustment(&mut self) -> Effect {
        match self.transport {
            TransportState::Stopped => {
                self.transport = TransportState::Adjusting { was_playing: false };
                Effect::None
            }
            TransportState::Running => {
                self.transport = TransportState::Adjusting { was_playing: true };
                Effect::Cancel
            }
            // Already held; a second gesture start changes nothing.
            TransportState::Adjusting { .. } => Effect::None,
        }
    }

    /// Resumes from the current step without refiring it.
    pub fn end_adjustment(&mut self) -> Effect {
        match self.transport {
            TransportState::Adjusting { was_playing: true } => {
                self.transport = TransportState::Running;
                Effect::Arm { fire: None }
            }
            TransportState::Adjusting { was_playing: false } => {
                self.transport = TransportState::Stopped;
                Effect::None
            }
            _ => Effect::None,
        }
    }

    /// Switches signature. The grid is recreated at the new width and the
    /// step pointer restarts at 0; an armed schedule keeps running.
    pub fn set_signature(&mut self, signature: TimeSignature) -> Effect {
        self.signature = signature;
        self.layout = signature.layout();
        self.grid = Grid::new(self.instruments.len(), self.layout.total_steps());
        self.step = 0;
        Effect::None
    }

    /// Takes a new tempo. A running schedule is rearmed from now.
    pub fn set_tempo(&mut self, tempo: Tempo) -> Effect {
        self.tempo = tempo;
        match self.transport {
            TransportState::Running => Effect::Arm { fire: None },
            _ => Effect::None,
        }
    }

    pub fn toggle_cell(&mut self, row: usize, col: usize) -> Result<(), GridError> {
        self.grid = self.grid.toggle(row, col)?;
        Ok(())
    }

    /// Moves to the next step, wrapping at the end of the pattern. Returns the
    /// step to fire, or None if the clock isn't running.
    pub fn advance(&mut self) -> Option<usize> {
        if self.transport != TransportState::Running {
            return None;
        }
        self.step = (self.step + 1) % self.layout.total_steps();
        Some(self.step)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            instruments: self.instruments.clone(),
            signature: self.signature,
            layout: self.layout,
            grid: self.grid.clone(),
            tempo: self.tempo,
            transport: self.transport,
            step: self.step,
        }
    }
}

/// An immutable copy of the sequencer state at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub instruments: Arc<[String]>,
    pub signature: TimeSignature,
    pub layout: Layout,
    pub grid: Grid,
    pub tempo: Tempo,
    pub transport: TransportState,
    pub step: usize,
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} | {} | {} | step {}/{}",
            self.signature,
            self.tempo,
            self.transport,
            self.step + 1,
            self.layout.total_steps()
        )?;

        let width = self
            .instruments
            .iter()
            .map(|name| name.chars().count())
            .max()
            .unwrap_or(0);

        for (row, name) in self.instruments.iter().enumerate() {
            write!(f, "{name:<width$} ")?;
            for col in 0..self.grid.cols() {
                if self.layout.is_downbeat(col) {
                    write!(f, "|")?;
                }
                let active = self.grid.read(row, col).map_err(|_| fmt::Error)?;
                write!(f, "{}", if active { 'x' } else { '.' })?;
            }
            writeln!(f, "|")?;
        }

        let mut marker = format!("{:width$} ", "");
        for col in 0..self.grid.cols() {
            if self.layout.is_downbeat(col) {
                marker.push(' ');
            }
            marker.push(if col == self.step { '^' } else { ' ' });
        }
        writeln!(f, "{}", marker.trim_end())
    }
}
