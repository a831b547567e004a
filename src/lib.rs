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

//! A step sequencer and drum machine.
//!
//! A grid of on/off cells, one row per instrument and one column per step,
//! is played back at a tempo-derived rate. Each step fires the samples of
//! every instrument active at that step.

pub mod audio;
pub mod config;
pub mod control;
pub mod controller;
pub mod grid;
pub mod instrument;
pub mod metronome;
pub mod pattern;
pub mod samples;
pub mod sequencer;
pub mod signature;
pub mod tempo;
pub mod transport;
pub mod trigger;
