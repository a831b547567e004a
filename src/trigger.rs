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
use std::sync::Arc;

use tracing::{debug, warn};

use crate::audio::Device;
use crate::grid::Grid;
use crate::samples::SampleBank;

/// What happened when a step was fired.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TriggerReport {
    /// Instruments whose sample was sent to the output.
    pub fired: Vec<String>,
    /// Instruments that were active but couldn't be played.
    pub skipped: Vec<String>,
}

/// Plays every instrument that is active at a step.
#[derive(Clone)]
pub struct SoundTrigger {
    instruments: Arc<[String]>,
    bank: SampleBank,
    device: Arc<dyn Device>,
}

impl SoundTrigger {
    /// Creates a trigger. Instrument names are in grid row order.
    pub fn new(instruments: Vec<String>, bank: SampleBank, device: Arc<dyn Device>) -> SoundTrigger {
        SoundTrigger {
            instruments: instruments.into(),
            bank,
            device,
        }
    }

    /// Fires the given step of the grid. Never blocks on playback, and a
    /// sample that is missing or fails to play only silences that instrument
    /// for this step.
    pub fn fire(&self, grid: &Grid, step: usize) -> TriggerReport {
        let mut report = TriggerReport::default();
        let rows = match grid.active_rows(step) {
            Ok(rows) => rows,
            Err(e) => {
                warn!(err = e.to_string(), "Asked to fire a step outside of the grid");
                return report;
            }
        };

        for row in rows {
            let Some(name) = self.instruments.get(row) else {
                continue;
            };
            let Some(sample) = self.bank.get(name) else {
                debug!(instrument = name.as_str(), step, "Sample not available, skipping");
                report.skipped.push(name.clone());
                continue;
            };
            match self.device.play(&sample) {
                Ok(()) => report.fired.push(name.clone()),
                Err(e) => {
                    warn!(
                        instrument = name.as_str(),
                        step,
                        err = e.to_string(),
                        "Unable to play sample"
                    );
                    report.skipped.push(name.clone());
                }
            }
        }
        report
    }
}
