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
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::loader::{self, LoadedSample};
use crate::instrument::Instrument;

/// Where a sample is in its lifecycle.
#[derive(Clone, Debug)]
pub enum Availability {
    Loading,
    Ready(LoadedSample),
    Failed(String),
}

/// The decoded samples for each instrument, keyed by instrument name.
///
/// Samples are decoded in the background; until a sample is ready, lookups
/// report it as unavailable and the instrument stays silent.
#[derive(Clone, Default)]
pub struct SampleBank {
    samples: Arc<RwLock<HashMap<String, Availability>>>,
}

impl SampleBank {
    pub fn new() -> SampleBank {
        SampleBank::default()
    }

    /// Returns the sample for an instrument if it has finished loading.
    pub fn get(&self, name: &str) -> Option<LoadedSample> {
        match self.samples.read().get(name) {
            Some(Availability::Ready(sample)) => Some(sample.clone()),
            _ => None,
        }
    }

    pub fn availability(&self, name: &str) -> Option<Availability> {
        self.samples.read().get(name).cloned()
    }

    /// Makes a sample available immediately.
    pub fn insert(&self, sample: LoadedSample) {
        self.samples
            .write()
            .insert(sample.name().to_string(), Availability::Ready(sample));
    }

    /// Decodes every instrument's file on the blocking pool. Instruments are
    /// marked as loading right away and flip to ready (or failed) as each
    /// decode finishes. The returned handle completes when all of them are done.
    pub fn load_in_background(
        &self,
        instruments: &[Instrument],
        sample_rate: u32,
    ) -> JoinHandle<()> {
        {
            let mut samples = self.samples.write();
            for instrument in instruments {
                samples.insert(instrument.name().to_string(), Availability::Loading);
            }
        }

        let bank = self.clone();
        let instruments = instruments.to_vec();
        tokio::task::spawn_blocking(move || {
            for instrument in instruments {
                let availability =
                    match loader::load(instrument.name(), instrument.file(), sample_rate) {
                        Ok(sample) => Availability::Ready(sample),
                        Err(e) => {
                            warn!(
                                instrument = instrument.name(),
                                err = e.to_string(),
                                "Unable to load sample, instrument will be silent"
                            );
                            Availability::Failed(e.to_string())
                        }
                    };
                bank.samples
                    .write()
                    .insert(instrument.name().to_string(), availability);
            }
            info!("Finished loading samples");
        })
    }
}

impl fmt::Debug for SampleBank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let samples = self.samples.read();
        let ready = samples
            .values()
            .filter(|availability| matches!(availability, Availability::Ready(_)))
            .count();
        f.debug_struct("SampleBank")
            .field("instruments", &samples.len())
            .field("ready", &ready)
            .finish()
    }
}
