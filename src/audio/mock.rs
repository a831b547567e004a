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
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use super::AudioError;
use crate::samples::LoadedSample;

/// The sample rate mock devices claim to run at.
pub const MOCK_SAMPLE_RATE: u32 = 44100;

/// A mock device. Doesn't actually play anything, but remembers what it was
/// asked to play.
#[derive(Clone)]
pub struct Device {
    name: String,
    played: Arc<Mutex<Vec<String>>>,
    failing: bool,
}

impl Device {
    /// Gets the given mock device.
    pub fn get(name: &str) -> Device {
        Device {
            name: name.to_string(),
            played: Arc::new(Mutex::new(Vec::new())),
            failing: false,
        }
    }

    /// Gets a mock device that rejects every sample.
    pub fn failing(name: &str) -> Device {
        Device {
            failing: true,
            ..Device::get(name)
        }
    }

    /// The names of every sample played so far, in order.
    pub fn played(&self) -> Vec<String> {
        self.played.lock().clone()
    }

    pub fn clear(&self) {
        self.played.lock().clear();
    }
}

impl super::Device for Device {
    fn play(&self, sample: &LoadedSample) -> Result<(), AudioError> {
        if self.failing {
            return Err(AudioError::Closed);
        }
        debug!(device = self.name, sample = sample.name(), "Playing sample");
        self.played.lock().push(sample.name().to_string());
        Ok(())
    }

    fn sample_rate(&self) -> u32 {
        MOCK_SAMPLE_RATE
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}
