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
use std::{fmt, sync::Arc};

use crate::config;
use crate::samples::LoadedSample;

pub mod cpal;
pub mod mixer;
pub mod mock;

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("no audio device found with name {0}")]
    NotFound(String),

    #[error("audio device {0} has no usable output configuration")]
    NoOutput(String),

    #[error("unsupported output sample format {0}")]
    UnsupportedFormat(String),

    #[error("audio host unavailable: {0}")]
    Host(#[from] ::cpal::HostUnavailable),

    #[error("unable to list devices: {0}")]
    Devices(#[from] ::cpal::DevicesError),

    #[error("unable to read device name: {0}")]
    Name(#[from] ::cpal::DeviceNameError),

    #[error("unable to read output configurations: {0}")]
    Configs(#[from] ::cpal::SupportedStreamConfigsError),

    #[error("unable to build output stream: {0}")]
    Build(#[from] ::cpal::BuildStreamError),

    #[error("unable to start output stream: {0}")]
    Play(#[from] ::cpal::PlayStreamError),

    #[error("the output stream is closed")]
    Closed,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// An output that can play samples. Playing never blocks: the sample is
/// queued as a new voice and mixed in by the output.
pub trait Device: fmt::Display + Send + Sync {
    /// Starts playing the sample from its beginning. Voices already playing,
    /// including ones of the same sample, are left alone.
    fn play(&self, sample: &LoadedSample) -> Result<(), AudioError>;

    /// The output sample rate. Samples should be converted to this rate.
    fn sample_rate(&self) -> u32;
}

/// Lists devices known to cpal.
pub fn list_devices() -> Result<Vec<cpal::DeviceInfo>, AudioError> {
    cpal::list()
}

/// Gets the configured device. Device names starting with "mock" get a mock device.
pub fn get_device(config: &config::Audio) -> Result<Arc<dyn Device>, AudioError> {
    let device = config.device();
    if device.starts_with("mock") {
        return Ok(Arc::new(mock::Device::get(device)));
    };

    Ok(Arc::new(cpal::Device::get(config)?))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_get_mock_device() {
        let device = get_device(&config::Audio::new("mock-device")).unwrap();
        assert_eq!("mock-device (Mock)", device.to_string());
        assert_eq!(mock::MOCK_SAMPLE_RATE, device.sample_rate());
    }
}
