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
use std::{fmt, thread};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};
use tracing::{error, info, span, Level};

use super::mixer::{Mixer, Voice};
use super::{AudioError, Device as AudioDevice};
use crate::config;
use crate::samples::LoadedSample;

/// The name that selects the default output of the default host.
const DEFAULT_DEVICE: &str = "default";

/// A summary of an output device, used for listing.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    name: String,
    host: String,
    max_channels: u16,
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}) ({})",
            self.name, self.max_channels, self.host
        )
    }
}

/// A cpal output stream that mixes triggered samples.
///
/// The stream lives on its own thread, as streams can't be moved between
/// threads on every platform. Voices are handed to the stream callback over
/// an unbounded channel, so playing never blocks.
pub struct Device {
    name: String,
    host_id: cpal::HostId,
    channels: u16,
    sample_rate: u32,
    voices: Sender<Voice>,
    /// Dropping this ends the output thread, and with it the stream.
    _shutdown: Sender<()>,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}, Rate={}) ({})",
            self.name,
            self.channels,
            self.sample_rate,
            self.host_id.name()
        )
    }
}

/// Lists every output device on every available host.
pub fn list() -> Result<Vec<DeviceInfo>, AudioError> {
    // Suppress noisy backend output here.
    let _shh_stdout = shh::stdout()?;
    let _shh_stderr = shh::stderr()?;

    let mut devices = Vec::new();
    for host_id in cpal::available_hosts() {
        let host_devices = match cpal::host_from_id(host_id)?.devices() {
            Ok(host_devices) => host_devices,
            Err(e) => {
                error!(
                    err = e.to_string(),
                    host = host_id.name(),
                    "Unable to list devices for host"
                );
                continue;
            }
        };

        for device in host_devices {
            let Ok(output_configs) = device.supported_output_configs() else {
                continue;
            };
            let max_channels = output_configs
                .map(|output_config| output_config.channels())
                .max()
                .unwrap_or(0);
            if max_channels > 0 {
                devices.push(DeviceInfo {
                    name: device.name()?,
                    host: host_id.name().to_string(),
                    max_channels,
                });
            }
        }
    }

    devices.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(devices)
}

impl Device {
    /// Opens the configured device and starts its output stream.
    pub fn get(config: &config::Audio) -> Result<Device, AudioError> {
        let span = span!(Level::INFO, "audio device (cpal)");
        let _enter = span.enter();

        let name = config.device();
        let (host_id, device) = find(name)?.ok_or_else(|| AudioError::NotFound(name.to_string()))?;
        let supported = choose_config(&device, config.sample_rate())?
            .ok_or_else(|| AudioError::NoOutput(name.to_string()))?;
        let stream_config = supported.config();
        let sample_format = supported.sample_format();

        let (voices_tx, voices_rx) = crossbeam_channel::unbounded();
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(0);
        let (ready_tx, ready_rx) = crossbeam_channel::bounded(1);

        {
            let stream_config = stream_config.clone();
            thread::spawn(move || {
                let stream = match sample_format {
                    cpal::SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, voices_rx),
                    cpal::SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, voices_rx),
                    cpal::SampleFormat::I32 => build_stream::<i32>(&device, &stream_config, voices_rx),
                    other => Err(AudioError::UnsupportedFormat(other.to_string())),
                };
                let stream = match stream.and_then(|stream| {
                    stream.play()?;
                    Ok(stream)
                }) {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));

                // Hold the stream until the device goes away.
                let _ = shutdown_rx.recv();
                drop(stream);
                info!("Output stream closed");
            });
        }

        ready_rx.recv().map_err(|_| AudioError::Closed)??;

        info!(
            device = name,
            channels = stream_config.channels,
            sample_rate = config.sample_rate(),
            format = sample_format.to_string(),
            "Output stream started"
        );

        Ok(Device {
            name: name.to_string(),
            host_id,
            channels: stream_config.channels,
            sample_rate: config.sample_rate(),
            voices: voices_tx,
            _shutdown: shutdown_tx,
        })
    }
}

impl AudioDevice for Device {
    fn play(&self, sample: &LoadedSample) -> Result<(), AudioError> {
        self.voices
            .send(Voice::new(sample))
            .map_err(|_| AudioError::Closed)
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Finds an output device by name across all hosts.
fn find(name: &str) -> Result<Option<(cpal::HostId, cpal::Device)>, AudioError> {
    let _shh_stdout = shh::stdout()?;
    let _shh_stderr = shh::stderr()?;

    if name == DEFAULT_DEVICE {
        let host = cpal::default_host();
        return Ok(host.default_output_device().map(|device| (host.id(), device)));
    }

    for host_id in cpal::available_hosts() {
        let Ok(devices) = cpal::host_from_id(host_id)?.devices() else {
            continue;
        };
        for device in devices {
            if device.name()?.trim() == name {
                return Ok(Some((host_id, device)));
            }
        }
    }
    Ok(None)
}

/// Picks an output configuration at the given sample rate, preferring float
/// output over integer output.
fn choose_config(
    device: &cpal::Device,
    sample_rate: u32,
) -> Result<Option<cpal::SupportedStreamConfig>, AudioError> {
    let ranges: Vec<cpal::SupportedStreamConfigRange> = device
        .supported_output_configs()?
        .filter(|range| range.min_sample_rate() <= sample_rate && sample_rate <= range.max_sample_rate())
        .collect();

    for format in [
        cpal::SampleFormat::F32,
        cpal::SampleFormat::I32,
        cpal::SampleFormat::I16,
    ] {
        if let Some(range) = ranges.iter().find(|range| range.sample_format() == format) {
            return Ok(Some(range.clone().with_sample_rate(sample_rate)));
        }
    }
    Ok(None)
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    voices: Receiver<Voice>,
) -> Result<cpal::Stream, AudioError>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let mut mixer = Mixer::new(config.channels);
    let mut scratch: Vec<f32> = Vec::new();

    Ok(device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            while let Ok(voice) = voices.try_recv() {
                mixer.add(voice);
            }
            scratch.resize(data.len(), 0.0);
            mixer.mix_into(&mut scratch);
            for (dst, &src) in data.iter_mut().zip(scratch.iter()) {
                *dst = T::from_sample(src);
            }
        },
        |err| error!(err = err.to_string(), "Output stream error"),
        None,
    )?)
}
