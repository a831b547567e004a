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

//! Decodes sound files entirely into memory so that triggering is just a
//! pointer copy.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, info, span, Level};

#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    #[error("unable to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to decode {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: SymphoniaError,
    },

    #[error("{0} has no audio track")]
    NoTrack(String),

    #[error("{0} does not specify a sample rate")]
    NoSampleRate(String),

    #[error("{0} contains no audio")]
    Empty(String),
}

/// A sample decoded into memory. Cloning is cheap; the audio data is shared.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedSample {
    name: String,
    /// Interleaved f32 frames.
    data: Arc<Vec<f32>>,
    channels: u16,
    sample_rate: u32,
}

impl LoadedSample {
    pub fn new(name: &str, data: Vec<f32>, channels: u16, sample_rate: u32) -> LoadedSample {
        LoadedSample {
            name: name.to_string(),
            data: Arc::new(data),
            channels: channels.max(1),
            sample_rate,
        }
    }

    /// The name of the instrument this sample belongs to.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &Arc<Vec<f32>> {
        &self.data
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// The number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.data.len() / usize::from(self.channels)
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / f64::from(self.sample_rate))
    }
}

/// Decodes the file at the given path and converts it to the target sample rate.
pub fn load(name: &str, path: &Path, target_sample_rate: u32) -> Result<LoadedSample, SampleError> {
    let span = span!(Level::INFO, "sample loader");
    let _enter = span.enter();

    let path_str = path.display().to_string();
    let (samples, channels, source_rate) = decode(path)?;
    if samples.is_empty() {
        return Err(SampleError::Empty(path_str));
    }

    let samples = if source_rate != target_sample_rate {
        debug!(
            file = %path.display(),
            source_rate, target_sample_rate, "Transcoding sample"
        );
        transcode(&samples, channels, source_rate, target_sample_rate)
    } else {
        samples
    };

    let loaded = LoadedSample::new(name, samples, channels, target_sample_rate);
    info!(
        instrument = name,
        file = %path.display(),
        channels,
        sample_rate = target_sample_rate,
        duration_ms = loaded.duration().as_millis(),
        "Sample loaded"
    );
    Ok(loaded)
}

/// Decodes every packet of the first audio track into interleaved f32 samples.
fn decode(path: &Path) -> Result<(Vec<f32>, u16, u32), SampleError> {
    let path_str = path.display().to_string();
    let file = File::open(path).map_err(|source| SampleError::Io {
        path: path_str.clone(),
        source,
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    let decode_error = |source| SampleError::Decode {
        path: path_str.clone(),
        source,
    };

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(decode_error)?;
    let mut format_reader = probed.format;

    let track = format_reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| SampleError::NoTrack(path_str.clone()))?;
    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| SampleError::NoSampleRate(path_str.clone()))?;
    let mut channels = track
        .codec_params
        .channels
        .map(|c| c.count() as u16)
        .unwrap_or(0);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(decode_error)?;

    let mut samples = Vec::new();
    let mut buffer: Option<SampleBuffer<f32>> = None;
    loop {
        let packet = match format_reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(e) => return Err(decode_error(e)),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // A corrupt packet is dropped; the rest of the file may still be fine.
            Err(SymphoniaError::DecodeError(e)) => {
                debug!(file = %path.display(), err = e, "Skipping undecodable packet");
                continue;
            }
            Err(e) => return Err(decode_error(e)),
        };

        if channels == 0 {
            channels = decoded.spec().channels.count() as u16;
        }
        let buffer = buffer.get_or_insert_with(|| {
            SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec())
        });
        if buffer.capacity() < decoded.capacity() * decoded.spec().channels.count() {
            *buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
        }
        buffer.copy_interleaved_ref(decoded);
        samples.extend_from_slice(buffer.samples());
    }

    Ok((samples, channels.max(1), sample_rate))
}

/// Converts interleaved samples between sample rates with linear interpolation.
/// Good enough for drum hits and other one-shots.
pub(crate) fn transcode(
    samples: &[f32],
    channels: u16,
    source_rate: u32,
    target_rate: u32,
) -> Vec<f32> {
    let channels = usize::from(channels.max(1));
    let ratio = f64::from(target_rate) / f64::from(source_rate);
    let source_frames = samples.len() / channels;
    let target_frames = (source_frames as f64 * ratio).ceil() as usize;

    let mut output = Vec::with_capacity(target_frames * channels);
    for target_frame in 0..target_frames {
        let source_pos = target_frame as f64 / ratio;
        let source_frame = source_pos.floor() as usize;
        let frac = source_pos.fract() as f32;

        for channel in 0..channels {
            let s0 = samples
                .get(source_frame * channels + channel)
                .copied()
                .unwrap_or(0.0);
            let s1 = samples
                .get((source_frame + 1) * channels + channel)
                .copied()
                .unwrap_or(s0);
            output.push(s0 + (s1 - s0) * frac);
        }
    }
    output
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use super::*;

    fn write_wav(path: &Path, channels: u16, sample_rate: u32, frames: usize) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for frame in 0..frames {
            for channel in 0..channels {
                let value = if channel == 0 { 16384 } else { -16384 };
                writer
                    .write_sample(if frame % 2 == 0 { value } else { 0i16 })
                    .unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_load_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snare.wav");
        write_wav(&path, 1, 44100, 4410);

        let sample = load("Snare", &path, 44100).unwrap();
        assert_eq!("Snare", sample.name());
        assert_eq!(1, sample.channels());
        assert_eq!(44100, sample.sample_rate());
        assert_eq!(4410, sample.frames());
        assert_eq!(Duration::from_millis(100), sample.duration());
        assert!((sample.data()[0] - 0.5).abs() < 0.001);
        assert_eq!(0.0, sample.data()[1]);
    }

    #[test]
    fn test_load_stereo_transcodes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crash.wav");
        write_wav(&path, 2, 24000, 2400);

        let sample = load("Crash", &path, 48000).unwrap();
        assert_eq!(2, sample.channels());
        assert_eq!(48000, sample.sample_rate());
        assert_eq!(4800, sample.frames());
        assert!((sample.data()[0] - 0.5).abs() < 0.001);
        assert!((sample.data()[1] + 0.5).abs() < 0.001);
    }

    #[test]
    fn test_load_logs_at_debug() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tom.wav");
        write_wav(&path, 1, 22050, 2205);

        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_test_writer()
            .finish();
        let sample = tracing::subscriber::with_default(subscriber, || {
            load("Tom", &path, 44100).unwrap()
        });
        assert_eq!(4410, sample.frames());
    }

    #[test]
    fn test_load_missing_file() {
        let result = load("Kick", &PathBuf::from("/nonexistent/kick.mp3"), 44100);
        assert!(matches!(result, Err(SampleError::Io { .. })));
    }

    #[test]
    fn test_load_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hat.wav");
        std::fs::write(&path, b"definitely not a wav file").unwrap();
        assert!(load("Hat", &path, 44100).is_err());
    }

    #[test]
    fn test_transcode_length() {
        let source: Vec<f32> = (0..4410)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44100.0).sin())
            .collect();
        let result = transcode(&source, 1, 44100, 48000);
        let expected_len = (4410.0_f64 * 48000.0 / 44100.0).ceil() as usize;
        assert_eq!(expected_len, result.len());
    }

    #[test]
    fn test_transcode_keeps_channels_apart() {
        let source = vec![1.0f32, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0];
        let result = transcode(&source, 2, 44100, 88200);
        assert_eq!(16, result.len());
        for frame in result.chunks(2) {
            assert!((frame[0] - 1.0).abs() < 0.001);
            assert!((frame[1] + 1.0).abs() < 0.001);
        }
    }
}
