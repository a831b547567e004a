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
// Voice mixing, independent of any audio backend.
use std::sync::Arc;

use crate::samples::LoadedSample;

/// One playing instance of a sample.
#[derive(Debug, Clone)]
pub struct Voice {
    data: Arc<Vec<f32>>,
    channels: usize,
    /// The next frame to play.
    position: usize,
}

impl Voice {
    /// Creates a voice that plays the sample from the start.
    pub fn new(sample: &LoadedSample) -> Voice {
        Voice {
            data: sample.data().clone(),
            channels: usize::from(sample.channels()),
            position: 0,
        }
    }

    fn frames(&self) -> usize {
        self.data.len() / self.channels
    }

    fn is_finished(&self) -> bool {
        self.position >= self.frames()
    }
}

/// Sums any number of voices into interleaved output buffers.
#[derive(Debug)]
pub struct Mixer {
    channels: usize,
    voices: Vec<Voice>,
}

impl Mixer {
    pub fn new(channels: u16) -> Mixer {
        Mixer {
            channels: usize::from(channels.max(1)),
            voices: Vec::new(),
        }
    }

    pub fn add(&mut self, voice: Voice) {
        self.voices.push(voice);
    }

    /// The number of voices still playing.
    pub fn active(&self) -> usize {
        self.voices.len()
    }

    /// Fills the interleaved output buffer with the sum of all voices. Mono
    /// voices are sent to every output channel; otherwise channels map one to
    /// one and extra channels on either side are dropped. Finished voices are
    /// removed.
    pub fn mix_into(&mut self, output: &mut [f32]) {
        output.fill(0.0);
        let out_channels = self.channels;
        let out_frames = output.len() / out_channels;

        for voice in self.voices.iter_mut() {
            let remaining = voice.frames().saturating_sub(voice.position);
            let frames = remaining.min(out_frames);

            for frame in 0..frames {
                let source = (voice.position + frame) * voice.channels;
                let target = frame * out_channels;
                if voice.channels == 1 {
                    let sample = voice.data[source];
                    for value in &mut output[target..target + out_channels] {
                        *value += sample;
                    }
                } else {
                    for channel in 0..voice.channels.min(out_channels) {
                        output[target + channel] += voice.data[source + channel];
                    }
                }
            }
            voice.position += frames;
        }

        self.voices.retain(|voice| !voice.is_finished());
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample(data: Vec<f32>, channels: u16) -> LoadedSample {
        LoadedSample::new("test", data, channels, 44100)
    }

    #[test]
    fn test_mono_to_stereo() {
        let mut mixer = Mixer::new(2);
        mixer.add(Voice::new(&sample(vec![0.1, 0.2, 0.3], 1)));

        let mut output = vec![1.0; 8];
        mixer.mix_into(&mut output);
        assert_eq!(vec![0.1, 0.1, 0.2, 0.2, 0.3, 0.3, 0.0, 0.0], output);
        assert_eq!(0, mixer.active());
    }

    #[test]
    fn test_stereo_maps_channels() {
        let mut mixer = Mixer::new(2);
        mixer.add(Voice::new(&sample(vec![0.5, -0.5, 0.25, -0.25], 2)));

        let mut output = vec![0.0; 4];
        mixer.mix_into(&mut output);
        assert_eq!(vec![0.5, -0.5, 0.25, -0.25], output);
    }

    #[test]
    fn test_overlapping_voices_sum() {
        let mut mixer = Mixer::new(1);
        let hit = sample(vec![0.25; 4], 1);
        mixer.add(Voice::new(&hit));
        mixer.add(Voice::new(&hit));

        let mut output = vec![0.0; 2];
        mixer.mix_into(&mut output);
        assert_eq!(vec![0.5, 0.5], output);
        assert_eq!(2, mixer.active());

        // A retrigger starts from the top while the earlier voices keep going.
        mixer.add(Voice::new(&hit));
        mixer.mix_into(&mut output);
        assert_eq!(vec![0.75, 0.75], output);
        assert_eq!(1, mixer.active());

        mixer.mix_into(&mut output);
        assert_eq!(vec![0.25, 0.25], output);
        assert_eq!(0, mixer.active());
    }

    #[test]
    fn test_spans_buffers() {
        let mut mixer = Mixer::new(1);
        mixer.add(Voice::new(&sample(vec![0.1, 0.2, 0.3, 0.4, 0.5], 1)));

        let mut output = vec![0.0; 2];
        mixer.mix_into(&mut output);
        assert_eq!(vec![0.1, 0.2], output);
        mixer.mix_into(&mut output);
        assert_eq!(vec![0.3, 0.4], output);
        mixer.mix_into(&mut output);
        assert_eq!(vec![0.5, 0.0], output);
        assert_eq!(0, mixer.active());
    }
}
