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
use std::collections::HashSet;

use serde::Deserialize;

use super::audio::Audio;
use super::error::ConfigError;
use crate::instrument::{self, Instrument};
use crate::signature::TimeSignature;
use crate::tempo::Tempo;

/// The configuration for the sequencer. Everything is optional.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Sequencer {
    /// The audio output.
    #[serde(default)]
    audio: Audio,
    /// The starting tempo in BPM. Out of range values are clamped.
    tempo: Option<i64>,
    /// The starting time signature, e.g. "3/4".
    time_signature: Option<String>,
    /// The instruments, in grid row order.
    instruments: Option<Vec<Instrument>>,
}

impl Sequencer {
    pub fn audio(&self) -> &Audio {
        &self.audio
    }

    /// The starting tempo (default: 120).
    pub fn tempo(&self) -> Tempo {
        self.tempo.map(Tempo::clamped).unwrap_or_default()
    }

    /// The starting time signature (default: 4/4). Unlike signature changes at
    /// runtime, an unknown signature here is an error.
    pub fn time_signature(&self) -> Result<TimeSignature, ConfigError> {
        match &self.time_signature {
            Some(id) => Ok(id.parse()?),
            None => Ok(TimeSignature::default()),
        }
    }

    /// The instruments (default: kick, snare, hat and crash). Names identify
    /// rows and samples, so they must be unique.
    pub fn instruments(&self) -> Result<Vec<Instrument>, ConfigError> {
        let instruments = match &self.instruments {
            Some(instruments) if instruments.is_empty() => {
                return Err(ConfigError::NoInstruments)
            }
            Some(instruments) => instruments.clone(),
            None => return Ok(instrument::default_kit()),
        };

        let mut seen = HashSet::new();
        for instrument in &instruments {
            if !seen.insert(instrument.name()) {
                return Err(ConfigError::DuplicateInstrument(instrument.name().to_string()));
            }
        }
        Ok(instruments)
    }
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use config::{Config, File, FileFormat};

    use super::*;

    fn parse(yaml: &str) -> Sequencer {
        Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let sequencer = parse("{}");
        assert_eq!("default", sequencer.audio().device());
        assert_eq!(Tempo::DEFAULT, sequencer.tempo());
        assert_eq!(TimeSignature::FourFour, sequencer.time_signature().unwrap());
        let names: Vec<String> = sequencer
            .instruments()
            .unwrap()
            .iter()
            .map(|i| i.name().to_string())
            .collect();
        assert_eq!(vec!["Kick", "Snare", "Hat", "Crash"], names);
    }

    #[test]
    fn test_parse() {
        let sequencer = parse(
            r#"
            audio:
              device: mock-device
              sample_rate: 48000
            tempo: 300
            time_signature: "7/8"
            instruments:
              - name: Kick
                file: sounds/kick.wav
              - name: Clap
                file: /samples/clap.flac
            "#,
        );
        assert_eq!("mock-device", sequencer.audio().device());
        assert_eq!(48000, sequencer.audio().sample_rate());
        assert_eq!(Tempo::MAX, sequencer.tempo());
        assert_eq!(TimeSignature::SevenEight, sequencer.time_signature().unwrap());

        let instruments = sequencer.instruments().unwrap();
        assert_eq!(2, instruments.len());
        assert_eq!("Clap", instruments[1].name());
        assert_eq!(Path::new("sounds/kick.wav"), instruments[0].file());
    }

    #[test]
    fn test_bad_values() {
        let sequencer = parse(r#"time_signature: "6/8""#);
        assert!(matches!(
            sequencer.time_signature(),
            Err(ConfigError::Signature(_))
        ));

        let sequencer = parse("instruments: []");
        assert!(matches!(
            sequencer.instruments(),
            Err(ConfigError::NoInstruments)
        ));
    }

    #[test]
    fn test_duplicate_instruments() {
        let sequencer = parse(
            r#"
            instruments:
              - name: Kick
                file: a.wav
              - name: Snare
                file: snare.wav
              - name: Kick
                file: b.wav
            "#,
        );
        match sequencer.instruments() {
            Err(ConfigError::DuplicateInstrument(name)) => assert_eq!("Kick", name),
            other => panic!("expected a duplicate instrument error, got {other:?}"),
        }
    }
}
