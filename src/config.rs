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
use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use ::config::{Config, File};
use tracing::info;

use crate::control::ControlSurface;
use crate::controller::{keyboard, Controller};
use crate::instrument::Instrument;
use crate::samples::SampleBank;
use crate::transport::SequencerState;
use crate::trigger::SoundTrigger;

mod audio;
mod error;
mod sequencer;

pub use self::audio::Audio;
pub use self::error::ConfigError;
pub use self::sequencer::Sequencer;

/// Reads the sequencer configuration from a YAML file.
pub fn parse_sequencer(path: &Path) -> Result<Sequencer, ConfigError> {
    Ok(Config::builder()
        .add_source(File::from(path))
        .build()?
        .try_deserialize()?)
}

/// Initializes the sequencer and a keyboard controller from the given config
/// file, or from the defaults if there is none. Relative sample paths are
/// resolved against the config file's directory, or the current directory.
/// Samples keep loading in the background after this returns.
pub fn init_sequencer_and_controller(path: Option<&Path>) -> Result<Controller, Box<dyn Error>> {
    let (config, base) = match path {
        Some(path) => (
            parse_sequencer(path)?,
            path.parent().map(Path::to_path_buf).unwrap_or_default(),
        ),
        None => (Sequencer::default(), std::env::current_dir()?),
    };

    let instruments: Vec<Instrument> = config
        .instruments()?
        .iter()
        .map(|instrument| instrument.relative_to(&base))
        .collect();
    let signature = config.time_signature()?;
    let tempo = config.tempo();
    let device = crate::audio::get_device(config.audio())?;
    info!(device = device.to_string(), "Using audio device");

    let bank = SampleBank::new();
    bank.load_in_background(&instruments, device.sample_rate());

    let names: Vec<String> = instruments
        .iter()
        .map(|instrument| instrument.name().to_string())
        .collect();
    let trigger = SoundTrigger::new(names.clone(), bank, device);
    let state = SequencerState::new(names, signature, tempo);
    let (sequencer, _) = crate::sequencer::Sequencer::spawn(state, trigger);
    let surface = ControlSurface::new(sequencer, tempo, signature);

    Ok(Controller::new(surface, Arc::new(keyboard::Driver::new())))
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_parse_sequencer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("beatronome.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "tempo: 96\ntime_signature: \"5/4\"").unwrap();

        let config = parse_sequencer(&path).unwrap();
        assert_eq!(96, config.tempo().bpm());
        assert_eq!(
            crate::signature::TimeSignature::FiveFour,
            config.time_signature().unwrap()
        );
    }

    #[test]
    fn test_parse_missing_file() {
        let result = parse_sequencer(Path::new("/nonexistent/beatronome.yaml"));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }
}
