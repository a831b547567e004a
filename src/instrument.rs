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
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// A named sound. The position of an instrument in the instrument list is its
/// row in the grid.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Instrument {
    name: String,
    file: PathBuf,
}

impl Instrument {
    pub fn new(name: &str, file: impl Into<PathBuf>) -> Instrument {
        Instrument {
            name: name.to_string(),
            file: file.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Returns a copy of this instrument with a relative file resolved against
    /// the given directory.
    pub fn relative_to(&self, dir: &Path) -> Instrument {
        if self.file.is_absolute() {
            return self.clone();
        }
        Instrument {
            name: self.name.clone(),
            file: dir.join(&self.file),
        }
    }
}

/// The stock kit: kick, snare, hi-hat and crash.
pub fn default_kit() -> Vec<Instrument> {
    vec![
        Instrument::new("Kick", "kick.mp3"),
        Instrument::new("Snare", "snare.wav"),
        Instrument::new("Hat", "hat.wav"),
        Instrument::new("Crash", "crash.wav"),
    ]
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use super::*;

    #[test]
    fn test_default_kit_order() {
        let kit = default_kit();
        let names: Vec<&str> = kit.iter().map(|i| i.name()).collect();
        assert_eq!(vec!["Kick", "Snare", "Hat", "Crash"], names);
    }

    #[test]
    fn test_relative_to() {
        let kick = Instrument::new("Kick", "kick.mp3");
        let resolved = kick.relative_to(Path::new("/opt/kit"));
        assert_eq!(Path::new("/opt/kit/kick.mp3"), resolved.file());
        assert_eq!("Kick", resolved.name());

        let absolute = Instrument::new("Snare", "/samples/snare.wav");
        assert_eq!(absolute, absolute.relative_to(Path::new("/opt/kit")));
    }
}
