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
use std::num::IntErrorKind;
use std::time::Duration;

/// Steps are sixteenth notes: four per quarter-note beat.
pub const STEPS_PER_BEAT: u64 = 4;

const NANOS_PER_MINUTE: u64 = 60_000_000_000;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TempoError {
    #[error("tempo '{0}' is not a number")]
    NotANumber(String),
}

/// A tempo in beats per minute, always within [Tempo::MIN, Tempo::MAX].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tempo(u32);

impl Tempo {
    pub const MIN: Tempo = Tempo(10);
    pub const MAX: Tempo = Tempo(240);
    pub const DEFAULT: Tempo = Tempo(120);

    /// Creates a tempo, clamping the value into the supported range.
    pub fn clamped(bpm: i64) -> Tempo {
        let bpm = bpm.clamp(i64::from(Tempo::MIN.0), i64::from(Tempo::MAX.0));
        Tempo(bpm as u32)
    }

    /// Parses user input. Surrounding whitespace is ignored, a fractional part
    /// is truncated, and anything out of range is clamped. Input that isn't a
    /// plain decimal number is rejected.
    pub fn parse(raw: &str) -> Result<Tempo, TempoError> {
        let not_a_number = || TempoError::NotANumber(raw.to_string());
        let trimmed = raw.trim();
        let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
        if !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(not_a_number());
        }

        let value = match whole.parse::<i64>() {
            Ok(value) => value,
            Err(e) => match e.kind() {
                IntErrorKind::PosOverflow => i64::MAX,
                IntErrorKind::NegOverflow => i64::MIN,
                _ => return Err(not_a_number()),
            },
        };
        Ok(Tempo::clamped(value))
    }

    /// The tempo in beats per minute.
    pub fn bpm(&self) -> u32 {
        self.0
    }

    /// The time between two steps: 60000 / (bpm * 4) milliseconds.
    pub fn step_interval(&self) -> Duration {
        Duration::from_nanos(NANOS_PER_MINUTE / (u64::from(self.0) * STEPS_PER_BEAT))
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Tempo::DEFAULT
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bpm", self.0)
    }
}
