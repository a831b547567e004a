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

//! Time signatures and the step layout they imply.
//!
//! A signature is split into sections (one per beat, used for downbeat marking)
//! and each section into a fixed number of steps. The layout is all the clock
//! and the grid need to know about a signature.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

/// The layout used for any identifier that isn't a known signature.
pub const FALLBACK_LAYOUT: Layout = Layout {
    sections: 4,
    steps_per_section: 4,
};

/// The sections and steps per section of a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    sections: usize,
    steps_per_section: usize,
}

impl Layout {
    /// Creates a new layout. Both values must be at least 1.
    pub(crate) const fn new(sections: usize, steps_per_section: usize) -> Layout {
        assert!(sections >= 1, "a layout needs at least one section");
        assert!(
            steps_per_section >= 1,
            "a layout needs at least one step per section"
        );
        Layout {
            sections,
            steps_per_section,
        }
    }

    /// The number of sections (beats) in the layout.
    pub fn sections(&self) -> usize {
        self.sections
    }

    /// The number of steps in each section.
    pub fn steps_per_section(&self) -> usize {
        self.steps_per_section
    }

    /// The total number of steps in one pass of the pattern.
    pub fn total_steps(&self) -> usize {
        self.sections * self.steps_per_section
    }

    /// Returns true if the step starts a section.
    pub fn is_downbeat(&self, step: usize) -> bool {
        step % self.steps_per_section == 0
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("unknown time signature '{0}' (expected one of 4/4, 3/4, 5/4, 7/8)")]
    Unknown(String),
}

/// The time signatures the sequencer knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeSignature {
    #[default]
    FourFour,
    ThreeFour,
    FiveFour,
    SevenEight,
}

impl TimeSignature {
    /// All known signatures, in menu order.
    pub const ALL: [TimeSignature; 4] = [
        TimeSignature::FourFour,
        TimeSignature::ThreeFour,
        TimeSignature::FiveFour,
        TimeSignature::SevenEight,
    ];

    /// The symbolic identifier, e.g. "7/8".
    pub fn id(&self) -> &'static str {
        match self {
            TimeSignature::FourFour => "4/4",
            TimeSignature::ThreeFour => "3/4",
            TimeSignature::FiveFour => "5/4",
            TimeSignature::SevenEight => "7/8",
        }
    }

    /// The step layout of this signature.
    pub fn layout(&self) -> Layout {
        match self {
            TimeSignature::FourFour => Layout::new(4, 4),
            TimeSignature::ThreeFour => Layout::new(3, 4),
            TimeSignature::FiveFour => Layout::new(5, 4),
            // Eighth-note beats get two sixteenth steps each.
            TimeSignature::SevenEight => Layout::new(7, 2),
        }
    }

    /// Looks up a signature by identifier, returning None for unknown identifiers.
    pub fn lookup(id: &str) -> Option<TimeSignature> {
        let id = id.trim();
        TimeSignature::ALL.into_iter().find(|sig| sig.id() == id)
    }
}

impl FromStr for TimeSignature {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeSignature::lookup(s).ok_or_else(|| SignatureError::Unknown(s.to_string()))
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Resolves an identifier to a signature. Unknown identifiers resolve to the
/// default signature, whose layout is [FALLBACK_LAYOUT], rather than failing.
pub fn resolve_signature(id: &str) -> TimeSignature {
    TimeSignature::lookup(id).unwrap_or_else(|| {
        debug!(id, "Unknown time signature, using fallback layout");
        TimeSignature::default()
    })
}

/// Resolves an identifier to its layout, falling back to 4 sections of 4 steps.
pub fn resolve(id: &str) -> Layout {
    resolve_signature(id).layout()
}
