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
use serde::{Deserialize, Serialize};

use crate::signature::TimeSignature;

const GENERIC: &str = "Kick - Snare";

/// A suggested beat for a time signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drumbeat {
    pub drumbeat: String,
}

/// Describes a basic beat for the signature. Unknown signatures get a generic
/// two-hit beat.
pub fn describe(id: &str) -> &'static str {
    match TimeSignature::lookup(id) {
        Some(TimeSignature::FourFour) => "Kick - Snare - Kick - Snare",
        Some(TimeSignature::ThreeFour) => "Kick - Snare - Snare",
        Some(TimeSignature::FiveFour) => "Kick - Snare - Kick - Snare - Kick",
        Some(TimeSignature::SevenEight) => "Kick - Snare - Kick - Snare - Kick - Snare - Kick",
        None => GENERIC,
    }
}

/// The beat for the signature as a JSON document: `{"drumbeat": "..."}`.
pub fn describe_json(id: &str) -> Result<String, serde_json::Error> {
    serde_json::to_string(&Drumbeat {
        drumbeat: describe(id).to_string(),
    })
}
