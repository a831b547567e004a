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
use tracing::info;

use crate::sequencer::{Sequencer, SequencerError, Snapshot};
use crate::signature::{self, TimeSignature};
use crate::tempo::{Tempo, TempoError};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ControlError {
    #[error("{source}, keeping {retained}")]
    InvalidTempo {
        #[source]
        source: TempoError,
        /// The tempo still in effect.
        retained: Tempo,
    },

    #[error(transparent)]
    Sequencer(#[from] SequencerError),
}

/// The tempo and time signature controls. Owns the tempo and signature and
/// pushes every change to the sequencer.
pub struct ControlSurface {
    sequencer: Sequencer,
    tempo: Tempo,
    signature: TimeSignature,
}

impl ControlSurface {
    pub fn new(sequencer: Sequencer, tempo: Tempo, signature: TimeSignature) -> ControlSurface {
        ControlSurface {
            sequencer,
            tempo,
            signature,
        }
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.signature
    }

    /// Sets the tempo from typed input. Input that isn't a number is rejected
    /// and the current tempo kept; numbers are truncated and clamped.
    pub async fn set_tempo(&mut self, raw: &str) -> Result<Tempo, ControlError> {
        let tempo = Tempo::parse(raw).map_err(|source| ControlError::InvalidTempo {
            source,
            retained: self.tempo,
        })?;
        self.apply_tempo(tempo).await?;
        Ok(tempo)
    }

    /// Sets the tempo from a slider position.
    pub async fn set_bpm(&mut self, bpm: i64) -> Result<Tempo, ControlError> {
        let tempo = Tempo::clamped(bpm);
        self.apply_tempo(tempo).await?;
        Ok(tempo)
    }

    /// Switches the time signature. Unknown identifiers fall back to 4/4. The
    /// grid is cleared and playback restarts from the first step.
    pub async fn set_time_signature(&mut self, id: &str) -> Result<Snapshot, ControlError> {
        let signature = signature::resolve_signature(id);
        let snapshot = self.sequencer.resize(signature).await?;
        self.signature = signature;
        info!(signature = signature.id(), "Time signature changed");
        Ok(snapshot)
    }

    /// A control gesture started. Playback is suspended until it ends.
    pub async fn begin_adjustment(&self) -> Result<Snapshot, ControlError> {
        Ok(self.sequencer.begin_adjustment().await?)
    }

    /// A control gesture ended. Playback resumes if it was running before.
    pub async fn end_adjustment(&self) -> Result<Snapshot, ControlError> {
        Ok(self.sequencer.end_adjustment().await?)
    }

    async fn apply_tempo(&mut self, tempo: Tempo) -> Result<(), SequencerError> {
        self.sequencer.retime(tempo).await?;
        self.tempo = tempo;
        info!(bpm = tempo.bpm(), "Tempo changed");
        Ok(())
    }
}
