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

//! The sequencer task.
//!
//! A single task owns the sequencer state and the metronome. Commands and
//! ticks are handled one at a time, commands first, so a tick that comes due
//! while a stop, pause or tempo change is pending is dropped along with the
//! schedule it belonged to. Every command gets the resulting [Snapshot] back,
//! and observers can follow along through [Sequencer::subscribe].

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, span, Instrument, Level};

use crate::grid::GridError;
use crate::metronome::Metronome;
use crate::signature::TimeSignature;
use crate::tempo::Tempo;
use crate::transport::{Effect, SequencerState};
use crate::trigger::SoundTrigger;

pub use crate::transport::{Snapshot, TransportState};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SequencerError {
    #[error("the sequencer is no longer running")]
    Closed,

    #[error(transparent)]
    Grid(#[from] GridError),
}

#[derive(Debug)]
enum Op {
    Start,
    Stop,
    TogglePlay,
    Reset,
    BeginAdjustment,
    EndAdjustment,
    ToggleCell { row: usize, col: usize },
    Snapshot,
    Retime(Tempo),
    Resize(TimeSignature),
    Shutdown,
}

struct Command {
    op: Op,
    reply: oneshot::Sender<Result<Snapshot, GridError>>,
}

/// A handle to a running sequencer task. Handles are cheap to clone; the task
/// exits once every handle is dropped or [Sequencer::shutdown] is called.
#[derive(Clone)]
pub struct Sequencer {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<Snapshot>,
}

impl Sequencer {
    /// Spawns the sequencer task on the current runtime.
    pub fn spawn(state: SequencerState, trigger: SoundTrigger) -> (Sequencer, JoinHandle<()>) {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (snapshots_tx, snapshots_rx) = watch::channel(state.snapshot());

        let span = span!(Level::INFO, "sequencer");
        let handle = tokio::spawn(run(state, trigger, commands_rx, snapshots_tx).instrument(span));

        (
            Sequencer {
                commands: commands_tx,
                snapshots: snapshots_rx,
            },
            handle,
        )
    }

    /// Starts playback from step 0. Step 0 is fired immediately.
    pub async fn start(&self) -> Result<Snapshot, SequencerError> {
        self.send(Op::Start).await
    }

    /// Stops playback and rewinds to step 0.
    pub async fn stop(&self) -> Result<Snapshot, SequencerError> {
        self.send(Op::Stop).await
    }

    /// Stops if playing, starts if stopped.
    pub async fn toggle_play(&self) -> Result<Snapshot, SequencerError> {
        self.send(Op::TogglePlay).await
    }

    /// Clears the grid and stops.
    pub async fn reset(&self) -> Result<Snapshot, SequencerError> {
        self.send(Op::Reset).await
    }

    /// Suspends ticking while a control is being adjusted.
    pub async fn begin_adjustment(&self) -> Result<Snapshot, SequencerError> {
        self.send(Op::BeginAdjustment).await
    }

    /// Resumes ticking from the current step if playback was running when
    /// the adjustment began.
    pub async fn end_adjustment(&self) -> Result<Snapshot, SequencerError> {
        self.send(Op::EndAdjustment).await
    }

    /// Flips one cell of the grid. The step pointer is unaffected.
    pub async fn toggle_cell(&self, row: usize, col: usize) -> Result<Snapshot, SequencerError> {
        self.send(Op::ToggleCell { row, col }).await
    }

    /// The current state.
    pub async fn snapshot(&self) -> Result<Snapshot, SequencerError> {
        self.send(Op::Snapshot).await
    }

    /// The most recently published state, without a round trip to the task.
    pub fn latest(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver that sees every state the sequencer publishes.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    /// Stops the task. Other handles will get [SequencerError::Closed] from then on.
    pub async fn shutdown(&self) -> Result<Snapshot, SequencerError> {
        self.send(Op::Shutdown).await
    }

    pub(crate) async fn retime(&self, tempo: Tempo) -> Result<Snapshot, SequencerError> {
        self.send(Op::Retime(tempo)).await
    }

    pub(crate) async fn resize(&self, signature: TimeSignature) -> Result<Snapshot, SequencerError> {
        self.send(Op::Resize(signature)).await
    }

    async fn send(&self, op: Op) -> Result<Snapshot, SequencerError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command {
                op,
                reply: reply_tx,
            })
            .map_err(|_| SequencerError::Closed)?;
        Ok(reply_rx.await.map_err(|_| SequencerError::Closed)??)
    }
}

async fn run(
    mut state: SequencerState,
    trigger: SoundTrigger,
    mut commands: mpsc::UnboundedReceiver<Command>,
    snapshots: watch::Sender<Snapshot>,
) {
    info!(
        signature = state.signature().id(),
        bpm = state.tempo().bpm(),
        "Sequencer started"
    );
    let mut metronome = Metronome::new();

    loop {
        tokio::select! {
            biased;

            command = commands.recv() => {
                let Some(Command { op, reply }) = command else {
                    break;
                };
                if matches!(op, Op::Shutdown) {
                    let _ = reply.send(Ok(state.snapshot()));
                    break;
                }

                let result = apply(&mut state, op).map(|effect| {
                    perform(effect, &state, &mut metronome, &trigger);
                    let snapshot = state.snapshot();
                    snapshots.send_replace(snapshot.clone());
                    snapshot
                });
                // The caller may have gone away; the command still took effect.
                let _ = reply.send(result);
            }

            _ = metronome.tick() => {
                if let Some(step) = state.advance() {
                    trigger.fire(state.grid(), step);
                }
                snapshots.send_replace(state.snapshot());
            }
        }
    }

    info!("Sequencer stopped");
}

fn apply(state: &mut SequencerState, op: Op) -> Result<Effect, GridError> {
    debug!(op = ?op, "Applying command");
    Ok(match op {
        Op::Start => state.start(),
        Op::Stop => state.stop(),
        Op::TogglePlay => state.toggle_play(),
        Op::Reset => state.reset(),
        Op::BeginAdjustment => state.begin_adjustment(),
        Op::EndAdjustment => state.end_adjustment(),
        Op::ToggleCell { row, col } => {
            state.toggle_cell(row, col)?;
            Effect::None
        }
        Op::Retime(tempo) => state.set_tempo(tempo),
        Op::Resize(signature) => state.set_signature(signature),
        Op::Snapshot | Op::Shutdown => Effect::None,
    })
}

fn perform(effect: Effect, state: &SequencerState, metronome: &mut Metronome, trigger: &SoundTrigger) {
    match effect {
        Effect::None => {}
        Effect::Arm { fire } => {
            metronome.arm(state.tempo().step_interval());
            if let Some(step) = fire {
                trigger.fire(state.grid(), step);
            }
        }
        Effect::Cancel => metronome.cancel(),
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::time::sleep;

    use super::*;
    use crate::audio::mock;
    use crate::samples::{LoadedSample, SampleBank};

    const KIT: [&str; 4] = ["Kick", "Snare", "Hat", "Crash"];

    fn sequencer(signature: TimeSignature, bpm: i64) -> (Sequencer, Arc<mock::Device>) {
        let names: Vec<String> = KIT.iter().map(|name| name.to_string()).collect();
        let bank = SampleBank::new();
        for name in KIT {
            bank.insert(LoadedSample::new(name, vec![0.5; 64], 1, 44100));
        }
        let device = Arc::new(mock::Device::get("mock"));
        let trigger = SoundTrigger::new(names.clone(), bank, device.clone());
        let state = SequencerState::new(names, signature, Tempo::clamped(bpm));
        let (sequencer, _) = Sequencer::spawn(state, trigger);
        (sequencer, device)
    }

    fn count(device: &mock::Device, name: &str) -> usize {
        device.played().iter().filter(|played| *played == name).count()
    }

    #[tokio::test(start_paused = true)]
    async fn test_kick_on_the_one() {
        let (sequencer, device) = sequencer(TimeSignature::FourFour, 120);
        sequencer.toggle_cell(0, 0).await.unwrap();

        let snapshot = sequencer.start().await.unwrap();
        assert_eq!(TransportState::Running, snapshot.transport);
        assert_eq!(0, snapshot.step);
        assert_eq!(1, count(&device, "Kick"));

        sleep(Duration::from_millis(130)).await;
        let snapshot = sequencer.snapshot().await.unwrap();
        assert_eq!(1, snapshot.step);
        assert_eq!(1, count(&device, "Kick"));

        // A full pass later the kick comes around again.
        sleep(Duration::from_millis(1875)).await;
        assert_eq!(0, sequencer.snapshot().await.unwrap().step);
        assert_eq!(2, count(&device, "Kick"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_steps_advance_at_tempo() {
        let (sequencer, _) = sequencer(TimeSignature::FourFour, 60);
        sequencer.start().await.unwrap();

        // Sample halfway between ticks.
        sleep(Duration::from_millis(125)).await;
        assert_eq!(0, sequencer.snapshot().await.unwrap().step);
        for expected in 1..=5 {
            sleep(Duration::from_millis(250)).await;
            assert_eq!(expected, sequencer.snapshot().await.unwrap().step);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_active_cell_fires_once_per_pass() {
        let (sequencer, device) = sequencer(TimeSignature::ThreeFour, 240);
        sequencer.toggle_cell(0, 0).await.unwrap();
        sequencer.toggle_cell(1, 4).await.unwrap();
        sequencer.toggle_cell(1, 8).await.unwrap();
        sequencer.toggle_cell(2, 11).await.unwrap();

        sequencer.start().await.unwrap();
        // 12 steps of 62.5ms; stop just short of the second pass.
        sleep(Duration::from_millis(62 * 12)).await;
        sequencer.stop().await.unwrap();

        assert_eq!(1, count(&device, "Kick"));
        assert_eq!(2, count(&device, "Snare"));
        assert_eq!(1, count(&device, "Hat"));
        assert_eq!(0, count(&device, "Crash"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_resets_and_silences() {
        let (sequencer, device) = sequencer(TimeSignature::FourFour, 120);
        for col in 0..16 {
            sequencer.toggle_cell(2, col).await.unwrap();
        }
        sequencer.start().await.unwrap();
        sleep(Duration::from_millis(250)).await;

        let snapshot = sequencer.stop().await.unwrap();
        assert_eq!(TransportState::Stopped, snapshot.transport);
        assert_eq!(0, snapshot.step);
        let played = device.played().len();

        // Whatever was due when the stop arrived never plays.
        sleep(Duration::from_secs(5)).await;
        assert_eq!(played, device.played().len());
        assert_eq!(0, sequencer.snapshot().await.unwrap().step);
    }

    #[tokio::test(start_paused = true)]
    async fn test_adjustment_pauses_and_resumes() {
        let (sequencer, device) = sequencer(TimeSignature::FourFour, 120);
        sequencer.toggle_cell(0, 1).await.unwrap();
        sequencer.start().await.unwrap();
        sleep(Duration::from_millis(130)).await;
        assert_eq!(1, count(&device, "Kick"));

        let snapshot = sequencer.begin_adjustment().await.unwrap();
        assert_eq!(TransportState::Adjusting { was_playing: true }, snapshot.transport);
        sleep(Duration::from_secs(2)).await;
        assert_eq!(1, sequencer.snapshot().await.unwrap().step);

        // Resuming continues from the held step without refiring it.
        let snapshot = sequencer.end_adjustment().await.unwrap();
        assert_eq!(TransportState::Running, snapshot.transport);
        assert_eq!(1, snapshot.step);
        assert_eq!(1, count(&device, "Kick"));

        sleep(Duration::from_millis(120)).await;
        assert_eq!(1, sequencer.snapshot().await.unwrap().step);
        sleep(Duration::from_millis(10)).await;
        assert_eq!(2, sequencer.snapshot().await.unwrap().step);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retime_rearms_from_now() {
        let (sequencer, _) = sequencer(TimeSignature::FourFour, 120);
        sequencer.start().await.unwrap();
        sleep(Duration::from_millis(130)).await;

        sequencer.retime(Tempo::clamped(60)).await.unwrap();
        sleep(Duration::from_millis(240)).await;
        assert_eq!(1, sequencer.snapshot().await.unwrap().step);
        sleep(Duration::from_millis(20)).await;
        assert_eq!(2, sequencer.snapshot().await.unwrap().step);
        sleep(Duration::from_millis(250)).await;
        assert_eq!(3, sequencer.snapshot().await.unwrap().step);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resize_clears_grid() {
        let (sequencer, _) = sequencer(TimeSignature::FourFour, 120);
        sequencer.toggle_cell(0, 0).await.unwrap();
        sequencer.start().await.unwrap();
        sleep(Duration::from_millis(260)).await;

        let snapshot = sequencer.resize(TimeSignature::SevenEight).await.unwrap();
        assert_eq!(14, snapshot.grid.cols());
        assert_eq!(4, snapshot.grid.rows());
        assert_eq!(0, snapshot.grid.active_count());
        assert_eq!(0, snapshot.step);
        assert_eq!(TransportState::Running, snapshot.transport);

        // The schedule kept running; the pattern now wraps at 14.
        sleep(Duration::from_millis(125 * 14)).await;
        assert_eq!(0, sequencer.snapshot().await.unwrap().step);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_cell_out_of_bounds() {
        let (sequencer, _) = sequencer(TimeSignature::FourFour, 120);
        let result = sequencer.toggle_cell(4, 0).await;
        assert_eq!(
            Err(SequencerError::Grid(GridError::OutOfBounds {
                row: 4,
                col: 0,
                rows: 4,
                cols: 16
            })),
            result
        );
        assert_eq!(0, sequencer.snapshot().await.unwrap().grid.active_count());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset() {
        let (sequencer, _) = sequencer(TimeSignature::FourFour, 120);
        sequencer.toggle_cell(3, 3).await.unwrap();
        sequencer.start().await.unwrap();
        sleep(Duration::from_millis(300)).await;

        let snapshot = sequencer.reset().await.unwrap();
        assert_eq!(TransportState::Stopped, snapshot.transport);
        assert_eq!(0, snapshot.step);
        assert_eq!(0, snapshot.grid.active_count());
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribe_sees_ticks() {
        let (sequencer, _) = sequencer(TimeSignature::FourFour, 120);
        let mut snapshots = sequencer.subscribe();
        sequencer.start().await.unwrap();
        snapshots.borrow_and_update();

        snapshots.changed().await.unwrap();
        assert_eq!(1, snapshots.borrow_and_update().step);
        assert_eq!(1, sequencer.latest().step);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown() {
        let (sequencer, _) = sequencer(TimeSignature::FourFour, 120);
        let other = sequencer.clone();
        sequencer.shutdown().await.unwrap();
        assert_eq!(Err(SequencerError::Closed), other.start().await);
    }
}
