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
use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// A periodic tick source that holds at most one armed schedule.
#[derive(Debug, Default)]
pub struct Metronome {
    interval: Option<Interval>,
}

impl Metronome {
    pub fn new() -> Metronome {
        Metronome { interval: None }
    }

    /// Arms a schedule whose first tick is one period from now. Any schedule
    /// that was already armed is dropped first.
    pub fn arm(&mut self, period: Duration) {
        self.cancel();
        let mut interval = interval_at(Instant::now() + period, period);
        // A late tick shifts the following ones rather than bursting to catch up.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
    }

    pub fn cancel(&mut self) {
        self.interval = None;
    }

    pub fn is_armed(&self) -> bool {
        self.interval.is_some()
    }

    /// The period of the armed schedule.
    pub fn period(&self) -> Option<Duration> {
        self.interval.as_ref().map(|interval| interval.period())
    }

    /// Waits for the next tick. Never completes while disarmed.
    ///
    /// Cancel safe: dropping the future before it completes does not lose a tick.
    pub async fn tick(&mut self) -> Instant {
        match self.interval.as_mut() {
            Some(interval) => interval.tick().await,
            None => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use tokio::time::{timeout, Instant};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_at_period() {
        let mut metronome = Metronome::new();
        let started = Instant::now();
        metronome.arm(Duration::from_millis(125));
        assert!(metronome.is_armed());
        assert_eq!(Some(Duration::from_millis(125)), metronome.period());

        for n in 1..=4 {
            let at = metronome.tick().await;
            assert_eq!(Duration::from_millis(125 * n), at - started);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarmed_never_ticks() {
        let mut metronome = Metronome::new();
        assert!(timeout(Duration::from_secs(10), metronome.tick())
            .await
            .is_err());

        metronome.arm(Duration::from_millis(100));
        metronome.cancel();
        assert!(!metronome.is_armed());
        assert!(timeout(Duration::from_secs(10), metronome.tick())
            .await
            .is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_replaces_schedule() {
        let mut metronome = Metronome::new();
        metronome.arm(Duration::from_millis(500));
        tokio::time::sleep(Duration::from_millis(300)).await;

        let rearmed = Instant::now();
        metronome.arm(Duration::from_millis(250));
        let at = metronome.tick().await;
        // The old schedule would have ticked 200ms from the rearm.
        assert_eq!(Duration::from_millis(250), at - rearmed);
        let at = metronome.tick().await;
        assert_eq!(Duration::from_millis(500), at - rearmed);
    }
}
