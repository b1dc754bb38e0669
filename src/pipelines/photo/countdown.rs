// SPDX-License-Identifier: GPL-3.0-only

//! Countdown before each shot
//!
//! [`Countdown`] is the bare state machine, driven by synthetic ticks.
//! [`CountdownScheduler`] drives it from a one-second timer and fans the
//! steps out to the overlay, the sound player and subscribers.
//!
//! ```text
//! Idle ─begin(n)─▶ Counting(n) ─tick─▶ … ─tick─▶ Counting(0)/Firing ─settle─▶ Idle
//!                      │                                │
//!                      └──────────── cancel ────────────┴──────────────────▶ Idle
//! ```
//!
//! The tick that reaches zero both shows `0` and fires, so `begin(3)` shows
//! 3, 2, 1, 0 and fires three seconds after it was called.

use crate::constants::timing;
use crate::errors::CountdownError;
use crate::feedback::{CountdownSurface, SoundEffect, SoundPlayer};
use futures::Stream;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::time::Instant;
use tracing::{debug, info};

/// One visible countdown value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownTick {
    pub remaining: u32,
    /// 1-based position of the shot in the session
    pub shot_index: u32,
    pub shot_total: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CountdownPhase {
    #[default]
    Idle,
    Counting(u32),
    Firing,
}

/// What a transition produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownStep {
    /// Show this value and wait one more tick
    Tick(CountdownTick),
    /// Show this (zero) value and capture now
    Fire(CountdownTick),
}

impl CountdownStep {
    pub fn tick(&self) -> CountdownTick {
        match self {
            CountdownStep::Tick(t) | CountdownStep::Fire(t) => *t,
        }
    }
}

/// Countdown state machine; transitions only move forward
#[derive(Debug, Clone, Default)]
pub struct Countdown {
    phase: CountdownPhase,
    shot_index: u32,
    shot_total: u32,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> CountdownPhase {
        self.phase
    }

    fn tick_value(&self, remaining: u32) -> CountdownTick {
        CountdownTick {
            remaining,
            shot_index: self.shot_index,
            shot_total: self.shot_total,
        }
    }

    /// Start counting from `total_seconds`
    ///
    /// Rejected while counting. A zero-second countdown fires immediately.
    pub fn begin(
        &mut self,
        total_seconds: u32,
        shot_index: u32,
        shot_total: u32,
    ) -> Result<CountdownStep, CountdownError> {
        if matches!(self.phase, CountdownPhase::Counting(_)) {
            return Err(CountdownError::AlreadyCounting);
        }

        self.shot_index = shot_index;
        self.shot_total = shot_total;

        if total_seconds == 0 {
            self.phase = CountdownPhase::Firing;
            Ok(CountdownStep::Fire(self.tick_value(0)))
        } else {
            self.phase = CountdownPhase::Counting(total_seconds);
            Ok(CountdownStep::Tick(self.tick_value(total_seconds)))
        }
    }

    /// Advance one second; `None` when not counting
    pub fn tick(&mut self) -> Option<CountdownStep> {
        match self.phase {
            CountdownPhase::Counting(n) if n > 1 => {
                self.phase = CountdownPhase::Counting(n - 1);
                Some(CountdownStep::Tick(self.tick_value(n - 1)))
            }
            CountdownPhase::Counting(_) => {
                self.phase = CountdownPhase::Firing;
                Some(CountdownStep::Fire(self.tick_value(0)))
            }
            CountdownPhase::Idle | CountdownPhase::Firing => None,
        }
    }

    /// Jump straight to firing (timed delay without visible ticks)
    pub fn finish(&mut self) -> Option<CountdownStep> {
        match self.phase {
            CountdownPhase::Counting(_) => {
                self.phase = CountdownPhase::Firing;
                Some(CountdownStep::Fire(self.tick_value(0)))
            }
            CountdownPhase::Idle | CountdownPhase::Firing => None,
        }
    }

    /// Leave `Firing` after the settle delay; true if a transition happened
    pub fn settle(&mut self) -> bool {
        if self.phase == CountdownPhase::Firing {
            self.phase = CountdownPhase::Idle;
            true
        } else {
            false
        }
    }

    /// Return to `Idle` from anywhere; true if something was interrupted
    pub fn cancel(&mut self) -> bool {
        let was_active = self.phase != CountdownPhase::Idle;
        self.phase = CountdownPhase::Idle;
        was_active
    }
}

/// Scheduler notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownEvent {
    Tick(CountdownTick),
    Fired(CountdownTick),
    /// Settle delay elapsed after firing
    Done,
    Cancelled,
}

type CaptureCallback = Arc<dyn Fn(&CountdownTick) + Send + Sync>;

struct SchedulerState {
    machine: Countdown,
    /// Bumped on every begin and cancel; stale timers compare against it
    generation: u64,
}

/// Timer-driven countdown with optional overlay and sounds
pub struct CountdownScheduler {
    state: Arc<Mutex<SchedulerState>>,
    cancel_tx: watch::Sender<u64>,
    events: broadcast::Sender<CountdownEvent>,
    surface: Option<Arc<dyn CountdownSurface>>,
    sounds: Option<Arc<dyn SoundPlayer>>,
    on_capture: Mutex<Option<CaptureCallback>>,
}

impl CountdownScheduler {
    pub fn new() -> Self {
        let (cancel_tx, _) = watch::channel(0);
        let (events, _) = broadcast::channel(32);
        Self {
            state: Arc::new(Mutex::new(SchedulerState {
                machine: Countdown::new(),
                generation: 0,
            })),
            cancel_tx,
            events,
            surface: None,
            sounds: None,
            on_capture: Mutex::new(None),
        }
    }

    /// Show ticks on this overlay; without one the countdown is a plain delay
    pub fn with_surface(mut self, surface: Arc<dyn CountdownSurface>) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn with_sounds(mut self, sounds: Arc<dyn SoundPlayer>) -> Self {
        self.sounds = Some(sounds);
        self
    }

    /// Register the callback invoked once per completed countdown
    pub fn set_capture_callback(&self, callback: impl Fn(&CountdownTick) + Send + Sync + 'static) {
        *self.on_capture.lock() = Some(Arc::new(callback));
    }

    pub fn phase(&self) -> CountdownPhase {
        self.state.lock().machine.phase()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CountdownEvent> {
        self.events.subscribe()
    }

    /// Every shown value, including the final zero
    pub fn ticks(&self) -> impl Stream<Item = CountdownTick> + Send + 'static {
        let mut rx = self.events.subscribe();
        async_stream::stream! {
            loop {
                match rx.recv().await {
                    Ok(CountdownEvent::Tick(tick)) | Ok(CountdownEvent::Fired(tick)) => yield tick,
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    /// Count down and resolve when the capture fires
    ///
    /// Fails with [`CountdownError::AlreadyCounting`] if another countdown is
    /// running (that countdown is left alone) and with
    /// [`CountdownError::Cancelled`] if [`cancel`](Self::cancel) is called
    /// before firing.
    pub async fn run(
        &self,
        total_seconds: u32,
        shot_index: u32,
        shot_total: u32,
    ) -> Result<CountdownTick, CountdownError> {
        let mut cancel_rx = self.cancel_tx.subscribe();
        let started = Instant::now();

        let (generation, first) = {
            let mut state = self.state.lock();
            let step = state.machine.begin(total_seconds, shot_index, shot_total)?;
            state.generation += 1;
            (state.generation, step)
        };
        let mut guard = RunGuard {
            scheduler: self,
            generation,
            armed: true,
        };

        info!(total_seconds, shot_index, shot_total, "Countdown started");
        if let Some(sounds) = &self.sounds {
            sounds.play(SoundEffect::CountdownStart);
        }

        let mut step = first;

        if self.surface.is_none() {
            // No overlay: one plain delay of the same total length
            if let CountdownStep::Tick(_) = step {
                let deadline = started + timing::COUNTDOWN_TICK * total_seconds;
                self.wait_until(deadline, generation, &mut cancel_rx).await?;
                step = self
                    .advance(generation, Countdown::finish)
                    .ok_or(CountdownError::Cancelled)?;
            }
        } else {
            self.emit(&step);
            let mut elapsed_ticks = 0;
            while let CountdownStep::Tick(_) = step {
                elapsed_ticks += 1;
                let deadline = started + timing::COUNTDOWN_TICK * elapsed_ticks;
                self.wait_until(deadline, generation, &mut cancel_rx).await?;
                step = self
                    .advance(generation, Countdown::tick)
                    .ok_or(CountdownError::Cancelled)?;
                if let CountdownStep::Tick(_) = step {
                    self.emit(&step);
                }
            }
        }

        let fired = step.tick();
        guard.armed = false;
        self.fire(&fired);
        self.schedule_settle(generation);
        Ok(fired)
    }

    /// Stop any running countdown and return to `Idle`
    pub fn cancel(&self) {
        self.interrupt(None);
    }

    /// Cancel; with `only` set, just when that countdown is still current
    fn interrupt(&self, only: Option<u64>) {
        let interrupted = {
            let mut state = self.state.lock();
            if only.is_some_and(|generation| generation != state.generation) {
                return;
            }
            state.generation += 1;
            state.machine.cancel()
        };
        self.cancel_tx.send_modify(|v| *v += 1);

        if interrupted {
            info!("Countdown cancelled");
            if let Some(surface) = &self.surface {
                surface.hide();
            }
            let _ = self.events.send(CountdownEvent::Cancelled);
        }
    }

    async fn wait_until(
        &self,
        deadline: Instant,
        generation: u64,
        cancel_rx: &mut watch::Receiver<u64>,
    ) -> Result<(), CountdownError> {
        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => break,
                changed = cancel_rx.changed() => {
                    if changed.is_err() || self.state.lock().generation != generation {
                        return Err(CountdownError::Cancelled);
                    }
                }
            }
        }
        if self.state.lock().generation != generation {
            return Err(CountdownError::Cancelled);
        }
        Ok(())
    }

    fn advance(
        &self,
        generation: u64,
        transition: fn(&mut Countdown) -> Option<CountdownStep>,
    ) -> Option<CountdownStep> {
        let mut state = self.state.lock();
        if state.generation != generation {
            return None;
        }
        transition(&mut state.machine)
    }

    fn emit(&self, step: &CountdownStep) {
        let tick = step.tick();
        debug!(remaining = tick.remaining, "Countdown tick");
        if let Some(surface) = &self.surface {
            surface.show(&tick);
        }
        if let Some(sounds) = &self.sounds {
            sounds.play(SoundEffect::CountdownTick);
        }
        let _ = self.events.send(CountdownEvent::Tick(tick));
    }

    fn fire(&self, tick: &CountdownTick) {
        info!(shot = tick.shot_index, total = tick.shot_total, "Countdown fired");
        if let Some(surface) = &self.surface {
            surface.show(tick);
            surface.hide();
        }
        if let Some(sounds) = &self.sounds {
            sounds.play(SoundEffect::CameraCapture);
        }
        let callback = self.on_capture.lock().clone();
        if let Some(callback) = callback {
            callback(tick);
        }
        let _ = self.events.send(CountdownEvent::Fired(*tick));
    }

    fn schedule_settle(&self, generation: u64) {
        let state = Arc::clone(&self.state);
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timing::SETTLE_DELAY).await;
            let settled = {
                let mut state = state.lock();
                state.generation == generation && state.machine.settle()
            };
            if settled {
                debug!("Countdown settled");
                let _ = events.send(CountdownEvent::Done);
            }
        });
    }
}

/// Cancels its countdown when a `run` future is dropped before firing
struct RunGuard<'a> {
    scheduler: &'a CountdownScheduler,
    generation: u64,
    armed: bool,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.scheduler.interrupt(Some(self.generation));
        }
    }
}

impl Default for CountdownScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_machine_ticks_down_and_fires() {
        let mut machine = Countdown::new();
        let first = machine.begin(3, 1, 1).unwrap();
        assert_eq!(first.tick().remaining, 3);

        let mut shown = vec![first.tick().remaining];
        let mut fires = 0;
        while let Some(step) = machine.tick() {
            shown.push(step.tick().remaining);
            if let CountdownStep::Fire(_) = step {
                fires += 1;
            }
        }

        assert_eq!(shown, vec![3, 2, 1, 0]);
        assert_eq!(fires, 1);
        assert_eq!(machine.phase(), CountdownPhase::Firing);
        assert!(machine.settle());
        assert_eq!(machine.phase(), CountdownPhase::Idle);
    }

    #[test]
    fn test_machine_rejects_begin_while_counting() {
        let mut machine = Countdown::new();
        machine.begin(5, 1, 2).unwrap();
        machine.tick();
        assert_eq!(machine.begin(3, 2, 2), Err(CountdownError::AlreadyCounting));
        assert_eq!(machine.phase(), CountdownPhase::Counting(4));
    }

    #[test]
    fn test_machine_zero_fires_immediately() {
        let mut machine = Countdown::new();
        let step = machine.begin(0, 1, 1).unwrap();
        assert!(matches!(step, CountdownStep::Fire(t) if t.remaining == 0));
        assert!(machine.tick().is_none());
    }

    #[test]
    fn test_machine_cancel() {
        let mut machine = Countdown::new();
        machine.begin(3, 1, 1).unwrap();
        assert!(machine.cancel());
        assert_eq!(machine.phase(), CountdownPhase::Idle);
        assert!(machine.tick().is_none());
        assert!(!machine.cancel());
    }

    #[tokio::test(start_paused = true)]
    async fn test_plain_delay_without_surface() {
        let scheduler = CountdownScheduler::new();
        let start = Instant::now();
        let fired = scheduler.run(2, 1, 1).await.unwrap();
        assert_eq!(fired.remaining, 0);
        assert_eq!(start.elapsed(), Duration::from_secs(2));
        assert_eq!(scheduler.phase(), CountdownPhase::Firing);

        tokio::time::sleep(timing::SETTLE_DELAY + Duration::from_millis(10)).await;
        assert_eq!(scheduler.phase(), CountdownPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_run() {
        let scheduler = Arc::new(CountdownScheduler::new());
        let runner = Arc::clone(&scheduler);
        let task = tokio::spawn(async move { runner.run(5, 1, 1).await });

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(scheduler.phase(), CountdownPhase::Counting(5));
        scheduler.cancel();

        assert_eq!(task.await.unwrap(), Err(CountdownError::Cancelled));
        assert_eq!(scheduler.phase(), CountdownPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_run_returns_to_idle() {
        let scheduler = CountdownScheduler::new();
        let mut events = scheduler.subscribe();

        let result = tokio::time::timeout(Duration::from_secs(1), scheduler.run(3, 1, 1)).await;
        assert!(result.is_err(), "run should still be counting at the timeout");
        assert_eq!(scheduler.phase(), CountdownPhase::Idle);
        assert_eq!(events.try_recv(), Ok(CountdownEvent::Cancelled));

        let fired = scheduler.run(0, 1, 1).await.unwrap();
        assert_eq!(fired.remaining, 0);
    }
}
