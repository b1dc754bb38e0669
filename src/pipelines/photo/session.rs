// SPDX-License-Identifier: GPL-3.0-only

//! Capture session orchestration
//!
//! One run repeats, for each requested photo:
//!
//! ```text
//! countdown ──▶ snapshot ──▶ style ──▶ smoothing ──▶ append ──▶ (pause) ──▶ next
//! ```
//!
//! A failed snapshot aborts the run and discards every photo taken so far,
//! so a partial session never reaches the compositor.

use super::countdown::CountdownScheduler;
use super::filters::{CosmeticFilterEngine, CosmeticStyle};
use super::raster::RasterImage;
use super::snapshot::FrameSnapshotter;
use crate::backends::camera::StreamHandle;
use crate::constants::{session as limits, timing};
use crate::errors::{CountdownError, SessionError};
use crate::feedback::{Notifier, Severity, SoundEffect, SoundPlayer};
use crate::frames::FrameSelection;
use chrono::{DateTime, Local};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Parameters and photos of one capture run
#[derive(Debug, Clone)]
pub struct CaptureSession {
    id: Uuid,
    photo_count: u32,
    capture_delay_seconds: u32,
    style: CosmeticStyle,
    smoothing_level: u8,
    frame: FrameSelection,
    photos: Vec<RasterImage>,
}

impl CaptureSession {
    pub fn new(
        photo_count: u32,
        capture_delay_seconds: u32,
        style: CosmeticStyle,
        smoothing_level: u8,
        frame: FrameSelection,
    ) -> Result<Self, SessionError> {
        if !(1..=limits::MAX_PHOTO_COUNT).contains(&photo_count) {
            return Err(SessionError::InvalidSession(format!(
                "photo count must be between 1 and {}, got {}",
                limits::MAX_PHOTO_COUNT,
                photo_count
            )));
        }
        if capture_delay_seconds > limits::MAX_CAPTURE_DELAY_SECS {
            return Err(SessionError::InvalidSession(format!(
                "capture delay must be at most {} seconds, got {}",
                limits::MAX_CAPTURE_DELAY_SECS,
                capture_delay_seconds
            )));
        }
        if smoothing_level > limits::MAX_SMOOTHING_LEVEL {
            return Err(SessionError::InvalidSession(format!(
                "smoothing level must be at most {}, got {}",
                limits::MAX_SMOOTHING_LEVEL,
                smoothing_level
            )));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            photo_count,
            capture_delay_seconds,
            style,
            smoothing_level,
            frame,
            photos: Vec::new(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn photo_count(&self) -> u32 {
        self.photo_count
    }

    pub fn capture_delay_seconds(&self) -> u32 {
        self.capture_delay_seconds
    }

    pub fn style(&self) -> CosmeticStyle {
        self.style
    }

    pub fn smoothing_level(&self) -> u8 {
        self.smoothing_level
    }

    pub fn frame(&self) -> &FrameSelection {
        &self.frame
    }

    /// Photos in capture order
    pub fn photos(&self) -> &[RasterImage] {
        &self.photos
    }
}

/// Finished session handed to the compositor; read-only
#[derive(Debug, Clone)]
pub struct SessionBundle {
    id: Uuid,
    photos: Vec<RasterImage>,
    frame: FrameSelection,
    style: CosmeticStyle,
    smoothing_level: u8,
    photo_count: u32,
    capture_delay_seconds: u32,
    completed_at: DateTime<Local>,
}

impl SessionBundle {
    fn from_session(session: CaptureSession) -> Self {
        Self {
            id: session.id,
            photos: session.photos,
            frame: session.frame,
            style: session.style,
            smoothing_level: session.smoothing_level,
            photo_count: session.photo_count,
            capture_delay_seconds: session.capture_delay_seconds,
            completed_at: Local::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn photos(&self) -> &[RasterImage] {
        &self.photos
    }

    pub fn frame(&self) -> &FrameSelection {
        &self.frame
    }

    pub fn style(&self) -> CosmeticStyle {
        self.style
    }

    pub fn smoothing_level(&self) -> u8 {
        self.smoothing_level
    }

    pub fn photo_count(&self) -> u32 {
        self.photo_count
    }

    pub fn capture_delay_seconds(&self) -> u32 {
        self.capture_delay_seconds
    }

    pub fn completed_at(&self) -> DateTime<Local> {
        self.completed_at
    }

    fn into_session(self) -> CaptureSession {
        CaptureSession {
            id: self.id,
            photo_count: self.photo_count,
            capture_delay_seconds: self.capture_delay_seconds,
            style: self.style,
            smoothing_level: self.smoothing_level,
            frame: self.frame,
            photos: self.photos,
        }
    }
}

/// Consumer of finished sessions (editor, exporter)
pub trait Compositor: Send + Sync {
    type Output: Send;
    type Error: std::error::Error + Send;

    fn compose(
        &self,
        bundle: SessionBundle,
    ) -> impl Future<Output = Result<Self::Output, Self::Error>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    Running {
        shots_taken: u32,
    },
    Completed,
    Cancelled,
}

/// Session notifications for UI layers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Started { photo_count: u32 },
    PhotoCaptured { index: u32, total: u32 },
    Completed { photos: usize },
    Failed { reason: String },
    Cancelled,
    /// Photos discarded by a retake
    Cleared,
}

struct ManagerState {
    phase: SessionPhase,
    session: Option<CaptureSession>,
    /// Bumped on every start, retake and cancel
    generation: u64,
}

/// Runs capture sessions one at a time
pub struct CaptureSessionManager {
    countdown: Arc<CountdownScheduler>,
    engine: CosmeticFilterEngine,
    state: Mutex<ManagerState>,
    cancel_tx: watch::Sender<u64>,
    events: broadcast::Sender<SessionEvent>,
    sounds: Option<Arc<dyn SoundPlayer>>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl CaptureSessionManager {
    pub fn new(countdown: Arc<CountdownScheduler>, engine: CosmeticFilterEngine) -> Self {
        let (cancel_tx, _) = watch::channel(0);
        let (events, _) = broadcast::channel(32);
        Self {
            countdown,
            engine,
            state: Mutex::new(ManagerState {
                phase: SessionPhase::Idle,
                session: None,
                generation: 0,
            }),
            cancel_tx,
            events,
            sounds: None,
            notifier: None,
        }
    }

    pub fn with_sounds(mut self, sounds: Arc<dyn SoundPlayer>) -> Self {
        self.sounds = Some(sounds);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn countdown(&self) -> &Arc<CountdownScheduler> {
        &self.countdown
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.lock().phase
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Number of photos held by the current session
    pub fn photos_taken(&self) -> usize {
        self.state
            .lock()
            .session
            .as_ref()
            .map_or(0, |s| s.photos.len())
    }

    /// Copy of the current session, if any
    pub fn session(&self) -> Option<CaptureSession> {
        self.state.lock().session.clone()
    }

    /// Run a capture session to completion
    ///
    /// Rejected with [`SessionError::AlreadyRunning`] while another run is in
    /// progress; the running session is left untouched. Resolves with
    /// [`SessionError::Cancelled`] if [`retake`](Self::retake) or
    /// [`cancel`](Self::cancel) interrupts the run. Dropping the future
    /// before it resolves discards the photos and returns to `Idle`.
    pub async fn start(
        &self,
        session: CaptureSession,
        stream: &StreamHandle,
    ) -> Result<(), SessionError> {
        let mut cancel_rx = self.cancel_tx.subscribe();

        let (generation, session) = {
            let mut state = self.state.lock();
            if matches!(state.phase, SessionPhase::Running { .. }) {
                warn!("Capture session already running, ignoring start");
                return Err(SessionError::AlreadyRunning);
            }
            let mut session = session;
            session.photos.clear();
            state.generation += 1;
            state.phase = SessionPhase::Running { shots_taken: 0 };
            state.session = Some(session.clone());
            (state.generation, session)
        };
        let _guard = RunGuard {
            manager: self,
            generation,
        };

        let total = session.photo_count;
        info!(
            id = %session.id,
            photo_count = total,
            delay = session.capture_delay_seconds,
            style = %session.style,
            smoothing = session.smoothing_level,
            frame = session.frame.id(),
            "Capture session started"
        );
        let _ = self.events.send(SessionEvent::Started { photo_count: total });

        for shot_index in 1..=total {
            match self
                .countdown
                .run(session.capture_delay_seconds, shot_index, total)
                .await
            {
                Ok(_) => {}
                Err(CountdownError::Cancelled) => return Err(SessionError::Cancelled),
                Err(e) => return Err(self.fail(generation, e.to_string())),
            }
            self.ensure_current(generation)?;

            let raw = match FrameSnapshotter::snapshot(stream) {
                Ok(image) => image,
                Err(e) => return Err(self.fail(generation, e.to_string())),
            };

            let processed = match self
                .engine
                .process_async(raw, session.style, session.smoothing_level)
                .await
            {
                Ok(image) => image,
                Err(e) => return Err(self.fail(generation, e)),
            };

            {
                let mut state = self.state.lock();
                if state.generation != generation {
                    return Err(SessionError::Cancelled);
                }
                let Some(current) = state.session.as_mut() else {
                    return Err(SessionError::Cancelled);
                };
                current.photos.push(processed);
                state.phase = SessionPhase::Running {
                    shots_taken: shot_index,
                };
            }

            info!(shot = shot_index, total, "Photo captured");
            if let Some(sounds) = &self.sounds {
                sounds.play(SoundEffect::PhotoComplete);
            }
            let _ = self.events.send(SessionEvent::PhotoCaptured {
                index: shot_index,
                total,
            });

            if shot_index < total {
                tokio::select! {
                    _ = tokio::time::sleep(timing::INTER_SHOT_PAUSE) => {}
                    _ = cancel_rx.changed() => {}
                }
                self.ensure_current(generation)?;
            }
        }

        let photos = {
            let mut state = self.state.lock();
            if state.generation != generation {
                return Err(SessionError::Cancelled);
            }
            state.phase = SessionPhase::Completed;
            state.session.as_ref().map_or(0, |s| s.photos.len())
        };

        info!(photos, "Capture session completed");
        if let Some(sounds) = &self.sounds {
            sounds.play(SoundEffect::StepComplete);
        }
        if let Some(notifier) = &self.notifier {
            notifier.notify(&format!("Captured {} photo(s)", photos), Severity::Success);
        }
        let _ = self.events.send(SessionEvent::Completed { photos });
        Ok(())
    }

    /// Discard photos, stop any countdown and return to `Idle`
    pub fn retake(&self) {
        self.interrupt(SessionPhase::Idle, None);
        info!("Session cleared for retake");
        let _ = self.events.send(SessionEvent::Cleared);
    }

    /// Abort the run the way backing out of the booth does
    pub fn cancel(&self) {
        if !matches!(self.phase(), SessionPhase::Running { .. }) {
            return;
        }
        self.interrupt(SessionPhase::Cancelled, None);
        info!("Capture session cancelled");
        let _ = self.events.send(SessionEvent::Cancelled);
    }

    /// Transfer the completed session to the caller
    pub fn hand_off(&self) -> Result<SessionBundle, SessionError> {
        let session = {
            let mut state = self.state.lock();
            let ready = state.phase == SessionPhase::Completed
                && state
                    .session
                    .as_ref()
                    .is_some_and(|s| !s.photos.is_empty());
            if !ready {
                None
            } else {
                state.phase = SessionPhase::Idle;
                state.session.take()
            }
        };

        match session {
            Some(session) => {
                info!(id = %session.id, photos = session.photos.len(), "Session handed off");
                Ok(SessionBundle::from_session(session))
            }
            None => {
                warn!("Hand-off requested without a completed session");
                if let Some(notifier) = &self.notifier {
                    notifier.notify("Please capture photos first", Severity::Warning);
                }
                Err(SessionError::NotCompleted)
            }
        }
    }

    /// Hand off and pass the bundle to a compositor
    ///
    /// If the compositor fails the session is put back, so the hand-off can
    /// be retried.
    pub async fn hand_off_to<C: Compositor>(
        &self,
        compositor: &C,
    ) -> Result<C::Output, crate::errors::AppError>
    where
        C::Error: Into<crate::errors::AppError>,
    {
        let bundle = self.hand_off()?;
        let generation = self.state.lock().generation;
        let retained = bundle.clone();
        match compositor.compose(bundle).await {
            Ok(output) => Ok(output),
            Err(e) => {
                self.restore(retained, generation);
                Err(e.into())
            }
        }
    }

    /// Put a bundle back after a failed hand-off, unless a run or retake
    /// happened in between
    fn restore(&self, bundle: SessionBundle, generation: u64) {
        let mut state = self.state.lock();
        if state.generation != generation || state.session.is_some() {
            warn!(id = %bundle.id, "Session changed during hand-off, dropping bundle");
            return;
        }
        warn!(id = %bundle.id, "Compositor failed, session restored");
        state.phase = SessionPhase::Completed;
        state.session = Some(bundle.into_session());
    }

    /// Interrupt the run; with `run` set, only if that run is still going
    ///
    /// Returns false when nothing was interrupted.
    fn interrupt(&self, phase: SessionPhase, run: Option<u64>) -> bool {
        {
            let mut state = self.state.lock();
            if let Some(generation) = run {
                let running = matches!(state.phase, SessionPhase::Running { .. });
                if state.generation != generation || !running {
                    return false;
                }
            }
            state.generation += 1;
            state.phase = phase;
            if let Some(session) = state.session.as_mut() {
                session.photos.clear();
            }
        }
        self.countdown.cancel();
        self.cancel_tx.send_modify(|v| *v += 1);
        true
    }

    fn ensure_current(&self, generation: u64) -> Result<(), SessionError> {
        if self.state.lock().generation == generation {
            Ok(())
        } else {
            Err(SessionError::Cancelled)
        }
    }

    /// Abort the run: discard photos, back to `Idle`, report
    fn fail(&self, generation: u64, reason: String) -> SessionError {
        {
            let mut state = self.state.lock();
            if state.generation == generation {
                state.phase = SessionPhase::Idle;
                if let Some(session) = state.session.as_mut() {
                    session.photos.clear();
                }
            }
        }

        error!(reason = %reason, "Capture failed");
        if let Some(notifier) = &self.notifier {
            notifier.notify(&format!("Capture failed: {}", reason), Severity::Error);
        }
        let _ = self.events.send(SessionEvent::Failed {
            reason: reason.clone(),
        });
        SessionError::CaptureFailed(reason)
    }
}

/// Resets the manager when a `start` future is dropped mid-run
struct RunGuard<'a> {
    manager: &'a CaptureSessionManager,
    generation: u64,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if self
            .manager
            .interrupt(SessionPhase::Idle, Some(self.generation))
        {
            warn!("Capture session dropped before completion, photos discarded");
            let _ = self.manager.events.send(SessionEvent::Cleared);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_validation() {
        let ok = CaptureSession::new(3, 3, CosmeticStyle::None, 0, FrameSelection::None);
        assert!(ok.is_ok());

        for (count, delay, level) in [(0, 3, 0), (11, 3, 0), (1, 31, 0), (1, 3, 101)] {
            let result =
                CaptureSession::new(count, delay, CosmeticStyle::None, level, FrameSelection::None);
            assert!(
                matches!(result, Err(SessionError::InvalidSession(_))),
                "count={} delay={} level={} should be rejected",
                count,
                delay,
                level
            );
        }
    }

    #[test]
    fn test_hand_off_requires_completion() {
        let manager = CaptureSessionManager::new(
            Arc::new(CountdownScheduler::new()),
            CosmeticFilterEngine::new(),
        );
        assert_eq!(manager.hand_off().unwrap_err(), SessionError::NotCompleted);
    }
}
