// SPDX-License-Identifier: GPL-3.0-only

//! Fire-and-forget feedback collaborators
//!
//! Sounds, toasts and the countdown overlay are owned by whatever drives the
//! booth. The core only calls into these traits; nothing is returned and
//! failures stay inside the implementation.

use crate::pipelines::photo::countdown::CountdownTick;
use tracing::{debug, error, info, warn};

/// Named sound events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    CameraOn,
    CountdownStart,
    CountdownTick,
    CameraCapture,
    PhotoComplete,
    StepComplete,
    ButtonClick,
}

impl SoundEffect {
    pub const ALL: [SoundEffect; 7] = [
        SoundEffect::CameraOn,
        SoundEffect::CountdownStart,
        SoundEffect::CountdownTick,
        SoundEffect::CameraCapture,
        SoundEffect::PhotoComplete,
        SoundEffect::StepComplete,
        SoundEffect::ButtonClick,
    ];

    /// Event name as used by sound packs
    pub fn name(&self) -> &'static str {
        match self {
            SoundEffect::CameraOn => "camera_on",
            SoundEffect::CountdownStart => "countdown_start",
            SoundEffect::CountdownTick => "countdown_tick",
            SoundEffect::CameraCapture => "camera_capture",
            SoundEffect::PhotoComplete => "photo_complete",
            SoundEffect::StepComplete => "step_complete",
            SoundEffect::ButtonClick => "button_click",
        }
    }
}

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    pub fn name(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

pub trait SoundPlayer: Send + Sync {
    fn play(&self, effect: SoundEffect);
}

pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

/// Visual countdown overlay
pub trait CountdownSurface: Send + Sync {
    /// Show the current tick (remaining seconds and shot position)
    fn show(&self, tick: &CountdownTick);

    /// Remove the overlay after the capture fired or was cancelled
    fn hide(&self);
}

/// Feedback that only writes log lines
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingFeedback;

impl SoundPlayer for TracingFeedback {
    fn play(&self, effect: SoundEffect) {
        debug!(sound = effect.name(), "Sound");
    }
}

impl Notifier for TracingFeedback {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Info | Severity::Success => info!(severity = %severity, "{}", message),
            Severity::Warning => warn!("{}", message),
            Severity::Error => error!("{}", message),
        }
    }
}

impl CountdownSurface for TracingFeedback {
    fn show(&self, tick: &CountdownTick) {
        info!(
            remaining = tick.remaining,
            shot = tick.shot_index,
            total = tick.shot_total,
            "Countdown"
        );
    }

    fn hide(&self) {
        debug!("Countdown hidden");
    }
}
