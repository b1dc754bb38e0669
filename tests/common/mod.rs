// SPDX-License-Identifier: MPL-2.0

//! Shared fakes for integration tests

#![allow(dead_code)]

use parking_lot::Mutex;
use photobooth::backends::camera::{
    CameraFrame, CameraHost, DeviceDescriptor, LiveStream, StreamConstraints,
};
use photobooth::errors::{AcquireError, DeviceQueryError};
use photobooth::feedback::{CountdownSurface, Notifier, Severity, SoundEffect, SoundPlayer};
use photobooth::pipelines::photo::CountdownTick;
use std::sync::Arc;

/// Frame source shared between a test and the streams of a [`FakeHost`]
#[derive(Clone, Default)]
pub struct FrameFeed(Arc<Mutex<Option<CameraFrame>>>);

impl FrameFeed {
    pub fn set(&self, frame: CameraFrame) {
        *self.0.lock() = Some(frame);
    }

    pub fn set_color(&self, width: u32, height: u32, rgba: [u8; 4]) {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take((width * height * 4) as usize)
            .collect();
        self.set(CameraFrame::from_rgba(width, height, data));
    }

    pub fn clear(&self) {
        *self.0.lock() = None;
    }

    fn get(&self) -> Option<CameraFrame> {
        self.0.lock().clone()
    }
}

/// Scriptable camera host
pub struct FakeHost {
    devices: Vec<DeviceDescriptor>,
    deny_enumeration: bool,
    /// Fail every request that is not the minimal fallback
    reject_ideal: bool,
    /// Fail every request with this error
    failure: Option<AcquireError>,
    attempts: Arc<Mutex<Vec<StreamConstraints>>>,
    live_streams: Arc<Mutex<usize>>,
    feed: FrameFeed,
}

impl FakeHost {
    /// Two cameras, accepting every request, streaming a gray 64x48 frame
    pub fn new() -> Self {
        let feed = FrameFeed::default();
        feed.set_color(64, 48, [128, 128, 128, 255]);
        Self {
            devices: vec![
                DeviceDescriptor::new("cam-front", "Front Camera"),
                DeviceDescriptor::new("cam-usb", ""),
            ],
            deny_enumeration: false,
            reject_ideal: false,
            failure: None,
            attempts: Arc::new(Mutex::new(Vec::new())),
            live_streams: Arc::new(Mutex::new(0)),
            feed,
        }
    }

    pub fn with_devices(mut self, devices: Vec<DeviceDescriptor>) -> Self {
        self.devices = devices;
        self
    }

    pub fn denying_enumeration(mut self) -> Self {
        self.deny_enumeration = true;
        self
    }

    pub fn rejecting_ideal_constraints(mut self) -> Self {
        self.reject_ideal = true;
        self
    }

    pub fn failing_with(mut self, error: AcquireError) -> Self {
        self.failure = Some(error);
        self
    }

    pub fn feed(&self) -> FrameFeed {
        self.feed.clone()
    }

    /// Constraints of every acquire call, in order
    pub fn attempts(&self) -> Vec<StreamConstraints> {
        self.attempts.lock().clone()
    }

    /// Streams acquired and not yet stopped
    pub fn live_streams(&self) -> usize {
        *self.live_streams.lock()
    }
}

impl CameraHost for FakeHost {
    async fn enumerate(&self) -> Result<Vec<DeviceDescriptor>, DeviceQueryError> {
        if self.deny_enumeration {
            return Err(DeviceQueryError::PermissionDenied);
        }
        Ok(self.devices.clone())
    }

    async fn acquire(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn LiveStream>, AcquireError> {
        self.attempts.lock().push(constraints.clone());

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        if self.reject_ideal && !constraints.is_minimal() {
            return Err(AcquireError::Overconstrained("width".to_string()));
        }

        let resolution = constraints.target_size().unwrap_or((640, 480));
        *self.live_streams.lock() += 1;
        Ok(Box::new(FakeStream {
            feed: self.feed.clone(),
            resolution,
            live: true,
            live_streams: Arc::clone(&self.live_streams),
        }))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

struct FakeStream {
    feed: FrameFeed,
    resolution: (u32, u32),
    live: bool,
    live_streams: Arc<Mutex<usize>>,
}

impl LiveStream for FakeStream {
    fn current_frame(&self) -> Option<CameraFrame> {
        if self.live { self.feed.get() } else { None }
    }

    fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    fn stop(&mut self) {
        if self.live {
            self.live = false;
            *self.live_streams.lock() -= 1;
        }
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

/// Countdown surface that records what it was asked to show
#[derive(Default)]
pub struct RecordingSurface {
    shown: Mutex<Vec<CountdownTick>>,
    hides: Mutex<usize>,
}

impl RecordingSurface {
    pub fn shown(&self) -> Vec<CountdownTick> {
        self.shown.lock().clone()
    }

    pub fn remaining_values(&self) -> Vec<u32> {
        self.shown.lock().iter().map(|t| t.remaining).collect()
    }

    pub fn hides(&self) -> usize {
        *self.hides.lock()
    }
}

impl CountdownSurface for RecordingSurface {
    fn show(&self, tick: &CountdownTick) {
        self.shown.lock().push(*tick);
    }

    fn hide(&self) {
        *self.hides.lock() += 1;
    }
}

/// Sound player that records every effect
#[derive(Default)]
pub struct RecordingSounds {
    played: Mutex<Vec<SoundEffect>>,
}

impl RecordingSounds {
    pub fn played(&self) -> Vec<SoundEffect> {
        self.played.lock().clone()
    }

    pub fn count(&self, effect: SoundEffect) -> usize {
        self.played.lock().iter().filter(|e| **e == effect).count()
    }
}

impl SoundPlayer for RecordingSounds {
    fn play(&self, effect: SoundEffect) {
        self.played.lock().push(effect);
    }
}

/// Notifier that records every message with its severity
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(String, Severity)>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<(String, Severity)> {
        self.messages.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        self.messages.lock().push((message.to_string(), severity));
    }
}
