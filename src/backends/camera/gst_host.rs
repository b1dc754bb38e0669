// SPDX-License-Identifier: MPL-2.0

//! GStreamer camera host
//!
//! Devices come from a `DeviceMonitor` filtered on `Video/Source`. Each stream
//! is a small pipeline that always ends in an RGBA appsink:
//!
//! ```text
//! source ! capsfilter ! decodebin ! videoconvert ! videoscale ! capsfilter(RGBA) ! appsink
//! ```
//!
//! The source capsfilter pins the device mode closest to the requested
//! resolution, so "ideal" constraints never fail on an inexact match.

use super::types::*;
use super::{CameraHost, LiveStream};
use crate::constants::{pipeline as pipeline_consts, timing};
use crate::errors::{AcquireError, DeviceQueryError};
use gstreamer::prelude::*;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Camera host backed by the GStreamer device monitor
#[derive(Debug, Default, Clone, Copy)]
pub struct GStreamerHost;

impl GStreamerHost {
    pub fn new() -> Self {
        Self
    }
}

impl CameraHost for GStreamerHost {
    async fn enumerate(&self) -> Result<Vec<DeviceDescriptor>, DeviceQueryError> {
        tokio::task::spawn_blocking(|| -> Result<Vec<DeviceDescriptor>, DeviceQueryError> {
            let devices = probe_devices()?;
            Ok(devices.iter().map(describe_device).collect())
        })
        .await
        .map_err(|e| DeviceQueryError::Backend(format!("Enumeration task failed: {}", e)))?
    }

    async fn acquire(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn LiveStream>, AcquireError> {
        let constraints = constraints.clone();
        let stream = tokio::task::spawn_blocking(move || GStreamerStream::open(&constraints))
            .await
            .map_err(|e| AcquireError::Other(format!("Acquire task failed: {}", e)))??;
        Ok(Box::new(stream))
    }

    fn name(&self) -> &'static str {
        "gstreamer"
    }
}

/// Run the device monitor once and collect video sources
fn probe_devices() -> Result<Vec<gstreamer::Device>, DeviceQueryError> {
    gstreamer::init().map_err(|e| DeviceQueryError::Backend(e.to_string()))?;

    let monitor = gstreamer::DeviceMonitor::new();
    let _filter = monitor.add_filter(Some(pipeline_consts::VIDEO_SOURCE_CLASS), None);
    monitor
        .start()
        .map_err(|e| DeviceQueryError::Backend(format!("Device monitor failed: {}", e)))?;

    let devices: Vec<gstreamer::Device> = monitor.devices().into_iter().collect();
    monitor.stop();

    debug!(count = devices.len(), "Probed video sources");
    Ok(devices)
}

fn describe_device(device: &gstreamer::Device) -> DeviceDescriptor {
    let label = device.display_name().to_string();
    let id = device_path(device).unwrap_or_else(|| label.clone());
    DeviceDescriptor::new(id, label)
}

/// Stable identifier from provider properties (V4L2 path or PipeWire node)
fn device_path(device: &gstreamer::Device) -> Option<String> {
    let props = device.properties()?;
    ["api.v4l2.path", "device.path", "object.path", "node.name"]
        .iter()
        .find_map(|key| props.get::<String>(*key).ok())
}

/// Requested device if present, otherwise the first one.
///
/// Desktop providers do not report which way a camera faces, so a facing
/// mode alone selects the default device.
fn select_device<'a>(
    devices: &'a [gstreamer::Device],
    constraints: &StreamConstraints,
) -> Option<&'a gstreamer::Device> {
    if let Some(Ideal(wanted)) = &constraints.device {
        if let Some(found) = devices
            .iter()
            .find(|d| describe_device(d).id == *wanted)
        {
            return Some(found);
        }
        debug!(device = %wanted, "Requested device not present, using default");
    }
    devices.first()
}

/// Device mode closest to the target size as (media type, width, height)
fn closest_mode(caps: &gstreamer::CapsRef, target: (u32, u32)) -> Option<(String, i32, i32)> {
    let (tw, th) = (i64::from(target.0), i64::from(target.1));
    caps.iter()
        .filter_map(|s| {
            let w = s.get::<i32>("width").ok()?;
            let h = s.get::<i32>("height").ok()?;
            Some((s.name().to_string(), w, h))
        })
        .min_by_key(|(_, w, h)| (i64::from(*w) - tw).abs() + (i64::from(*h) - th).abs())
}

/// Map a pipeline error onto an acquisition failure class
fn classify_error(error: &gstreamer::glib::Error, debug: Option<&str>) -> AcquireError {
    let message = error.to_string();

    if let Some(kind) = error.kind::<gstreamer::ResourceError>() {
        return match kind {
            gstreamer::ResourceError::NotFound => AcquireError::NotFound(message),
            gstreamer::ResourceError::OpenRead
            | gstreamer::ResourceError::OpenWrite
            | gstreamer::ResourceError::OpenReadWrite => AcquireError::PermissionDenied(message),
            gstreamer::ResourceError::Settings => AcquireError::Overconstrained(message),
            _ => AcquireError::Other(message),
        };
    }

    let negotiation = matches!(
        error.kind::<gstreamer::CoreError>(),
        Some(gstreamer::CoreError::Negotiation)
    ) || matches!(
        error.kind::<gstreamer::StreamError>(),
        Some(gstreamer::StreamError::Format | gstreamer::StreamError::WrongType)
    ) || debug.is_some_and(|d| d.contains("not-negotiated"));

    if negotiation {
        AcquireError::Overconstrained(message)
    } else {
        AcquireError::Other(message)
    }
}

/// Pop the first error message off the pipeline bus, if any
fn pop_error(pipeline: &gstreamer::Pipeline) -> Option<AcquireError> {
    let bus = pipeline.bus()?;
    let msg = bus.timed_pop_filtered(
        gstreamer::ClockTime::from_mseconds(100),
        &[gstreamer::MessageType::Error],
    )?;

    match msg.view() {
        gstreamer::MessageView::Error(err) => {
            let debug_info = err.debug().map(|d| d.to_string());
            error!(
                error = %err.error(),
                debug = ?debug_info,
                source = ?err.src().map(|s| s.name()),
                "GStreamer error while starting camera"
            );
            Some(classify_error(&err.error(), debug_info.as_deref()))
        }
        _ => None,
    }
}

fn make(factory: &str) -> Result<gstreamer::Element, AcquireError> {
    gstreamer::ElementFactory::make(factory)
        .build()
        .map_err(|e| AcquireError::Other(format!("Missing GStreamer element {}: {}", factory, e)))
}

/// Live RGBA stream from a GStreamer pipeline
pub struct GStreamerStream {
    pipeline: gstreamer::Pipeline,
    appsink: AppSink,
    latest: Arc<Mutex<Option<CameraFrame>>>,
    label: String,
    live: bool,
}

impl GStreamerStream {
    fn open(constraints: &StreamConstraints) -> Result<Self, AcquireError> {
        gstreamer::init().map_err(|e| AcquireError::Other(e.to_string()))?;

        let devices = probe_devices().map_err(|e| match e {
            DeviceQueryError::PermissionDenied => AcquireError::PermissionDenied(e.to_string()),
            DeviceQueryError::Backend(msg) => AcquireError::Other(msg),
        })?;
        let device = select_device(&devices, constraints);

        let (source, label) = match device {
            Some(d) => {
                let element = d
                    .create_element(Some("source"))
                    .map_err(|e| AcquireError::Other(format!("Failed to create source: {}", e)))?;
                (element, d.display_name().to_string())
            }
            None if constraints.device.is_some() => {
                return Err(AcquireError::NotFound(
                    "No video capture device available".to_string(),
                ));
            }
            None => {
                // Nothing enumerated; let the platform pick a source
                let element = make("autovideosrc")
                    .map_err(|_| AcquireError::NotFound("No video source available".into()))?;
                (element, "Default camera".to_string())
            }
        };

        let mode = match (device.and_then(|d| d.caps()), constraints.target_size()) {
            (Some(caps), Some(target)) => closest_mode(&caps, target),
            _ => None,
        };

        info!(
            device = %label,
            requested = ?constraints.target_size(),
            mode = ?mode,
            "Opening GStreamer camera stream"
        );

        let src_filter = make("capsfilter")?;
        if let Some((media, w, h)) = &mode {
            let caps = gstreamer::Caps::builder(media.as_str())
                .field("width", *w)
                .field("height", *h)
                .build();
            src_filter.set_property("caps", caps);
        }

        let decode = make("decodebin")?;
        let convert = make("videoconvert")?;
        let scale = make("videoscale")?;
        let out_filter = make("capsfilter")?;

        let mut out_caps =
            gstreamer::Caps::builder("video/x-raw").field("format", pipeline_consts::OUTPUT_FORMAT);
        let out_size = mode
            .as_ref()
            .map(|(_, w, h)| (*w, *h))
            .or_else(|| constraints.target_size().map(|(w, h)| (w as i32, h as i32)));
        if let Some((w, h)) = out_size {
            out_caps = out_caps.field("width", w).field("height", h);
        }
        out_filter.set_property("caps", out_caps.build());

        let appsink = make("appsink")?
            .dynamic_cast::<AppSink>()
            .map_err(|_| AcquireError::Other("Failed to cast appsink".to_string()))?;
        appsink.set_property("sync", false);
        appsink.set_property("max-buffers", pipeline_consts::MAX_BUFFERS);
        appsink.set_property("drop", true);
        appsink.set_property("enable-last-sample", false);

        let pipeline = gstreamer::Pipeline::with_name("photobooth-camera");
        pipeline
            .add_many([
                &source,
                &src_filter,
                &decode,
                &convert,
                &scale,
                &out_filter,
                appsink.upcast_ref(),
            ])
            .map_err(|e| AcquireError::Other(format!("Failed to build pipeline: {}", e)))?;
        gstreamer::Element::link_many([&source, &src_filter, &decode])
            .and_then(|_| {
                gstreamer::Element::link_many([&convert, &scale, &out_filter, appsink.upcast_ref()])
            })
            .map_err(|e| AcquireError::Other(format!("Failed to link pipeline: {}", e)))?;

        // decodebin exposes its output pad once the stream type is known
        let convert_weak = convert.downgrade();
        decode.connect_pad_added(move |_, src_pad| {
            let Some(convert) = convert_weak.upgrade() else {
                return;
            };
            let Some(sink_pad) = convert.static_pad("sink") else {
                return;
            };
            if sink_pad.is_linked() {
                return;
            }
            if let Err(e) = src_pad.link(&sink_pad) {
                warn!(error = ?e, "Failed to link decoded pad");
            }
        });

        let latest: Arc<Mutex<Option<CameraFrame>>> = Arc::new(Mutex::new(None));
        let sink_latest = Arc::clone(&latest);
        let frame_counter = AtomicU64::new(0);

        appsink.set_callbacks(
            gstreamer_app::AppSinkCallbacks::builder()
                .new_sample(move |appsink| {
                    let frame_num = frame_counter.fetch_add(1, Ordering::Relaxed);

                    let sample = appsink
                        .pull_sample()
                        .map_err(|_| gstreamer::FlowError::Eos)?;
                    let buffer = sample.buffer().ok_or(gstreamer::FlowError::Error)?;
                    let caps = sample.caps().ok_or(gstreamer::FlowError::Error)?;
                    let video_info =
                        VideoInfo::from_caps(caps).map_err(|_| gstreamer::FlowError::Error)?;
                    let map = buffer
                        .map_readable()
                        .map_err(|_| gstreamer::FlowError::Error)?;

                    let frame = CameraFrame {
                        width: video_info.width(),
                        height: video_info.height(),
                        stride: video_info.stride()[0] as u32,
                        data: Arc::from(map.as_slice()),
                        captured_at: Instant::now(),
                    };

                    if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                        debug!(
                            frame = frame_num,
                            width = frame.width,
                            height = frame.height,
                            stride = frame.stride,
                            "Camera frame"
                        );
                    }

                    *sink_latest.lock() = Some(frame);
                    Ok(gstreamer::FlowSuccess::Ok)
                })
                .build(),
        );

        let shutdown = |pipeline: &gstreamer::Pipeline| {
            let _ = pipeline.set_state(gstreamer::State::Null);
        };

        if let Err(e) = pipeline.set_state(gstreamer::State::Playing) {
            let err = pop_error(&pipeline)
                .unwrap_or_else(|| AcquireError::Other(format!("Failed to start pipeline: {}", e)));
            shutdown(&pipeline);
            return Err(err);
        }

        let (result, state, pending) = pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::START_TIMEOUT_SECS,
        ));
        debug!(result = ?result, state = ?state, pending = ?pending, "Pipeline state");

        if let Some(err) = pop_error(&pipeline) {
            shutdown(&pipeline);
            return Err(err);
        }
        if result.is_err() || state != gstreamer::State::Playing {
            shutdown(&pipeline);
            return Err(AcquireError::Other(
                "Camera pipeline did not reach PLAYING".to_string(),
            ));
        }

        info!(device = %label, "Camera stream playing");

        Ok(Self {
            pipeline,
            appsink,
            latest,
            label,
            live: true,
        })
    }

    /// Device label the stream was opened on
    pub fn label(&self) -> &str {
        &self.label
    }

    fn negotiated_size(&self) -> Option<(u32, u32)> {
        let caps = self.appsink.static_pad("sink")?.current_caps()?;
        let info = VideoInfo::from_caps(&caps).ok()?;
        Some((info.width(), info.height()))
    }
}

impl LiveStream for GStreamerStream {
    fn current_frame(&self) -> Option<CameraFrame> {
        if !self.live {
            return None;
        }
        self.latest.lock().clone()
    }

    fn resolution(&self) -> (u32, u32) {
        if let Some(frame) = self.latest.lock().as_ref() {
            return (frame.width, frame.height);
        }
        self.negotiated_size().unwrap_or((0, 0))
    }

    fn stop(&mut self) {
        if !self.live {
            return;
        }
        info!(device = %self.label, "Stopping camera stream");

        // Release the callback's frame slot before tearing down
        self.appsink
            .set_callbacks(gstreamer_app::AppSinkCallbacks::builder().build());

        if let Err(e) = self.pipeline.set_state(gstreamer::State::Null) {
            warn!(error = ?e, "Failed to stop camera pipeline");
        }
        let (result, state, _) = self.pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::STOP_TIMEOUT_SECS,
        ));
        debug!(result = ?result, state = ?state, "Camera pipeline stopped");

        *self.latest.lock() = None;
        self.live = false;
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

impl Drop for GStreamerStream {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_resource_errors() {
        let _ = gstreamer::init();

        let err = gstreamer::glib::Error::new(gstreamer::ResourceError::NotFound, "gone");
        assert!(matches!(classify_error(&err, None), AcquireError::NotFound(_)));

        let err = gstreamer::glib::Error::new(gstreamer::ResourceError::OpenRead, "denied");
        assert!(matches!(
            classify_error(&err, None),
            AcquireError::PermissionDenied(_)
        ));
    }

    #[test]
    fn test_classify_negotiation_errors() {
        let _ = gstreamer::init();

        let err = gstreamer::glib::Error::new(gstreamer::CoreError::Negotiation, "caps");
        assert!(classify_error(&err, None).is_overconstrained());

        let err = gstreamer::glib::Error::new(gstreamer::StreamError::Failed, "flow");
        assert!(classify_error(&err, Some("reason not-negotiated (-4)")).is_overconstrained());
        assert!(matches!(
            classify_error(&err, Some("reason error (-5)")),
            AcquireError::Other(_)
        ));
    }

    #[test]
    fn test_closest_mode() {
        gstreamer::init().unwrap();
        let caps: gstreamer::Caps =
            "video/x-raw, width=(int)640, height=(int)480; image/jpeg, width=(int)1280, height=(int)720; video/x-raw, width=(int)1920, height=(int)1080"
                .parse()
                .unwrap();

        let mode = closest_mode(&caps, (1280, 720)).unwrap();
        assert_eq!(mode, ("image/jpeg".to_string(), 1280, 720));

        let mode = closest_mode(&caps, (1600, 900)).unwrap();
        assert_eq!((mode.1, mode.2), (1920, 1080));
    }
}
