// SPDX-License-Identifier: MPL-2.0

//! Integration tests for device enumeration and stream ownership

mod common;

use common::{FakeHost, RecordingNotifier};
use photobooth::backends::camera::{
    DeviceDescriptor, DeviceEnumerator, StreamController, StreamStatus,
};
use photobooth::constants::ResolutionPreset;
use photobooth::errors::{AcquireError, CameraFailureReason, DeviceQueryError};
use photobooth::feedback::Severity;
use photobooth::pipelines::photo::FrameSnapshotter;
use std::sync::Arc;

#[tokio::test]
async fn test_enumeration_lists_devices_in_host_order() {
    let host = FakeHost::new();
    let devices = DeviceEnumerator::list_devices(&host).await.unwrap();
    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].id.as_str(), "cam-front");
    assert_eq!(devices[0].display_label(0), "Front Camera");
    assert_eq!(
        devices[1].display_label(1),
        "Camera 2",
        "Unlabeled devices should get a numbered label"
    );
}

#[tokio::test]
async fn test_denied_enumeration() {
    let host = FakeHost::new().denying_enumeration();
    assert_eq!(
        DeviceEnumerator::list_devices(&host).await,
        Err(DeviceQueryError::PermissionDenied)
    );
    assert!(DeviceEnumerator::list_devices_or_empty(&host).await.is_empty());
}

#[tokio::test]
async fn test_denied_enumeration_starts_default_device() {
    let mut controller = StreamController::new(FakeHost::new().denying_enumeration());
    assert!(controller.refresh_devices().await.is_empty());

    let handle = controller.start(0, ResolutionPreset::Hd720).await.unwrap();
    assert!(handle.device().is_none());

    let attempts = controller.host().attempts();
    assert_eq!(attempts.len(), 1);
    assert!(attempts[0].device.is_none(), "No device id should be requested");
    assert_eq!(attempts[0].target_size(), Some((1280, 720)));
}

#[tokio::test]
async fn test_denied_enumeration_notifies_user() {
    let notifier = Arc::new(RecordingNotifier::default());
    let mut controller = StreamController::new(FakeHost::new().denying_enumeration())
        .with_notifier(notifier.clone());
    controller.refresh_devices().await;

    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].1, Severity::Warning);
    assert!(messages[0].0.contains("default camera"));

    let mut healthy = StreamController::new(FakeHost::new()).with_notifier(notifier.clone());
    healthy.refresh_devices().await;
    assert_eq!(notifier.messages().len(), 1, "Successful enumeration stays quiet");
}

#[tokio::test]
async fn test_acquire_failure_notifies_user() {
    let notifier = Arc::new(RecordingNotifier::default());
    let mut controller = StreamController::new(
        FakeHost::new().failing_with(AcquireError::PermissionDenied("denied".into())),
    )
    .with_notifier(notifier.clone());
    controller.refresh_devices().await;

    let err = controller.start(0, ResolutionPreset::Hd720).await.unwrap_err();
    assert_eq!(
        notifier.messages(),
        vec![(err.reason.user_message().to_string(), Severity::Error)]
    );
}

#[tokio::test]
async fn test_start_requests_preset_on_selected_device() {
    let mut controller = StreamController::new(FakeHost::new());
    controller.refresh_devices().await;

    let handle = controller
        .start(1, ResolutionPreset::FullHd1080)
        .await
        .unwrap();
    assert!(!handle.used_fallback());
    assert_eq!(handle.resolution(), (1920, 1080));
    assert_eq!(controller.active_index(), Some(1));

    let attempts = controller.host().attempts();
    assert_eq!(attempts.len(), 1);
    assert_eq!(
        attempts[0].device.as_ref().map(|d| d.0.as_str()),
        Some("cam-usb")
    );

    match controller.status() {
        StreamStatus::Ready {
            device,
            width,
            height,
            fallback,
        } => {
            assert_eq!(device.map(|d| d.id.0), Some("cam-usb".to_string()));
            assert_eq!((width, height), (1920, 1080));
            assert!(!fallback);
        }
        StreamStatus::Stopped => panic!("Stream should be ready"),
    }
}

#[tokio::test]
async fn test_overconstrained_retries_with_minimal_constraints() {
    let mut controller = StreamController::new(FakeHost::new().rejecting_ideal_constraints());
    controller.refresh_devices().await;
    let mut status = controller.subscribe();

    let handle = controller
        .start(0, ResolutionPreset::FullHd1080)
        .await
        .expect("Fallback should succeed");
    assert!(handle.used_fallback());

    let attempts = controller.host().attempts();
    assert_eq!(attempts.len(), 2, "Exactly one retry");
    assert!(!attempts[0].is_minimal());
    assert!(attempts[1].is_minimal());

    assert!(status.has_changed().unwrap());
    assert!(matches!(
        *status.borrow_and_update(),
        StreamStatus::Ready { fallback: true, .. }
    ));
}

#[tokio::test]
async fn test_overconstrained_twice_reports_constraint_error() {
    let host = FakeHost::new().failing_with(AcquireError::Overconstrained("height".into()));
    let mut controller = StreamController::new(host);
    controller.refresh_devices().await;

    let err = controller.start(0, ResolutionPreset::Hd720).await.unwrap_err();
    assert_eq!(err.reason, CameraFailureReason::ConstraintError);
    assert_eq!(controller.host().attempts().len(), 2);
    assert_eq!(controller.status(), StreamStatus::Stopped);
    assert!(controller.active().is_none());
}

#[tokio::test]
async fn test_other_failures_are_not_retried() {
    let cases = [
        (
            AcquireError::PermissionDenied("denied".into()),
            CameraFailureReason::PermissionDenied,
        ),
        (
            AcquireError::NotFound("gone".into()),
            CameraFailureReason::NoDevice,
        ),
        (
            AcquireError::Other("busy".into()),
            CameraFailureReason::Unknown,
        ),
    ];

    for (error, reason) in cases {
        let mut controller = StreamController::new(FakeHost::new().failing_with(error));
        controller.refresh_devices().await;

        let err = controller.start(0, ResolutionPreset::Hd720).await.unwrap_err();
        assert_eq!(err.reason, reason);
        assert_eq!(
            controller.host().attempts().len(),
            1,
            "{} should not be retried",
            reason
        );
    }
}

#[tokio::test]
async fn test_switching_keeps_a_single_live_stream() {
    let mut controller = StreamController::new(FakeHost::new());
    controller.refresh_devices().await;

    let first = controller.start(0, ResolutionPreset::Hd720).await.unwrap();
    assert!(first.current_frame().is_some());

    let second = controller.switch_to_next().await.unwrap();
    assert_eq!(controller.active_index(), Some(1));
    assert_eq!(controller.host().live_streams(), 1);
    assert!(!first.is_live(), "Old stream should be stopped");
    assert!(first.current_frame().is_none());
    assert!(second.is_live());

    controller.switch_to_next().await.unwrap();
    assert_eq!(controller.active_index(), Some(0), "Switching wraps around");
    assert_eq!(controller.host().live_streams(), 1);
}

#[tokio::test]
async fn test_change_resolution_restarts_current_device() {
    let mut controller = StreamController::new(FakeHost::new());
    controller.refresh_devices().await;
    controller.start(1, ResolutionPreset::Hd720).await.unwrap();

    let handle = controller
        .change_resolution(ResolutionPreset::FullHd1080)
        .await
        .unwrap();
    assert_eq!(handle.resolution(), (1920, 1080));
    assert_eq!(controller.active_index(), Some(1));
    assert_eq!(controller.preset(), ResolutionPreset::FullHd1080);
    assert_eq!(controller.host().live_streams(), 1);
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let mut controller = StreamController::new(FakeHost::new());
    controller.refresh_devices().await;
    let handle = controller.start(0, ResolutionPreset::Hd720).await.unwrap();

    controller.stop();
    controller.stop();
    assert_eq!(controller.host().live_streams(), 0);
    assert_eq!(controller.status(), StreamStatus::Stopped);
    assert!(controller.active().is_none());

    assert!(
        FrameSnapshotter::snapshot(&handle).is_err(),
        "Snapshot of a stopped stream should fail"
    );
}

#[tokio::test]
async fn test_snapshot_copies_current_frame() {
    let host = FakeHost::new().with_devices(vec![DeviceDescriptor::new("only", "Only")]);
    let feed = host.feed();
    let mut controller = StreamController::new(host);
    controller.refresh_devices().await;
    let handle = controller.start(0, ResolutionPreset::Hd720).await.unwrap();

    feed.set_color(4, 2, [10, 20, 30, 255]);
    let image = FrameSnapshotter::snapshot(&handle).unwrap();
    assert_eq!((image.width(), image.height()), (4, 2));
    assert_eq!(image.pixel(3, 1), Some([10, 20, 30, 255]));

    feed.clear();
    let err = FrameSnapshotter::snapshot(&handle).unwrap_err();
    assert_eq!(err.width, 1280, "Error reports the stream resolution");
}
