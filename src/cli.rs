// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for the photobooth
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Running a capture session and exporting it
//! - Filtering a single image
//! - Listing styles

use clap::Args;
use photobooth::backends::camera::{
    CameraHost, DeviceEnumerator, GStreamerHost, StillImageHost, StreamController, StreamHandle,
};
use photobooth::config::Config;
use photobooth::constants::ResolutionPreset;
use photobooth::errors::SessionError;
use photobooth::feedback::{CountdownSurface, Notifier, Severity, TracingFeedback};
use photobooth::frames;
use photobooth::pipelines::photo::{
    CaptureSessionManager, CosmeticFilterEngine, CosmeticStyle, CountdownScheduler, CountdownTick,
    PhotoEncoder, RasterImage,
};
use photobooth::preview::preview_filter;
use photobooth::storage::{self, DiskExporter};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// How long to wait for the first camera frame
const WARMUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Window after a retake in which a second Ctrl-C quits
const QUIT_WINDOW: Duration = Duration::from_secs(2);

/// Session options; unset flags fall back to the config file
#[derive(Args, Debug)]
pub struct ShootArgs {
    /// Camera index to use (from 'photobooth list')
    #[arg(short, long)]
    camera: Option<usize>,

    /// Stream resolution (720p or 1080p)
    #[arg(short, long)]
    resolution: Option<String>,

    /// Number of photos (1-10)
    #[arg(short = 'n', long)]
    count: Option<u32>,

    /// Countdown before each photo, in seconds (0-30)
    #[arg(short, long)]
    delay: Option<u32>,

    /// Cosmetic style
    #[arg(short, long)]
    style: Option<String>,

    /// Skin smoothing level (0-100)
    #[arg(long)]
    smoothing: Option<u8>,

    /// Frame id (see 'photobooth styles')
    #[arg(short, long)]
    frame: Option<String>,

    /// Frame image for --frame custom
    #[arg(long)]
    frame_path: Option<PathBuf>,

    /// Export directory (default: ~/Pictures/photobooth)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JPEG quality (1-100)
    #[arg(short, long)]
    quality: Option<u8>,

    /// Use an image file instead of a camera ("test" for a test pattern)
    #[arg(long)]
    source: Option<PathBuf>,
}

impl ShootArgs {
    fn apply(&self, config: &mut Config) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(camera) = self.camera {
            config.camera_index = camera;
        }
        if let Some(label) = &self.resolution {
            config.resolution = ResolutionPreset::from_label(label)
                .ok_or_else(|| format!("Unknown resolution: {}", label))?;
        }
        if let Some(count) = self.count {
            config.photo_count = count;
        }
        if let Some(delay) = self.delay {
            config.capture_delay_seconds = delay;
        }
        if let Some(style) = &self.style {
            config.style = style.parse()?;
        }
        if let Some(smoothing) = self.smoothing {
            config.smoothing_level = smoothing;
        }
        if let Some(frame) = &self.frame {
            config.frame = frame.clone();
        }
        if let Some(path) = &self.frame_path {
            config.custom_frame_path = Some(path.clone());
        }
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
        if let Some(quality) = self.quality {
            config.jpeg_quality = quality;
        }
        Ok(())
    }
}

/// Prints countdown ticks on one terminal line
struct TerminalCountdown;

impl CountdownSurface for TerminalCountdown {
    fn show(&self, tick: &CountdownTick) {
        let mut stdout = std::io::stdout();
        if tick.remaining == 0 {
            let _ = write!(
                stdout,
                "\r  Photo {}/{}: Smile!   ",
                tick.shot_index, tick.shot_total
            );
        } else {
            let _ = write!(
                stdout,
                "\r  Photo {}/{}: {}...    ",
                tick.shot_index, tick.shot_total, tick.remaining
            );
        }
        let _ = stdout.flush();
    }

    fn hide(&self) {
        println!();
    }
}

/// Prints notifications to the terminal
struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Error | Severity::Warning => eprintln!("{}: {}", severity, message),
            Severity::Info | Severity::Success => println!("{}", message),
        }
    }
}

/// List all available cameras
pub fn list_cameras() -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    let cameras = rt.block_on(DeviceEnumerator::list_devices(&GStreamerHost::new()))?;

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!("  [{}] {}", index, camera.display_label(index));
        println!("      Id: {}", camera.id);
    }

    Ok(())
}

/// List styles, their preview filters and overlays, and the bundled frames
pub fn list_styles() -> Result<(), Box<dyn std::error::Error>> {
    println!("Styles:");
    for style in CosmeticStyle::ALL {
        let filter = preview_filter(style, 0);
        println!(
            "  {:<8} {}",
            style.name(),
            if filter.is_empty() { "-" } else { filter.as_str() }
        );
        if let Some(overlay) = frames::style_overlay(style) {
            println!("  {:<8} overlay: {}", "", overlay);
        }
    }

    println!();
    println!("Frames:");
    println!("  {:<20} No frame", "none");
    for asset in frames::FRAME_CATALOG {
        println!("  {:<20} {} ({:?})", asset.id, asset.name, asset.category);
    }
    println!("  {:<20} Your own image (--frame-path)", "custom");

    Ok(())
}

/// Apply a style and smoothing to an image file
pub fn filter_image(
    input: &Path,
    output: &Path,
    style: &str,
    smoothing: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    let style: CosmeticStyle = style.parse()?;
    let format = storage::format_for_path(output)
        .ok_or_else(|| format!("Unsupported output format: {}", output.display()))?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let source: RasterImage = image::open(input)?.to_rgba8().into();
        let filtered = CosmeticFilterEngine::new()
            .process_async(source, style, smoothing.min(100))
            .await?;

        let encoder = PhotoEncoder::new().with_format(format);
        let encoded = encoder.encode(filtered).await?;
        let path = encoder.save(encoded, output).await?;
        println!("Saved: {}", path.display());
        Ok::<_, Box<dyn std::error::Error>>(())
    })
}

/// Run a capture session and export it
pub fn shoot(config_path: Option<&Path>, args: ShootArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load_or_default(config_path)?;
    args.apply(&mut config)?;

    let rt = tokio::runtime::Runtime::new()?;
    match args.source.as_deref() {
        Some(path) if path == Path::new("test") => {
            rt.block_on(run_session(StillImageHost::test_pattern(), config))
        }
        Some(path) => rt.block_on(run_session(StillImageHost::from_path(path)?, config)),
        None => rt.block_on(run_session(GStreamerHost::new(), config)),
    }
}

async fn run_session<H: CameraHost>(
    host: H,
    config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = config.session()?;

    let mut controller = StreamController::new(host).with_notifier(Arc::new(TerminalNotifier));
    controller.refresh_devices().await;
    let stream = controller
        .start(config.camera_index, config.resolution)
        .await?;

    let (width, height) = stream.resolution();
    match stream.device() {
        Some(device) => println!("Using camera: {} ({}x{})", device.label, width, height),
        None => println!("Using default camera ({}x{})", width, height),
    }
    if stream.used_fallback() {
        println!("Requested resolution unsupported, using camera defaults");
    }

    wait_for_first_frame(&stream).await?;

    let feedback = Arc::new(TracingFeedback);
    let countdown = CountdownScheduler::new()
        .with_surface(Arc::new(TerminalCountdown))
        .with_sounds(feedback.clone());
    let manager = CaptureSessionManager::new(Arc::new(countdown), CosmeticFilterEngine::new())
        .with_sounds(feedback)
        .with_notifier(Arc::new(TerminalNotifier));

    println!(
        "Taking {} photo(s), style {}, press Ctrl-C to retake",
        session.photo_count(),
        session.style()
    );

    loop {
        let run = manager.start(session.clone(), &stream);
        tokio::pin!(run);

        let result = tokio::select! {
            result = &mut run => result,
            _ = tokio::signal::ctrl_c() => {
                manager.retake();
                run.await
            }
        };

        match result {
            Ok(()) => break,
            Err(SessionError::Cancelled) => {
                println!();
                println!("Retaking... press Ctrl-C again to quit");
                tokio::select! {
                    _ = tokio::time::sleep(QUIT_WINDOW) => {}
                    _ = tokio::signal::ctrl_c() => {
                        controller.stop();
                        println!("Cancelled.");
                        return Ok(());
                    }
                }
            }
            Err(e) => {
                controller.stop();
                return Err(e.into());
            }
        }
    }

    // Photos are taken; the camera is no longer needed
    controller.stop();

    let encoder = PhotoEncoder::new().with_jpeg_quality(config.jpeg_quality);
    let exporter = DiskExporter::new(&config.output_dir).with_encoder(encoder);
    let exported = manager.hand_off_to(&exporter).await?;

    println!("Session saved: {}", exported.directory.display());
    for photo in &exported.photos {
        println!("  {}", photo.display());
    }

    Ok(())
}

/// Wait until the stream delivers a non-empty frame
async fn wait_for_first_frame(stream: &StreamHandle) -> Result<(), Box<dyn std::error::Error>> {
    let deadline = Instant::now() + WARMUP_TIMEOUT;
    loop {
        if stream.current_frame().is_some_and(|f| !f.is_empty()) {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err("Camera produced no frames".into());
        }
        tokio::time::sleep(Duration::from_millis(16)).await;
    }
}
