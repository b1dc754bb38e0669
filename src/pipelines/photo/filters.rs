// SPDX-License-Identifier: MPL-2.0

//! Cosmetic pixel filters applied at capture time
//!
//! Styles are fixed per-pixel transforms on the RGB channels; alpha is never
//! touched. Skin smoothing blends the image with a Gaussian-blurred copy of
//! itself. Results are rounded to nearest and clamped to `[0, 255]`.

use super::raster::RasterImage;
use crate::constants::{session, smoothing};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Named cosmetic styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CosmeticStyle {
    /// No transform
    #[default]
    None,
    /// Classic sepia
    Vintage,
    /// Warm channel gains
    Retro,
    /// Grayscale
    Minimal,
    /// Uniform brightening
    Bright,
    /// Soft glow; preview only, identity at capture
    Dreamy,
    /// Pink-leaning gains
    Kawaii,
    /// Partial desaturation toward the pixel average
    Pastel,
    /// Cross-channel film mix
    Film,
}

impl CosmeticStyle {
    /// All styles in menu order
    pub const ALL: [CosmeticStyle; 9] = [
        CosmeticStyle::None,
        CosmeticStyle::Vintage,
        CosmeticStyle::Retro,
        CosmeticStyle::Minimal,
        CosmeticStyle::Bright,
        CosmeticStyle::Dreamy,
        CosmeticStyle::Kawaii,
        CosmeticStyle::Pastel,
        CosmeticStyle::Film,
    ];

    /// Lowercase identifier used in config files and on the command line
    pub fn name(&self) -> &'static str {
        match self {
            CosmeticStyle::None => "none",
            CosmeticStyle::Vintage => "vintage",
            CosmeticStyle::Retro => "retro",
            CosmeticStyle::Minimal => "minimal",
            CosmeticStyle::Bright => "bright",
            CosmeticStyle::Dreamy => "dreamy",
            CosmeticStyle::Kawaii => "kawaii",
            CosmeticStyle::Pastel => "pastel",
            CosmeticStyle::Film => "film",
        }
    }

    /// Whether capture-time processing changes pixels for this style
    pub fn has_pixel_transform(&self) -> bool {
        !matches!(self, CosmeticStyle::None | CosmeticStyle::Dreamy)
    }

    /// Transform one pixel's RGB (as floats, before rounding)
    fn transform(&self, r: f32, g: f32, b: f32) -> (f32, f32, f32) {
        match self {
            CosmeticStyle::None | CosmeticStyle::Dreamy => (r, g, b),
            CosmeticStyle::Vintage => (
                0.393 * r + 0.769 * g + 0.189 * b,
                0.349 * r + 0.686 * g + 0.168 * b,
                0.272 * r + 0.534 * g + 0.131 * b,
            ),
            CosmeticStyle::Retro => (r * 1.1, g * 1.05, b * 0.9),
            CosmeticStyle::Minimal => {
                let gray = 0.299 * r + 0.587 * g + 0.114 * b;
                (gray, gray, gray)
            }
            CosmeticStyle::Bright => (r * 1.2, g * 1.2, b * 1.2),
            CosmeticStyle::Kawaii => (r * 1.15, g * 1.05, b * 1.1),
            CosmeticStyle::Pastel => {
                let avg = (r + g + b) / 3.0;
                (
                    r * 0.7 + avg * 0.3,
                    g * 0.7 + avg * 0.3,
                    b * 0.7 + avg * 0.3,
                )
            }
            CosmeticStyle::Film => (
                0.9 * r + 0.1 * g,
                0.05 * r + 0.85 * g + 0.1 * b,
                0.8 * b + 0.1 * g,
            ),
        }
    }
}

impl std::fmt::Display for CosmeticStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for CosmeticStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        CosmeticStyle::ALL
            .iter()
            .copied()
            .find(|style| style.name() == wanted)
            .ok_or_else(|| format!("Unknown style: {}", s))
    }
}

#[inline]
fn to_channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Applies styles and skin smoothing to raster images
///
/// Stateless; cloning is free.
#[derive(Debug, Default, Clone, Copy)]
pub struct CosmeticFilterEngine;

impl CosmeticFilterEngine {
    pub fn new() -> Self {
        Self
    }

    /// Apply a style transform to every pixel
    pub fn apply_style(&self, mut image: RasterImage, style: CosmeticStyle) -> RasterImage {
        if !style.has_pixel_transform() {
            return image;
        }

        let pixels: &mut [[u8; 4]] = bytemuck::cast_slice_mut(image.data_mut());
        for px in pixels.iter_mut() {
            let (r, g, b) = style.transform(px[0] as f32, px[1] as f32, px[2] as f32);
            px[0] = to_channel(r);
            px[1] = to_channel(g);
            px[2] = to_channel(b);
        }

        debug!(style = %style, "Style applied");
        image
    }

    /// Blend the image with a blurred copy of itself
    ///
    /// Level 0 returns the input untouched without blurring. Levels above
    /// 100 are treated as 100.
    pub fn apply_skin_smoothing(&self, image: RasterImage, level: u8) -> RasterImage {
        let level = level.min(session::MAX_SMOOTHING_LEVEL);
        if level == 0 || image.width() == 0 || image.height() == 0 {
            return image;
        }

        let t = f32::from(level) / f32::from(session::MAX_SMOOTHING_LEVEL);
        let sigma = (smoothing::MAX_BLUR_SIGMA * t).max(smoothing::MIN_BLUR_SIGMA);
        let blend = smoothing::MAX_BLEND * t;

        let source: image::RgbaImage = image.into();
        let blurred = image::imageops::blur(&source, sigma);
        let mut output: RasterImage = source.into();

        let pixels: &mut [[u8; 4]] = bytemuck::cast_slice_mut(output.data_mut());
        let blurred_pixels: &[[u8; 4]] = bytemuck::cast_slice(blurred.as_raw());
        for (px, soft) in pixels.iter_mut().zip(blurred_pixels) {
            for c in 0..3 {
                let mixed = f32::from(px[c]) * (1.0 - blend) + f32::from(soft[c]) * blend;
                px[c] = to_channel(mixed);
            }
        }

        debug!(level, sigma, blend, "Skin smoothing applied");
        output
    }

    /// Style first, then smoothing
    pub fn process(&self, image: RasterImage, style: CosmeticStyle, level: u8) -> RasterImage {
        let styled = self.apply_style(image, style);
        self.apply_skin_smoothing(styled, level)
    }

    /// [`process`](Self::process) on a blocking task
    pub async fn process_async(
        &self,
        image: RasterImage,
        style: CosmeticStyle,
        level: u8,
    ) -> Result<RasterImage, String> {
        info!(
            width = image.width(),
            height = image.height(),
            style = %style,
            level,
            "Starting cosmetic processing"
        );

        let engine = *self;
        tokio::task::spawn_blocking(move || engine.process(image, style, level))
            .await
            .map_err(|e| format!("Filter task error: {}", e))
    }
}
