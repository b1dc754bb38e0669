// SPDX-License-Identifier: MPL-2.0

//! Integration tests for cosmetic styles and skin smoothing

use photobooth::pipelines::photo::{CosmeticFilterEngine, CosmeticStyle, RasterImage};
use photobooth::preview::preview_filter;

/// Diagonal gradient with a few saturated patches
fn sample_image() -> RasterImage {
    let (width, height) = (16u32, 12u32);
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let r = (x * 16) as u8;
            let g = (y * 20) as u8;
            let b = ((x + y) * 9) as u8;
            data.extend_from_slice(&[r, g, b, 200]);
        }
    }
    RasterImage::new(width, height, data).unwrap()
}

#[test]
fn test_level_zero_none_is_identity() {
    let engine = CosmeticFilterEngine::new();
    let input = sample_image();
    let output = engine.process(input.clone(), CosmeticStyle::None, 0);
    assert_eq!(output, input, "None at level 0 must not change any byte");
}

#[test]
fn test_dreamy_has_no_pixel_transform() {
    let engine = CosmeticFilterEngine::new();
    let input = sample_image();
    assert_eq!(engine.apply_style(input.clone(), CosmeticStyle::Dreamy), input);
    assert!(
        !preview_filter(CosmeticStyle::Dreamy, 0).is_empty(),
        "Dreamy still has a preview chain"
    );
}

#[test]
fn test_styles_keep_dimensions_and_alpha() {
    let engine = CosmeticFilterEngine::new();
    for style in CosmeticStyle::ALL {
        let output = engine.process(sample_image(), style, 50);
        assert_eq!((output.width(), output.height()), (16, 12), "{}", style);
        assert!(
            output.data().chunks_exact(4).all(|px| px[3] == 200),
            "{} must not touch alpha",
            style
        );
    }
}

#[test]
fn test_black_stays_black() {
    let engine = CosmeticFilterEngine::new();
    for style in CosmeticStyle::ALL {
        let output = engine.apply_style(RasterImage::filled(2, 2, [0, 0, 0, 255]), style);
        assert_eq!(output.pixel(0, 0), Some([0, 0, 0, 255]), "{}", style);
    }
}

#[test]
fn test_channels_clamp_at_255() {
    let engine = CosmeticFilterEngine::new();
    let white = RasterImage::filled(2, 2, [255, 255, 255, 255]);

    let bright = engine.apply_style(white.clone(), CosmeticStyle::Bright);
    assert_eq!(bright.pixel(1, 1), Some([255, 255, 255, 255]));

    // Sepia rows sum to 1.351, 1.203 and 0.937
    let vintage = engine.apply_style(white, CosmeticStyle::Vintage);
    assert_eq!(vintage.pixel(0, 0), Some([255, 255, 239, 255]));
}

#[test]
fn test_minimal_is_grayscale() {
    let engine = CosmeticFilterEngine::new();
    let output = engine.apply_style(sample_image(), CosmeticStyle::Minimal);
    for px in output.data().chunks_exact(4) {
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
    }
}

#[test]
fn test_retro_warms_the_image() {
    let engine = CosmeticFilterEngine::new();
    let output = engine.apply_style(
        RasterImage::filled(1, 1, [100, 100, 100, 255]),
        CosmeticStyle::Retro,
    );
    assert_eq!(output.pixel(0, 0), Some([110, 105, 90, 255]));
}

#[test]
fn test_smoothing_softens_edges() {
    let engine = CosmeticFilterEngine::new();

    // Hard vertical edge
    let mut data = Vec::new();
    for _y in 0..8 {
        for x in 0..8 {
            let v = if x < 4 { 0 } else { 255 };
            data.extend_from_slice(&[v, v, v, 255]);
        }
    }
    let edge = RasterImage::new(8, 8, data).unwrap();

    let light = engine.apply_skin_smoothing(edge.clone(), 20);
    let strong = engine.apply_skin_smoothing(edge.clone(), 100);

    let dark_side = |img: &RasterImage| img.pixel(3, 4).unwrap()[0];
    assert_eq!(dark_side(&edge), 0);
    assert!(dark_side(&strong) > 0, "Level 100 should bleed across the edge");
    assert!(
        dark_side(&strong) >= dark_side(&light),
        "More smoothing should not soften less"
    );
    assert!(strong.data().chunks_exact(4).all(|px| px[3] == 255));
}

#[test]
fn test_smoothing_keeps_flat_image_at_every_level() {
    let engine = CosmeticFilterEngine::new();
    let flat = RasterImage::filled(32, 32, [200, 200, 200, 255]);
    for level in 1..=100 {
        let output = engine.apply_skin_smoothing(flat.clone(), level);
        assert_eq!(
            output.pixel(0, 0),
            Some([200, 200, 200, 255]),
            "Level {} changed the top-left corner",
            level
        );
        assert_eq!(output, flat, "Level {} changed a flat image", level);
    }
}

#[test]
fn test_smoothing_level_is_capped() {
    let engine = CosmeticFilterEngine::new();
    let input = sample_image();
    assert_eq!(
        engine.apply_skin_smoothing(input.clone(), 100),
        engine.apply_skin_smoothing(input, 255)
    );
}

#[tokio::test]
async fn test_process_async_matches_process() {
    let engine = CosmeticFilterEngine::new();
    let expected = engine.process(sample_image(), CosmeticStyle::Film, 30);
    let actual = engine
        .process_async(sample_image(), CosmeticStyle::Film, 30)
        .await
        .unwrap();
    assert_eq!(actual, expected);
}

#[test]
fn test_style_names_parse() {
    for style in CosmeticStyle::ALL {
        assert_eq!(style.name().parse::<CosmeticStyle>(), Ok(style));
    }
    assert_eq!("  KAWAII ".parse::<CosmeticStyle>(), Ok(CosmeticStyle::Kawaii));
    assert!("sparkle".parse::<CosmeticStyle>().is_err());
}
