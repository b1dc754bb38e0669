// SPDX-License-Identifier: GPL-3.0-only

//! CSS-style filter chains for the live preview
//!
//! These only approximate a style on screen. Captured photos go through
//! [`CosmeticFilterEngine`](crate::pipelines::photo::CosmeticFilterEngine).

use crate::constants::session::MAX_SMOOTHING_LEVEL;
use crate::pipelines::photo::CosmeticStyle;

/// Filter functions for a style, in application order
pub fn style_chain(style: CosmeticStyle) -> &'static [&'static str] {
    match style {
        CosmeticStyle::None => &[],
        CosmeticStyle::Vintage => &[
            "sepia(0.3)",
            "contrast(1.1)",
            "saturate(0.9)",
            "brightness(1.05)",
        ],
        CosmeticStyle::Retro => &[
            "sepia(0.5)",
            "contrast(1.2)",
            "hue-rotate(15deg)",
            "saturate(1.1)",
        ],
        CosmeticStyle::Minimal => &["grayscale(1)", "contrast(1.1)", "brightness(1.05)"],
        CosmeticStyle::Bright => &["brightness(1.3)", "contrast(1.15)", "saturate(1.3)"],
        CosmeticStyle::Dreamy => &[
            "brightness(1.15)",
            "blur(0.8px)",
            "saturate(1.4)",
            "contrast(0.95)",
        ],
        CosmeticStyle::Kawaii => &[
            "brightness(1.2)",
            "saturate(1.5)",
            "contrast(1.1)",
            "hue-rotate(10deg)",
        ],
        CosmeticStyle::Pastel => &[
            "brightness(1.1)",
            "saturate(0.8)",
            "contrast(0.9)",
            "hue-rotate(-5deg)",
        ],
        CosmeticStyle::Film => &[
            "sepia(0.2)",
            "contrast(1.3)",
            "saturate(0.85)",
            "brightness(0.95)",
        ],
    }
}

/// Full preview filter: style chain followed by the smoothing approximation
///
/// Smoothing adds `blur(level/50 * 1.5 px) brightness(1 + level/200)` when
/// the level is above zero. An empty string means no filter.
pub fn preview_filter(style: CosmeticStyle, smoothing_level: u8) -> String {
    let mut parts: Vec<String> = style_chain(style).iter().map(|s| s.to_string()).collect();

    let level = f64::from(smoothing_level.min(MAX_SMOOTHING_LEVEL));
    if level > 0.0 {
        parts.push(format!("blur({}px)", format_amount(level / 50.0 * 1.5)));
        parts.push(format!("brightness({})", format_amount(1.0 + level / 200.0)));
    }

    parts.join(" ")
}

/// Up to three decimals, trailing zeros dropped
fn format_amount(value: f64) -> String {
    let text = format!("{:.3}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vintage_chain() {
        assert_eq!(
            preview_filter(CosmeticStyle::Vintage, 0),
            "sepia(0.3) contrast(1.1) saturate(0.9) brightness(1.05)"
        );
    }

    #[test]
    fn test_none_without_smoothing_is_empty() {
        assert_eq!(preview_filter(CosmeticStyle::None, 0), "");
    }

    #[test]
    fn test_smoothing_appended() {
        assert_eq!(
            preview_filter(CosmeticStyle::None, 50),
            "blur(1.5px) brightness(1.25)"
        );
        assert_eq!(
            preview_filter(CosmeticStyle::Minimal, 100),
            "grayscale(1) contrast(1.1) brightness(1.05) blur(3px) brightness(1.5)"
        );
        assert_eq!(
            preview_filter(CosmeticStyle::None, 10),
            "blur(0.3px) brightness(1.05)"
        );
    }

    #[test]
    fn test_every_styled_preset_has_a_chain() {
        for style in CosmeticStyle::ALL {
            assert_eq!(
                style_chain(style).is_empty(),
                style == CosmeticStyle::None,
                "{} chain",
                style
            );
        }
    }
}
