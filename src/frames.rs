// SPDX-License-Identifier: GPL-3.0-only

//! Decorative frame selection
//!
//! The core never draws frames. It only validates the selection and hands it
//! to the compositor with the photos.

use crate::pipelines::photo::CosmeticStyle;
use std::path::{Path, PathBuf};

/// Frame family, used for grouping in menus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameCategory {
    Basic,
    Korean,
}

/// A bundled frame image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameAsset {
    pub id: &'static str,
    pub name: &'static str,
    pub category: FrameCategory,
    /// Path relative to the asset root
    pub path: &'static str,
}

/// Bundled frames in menu order
pub const FRAME_CATALOG: &[FrameAsset] = &[
    FrameAsset {
        id: "vn",
        name: "Vietnam",
        category: FrameCategory::Basic,
        path: "assets/frames/basic/Vn_80.png",
    },
    FrameAsset {
        id: "rounded",
        name: "Rounded",
        category: FrameCategory::Basic,
        path: "assets/frames/basic/vnpt_80_nam.png",
    },
    FrameAsset {
        id: "heart",
        name: "Heart",
        category: FrameCategory::Basic,
        path: "assets/frames/basic/heart.png",
    },
    FrameAsset {
        id: "circle",
        name: "Circle",
        category: FrameCategory::Basic,
        path: "assets/frames/basic/circle.png",
    },
    FrameAsset {
        id: "vintage",
        name: "Vintage",
        category: FrameCategory::Basic,
        path: "assets/frames/basic/vintage.png",
    },
    FrameAsset {
        id: "kawaii",
        name: "Kawaii",
        category: FrameCategory::Korean,
        path: "assets/frames/korean/kawaii.png",
    },
    FrameAsset {
        id: "pastel",
        name: "Pastel",
        category: FrameCategory::Korean,
        path: "assets/frames/korean/pastel.png",
    },
    FrameAsset {
        id: "cherry-blossom",
        name: "Cherry Blossom",
        category: FrameCategory::Korean,
        path: "assets/frames/korean/cherry-blossom.png",
    },
    FrameAsset {
        id: "cute-border",
        name: "Cute Border",
        category: FrameCategory::Korean,
        path: "assets/frames/korean/cute-border.png",
    },
    FrameAsset {
        id: "korean-traditional",
        name: "Korean Traditional",
        category: FrameCategory::Korean,
        path: "assets/frames/korean/korean-traditional.png",
    },
];

/// Look up a bundled frame by id
pub fn find_asset(id: &str) -> Option<&'static FrameAsset> {
    FRAME_CATALOG.iter().find(|asset| asset.id == id)
}

/// Overlay image that accompanies a style, if any
pub fn style_overlay(style: CosmeticStyle) -> Option<&'static str> {
    match style {
        CosmeticStyle::None | CosmeticStyle::Minimal => None,
        CosmeticStyle::Vintage => Some("assets/frames/effects/vintage-overlay.png"),
        CosmeticStyle::Retro => Some("assets/frames/effects/retro-overlay.png"),
        CosmeticStyle::Bright => Some("assets/frames/effects/bright-overlay.png"),
        CosmeticStyle::Dreamy => Some("assets/frames/effects/dreamy-overlay.png"),
        CosmeticStyle::Kawaii => Some("assets/frames/effects/kawaii-overlay.png"),
        CosmeticStyle::Pastel => Some("assets/frames/effects/pastel-overlay.png"),
        CosmeticStyle::Film => Some("assets/frames/effects/film-strip.png"),
    }
}

/// Selected decorative frame
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FrameSelection {
    #[default]
    None,
    Asset(&'static FrameAsset),
    /// User-supplied frame image
    Custom(PathBuf),
}

impl FrameSelection {
    /// Resolve a frame id (`none`, a catalog id or `custom`)
    pub fn parse(id: &str, custom_path: Option<&Path>) -> Result<Self, String> {
        match id.trim() {
            "" | "none" => Ok(FrameSelection::None),
            "custom" => custom_path
                .map(|p| FrameSelection::Custom(p.to_path_buf()))
                .ok_or_else(|| "Custom frame selected but no frame image given".to_string()),
            other => find_asset(other)
                .map(FrameSelection::Asset)
                .ok_or_else(|| format!("Unknown frame: {}", other)),
        }
    }

    /// Identifier as stored in config and manifests
    pub fn id(&self) -> &str {
        match self {
            FrameSelection::None => "none",
            FrameSelection::Asset(asset) => asset.id,
            FrameSelection::Custom(_) => "custom",
        }
    }

    /// Image path for the compositor
    pub fn image_path(&self) -> Option<PathBuf> {
        match self {
            FrameSelection::None => None,
            FrameSelection::Asset(asset) => Some(PathBuf::from(asset.path)),
            FrameSelection::Custom(path) => Some(path.clone()),
        }
    }
}
