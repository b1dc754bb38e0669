// SPDX-License-Identifier: MPL-2.0

//! Backend abstraction layer for camera capture
//!
//! # Architecture
//!
//! The backend layer hides how frames are obtained, so the capture pipeline
//! works the same against a real camera or a still image:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              Capture pipeline               │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                   │
//! │  ┌──────────────────┐  ┌─────────────────┐  │
//! │  │ Camera           │  │ Still image     │  │
//! │  │ (GStreamer)      │  │ (file/pattern)  │  │
//! │  └──────────────────┘  └─────────────────┘  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`camera`]: Host trait, device enumeration and stream ownership

pub mod camera;
