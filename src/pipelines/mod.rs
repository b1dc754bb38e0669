// SPDX-License-Identifier: MPL-2.0

//! Processing pipelines
//!
//! Capture work never blocks the live preview: pixel filters and encoding
//! run on blocking tasks, timers on the async runtime.
//!
//! # Modules
//!
//! - [`photo`]: Countdown, snapshot, cosmetic filters and capture sessions

pub mod photo;
