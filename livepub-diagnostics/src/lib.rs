//! # livepub Diagnostics
//!
//! Outgoing bitrate sampling and structured logging setup.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod bitrate;
pub mod debug_logger;

// Re-export main types
pub use bitrate::{compute_bitrate, BitrateSample, BitrateTracker, BitrateTrackerConfig};
pub use debug_logger::DebugLogger;
