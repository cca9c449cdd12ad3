//! # livepub Media
//!
//! User-media constraints, camera facing selection and the device layer trait
//! used to acquire the local camera and microphone.

#![warn(clippy::all)]

pub mod capture;
pub mod constraints;

// Re-export main types
pub use capture::{MediaDevices, SupportedConstraints};
pub use constraints::{FacingMode, MediaConstraintState, MediaConstraints, TrackConstraint};
