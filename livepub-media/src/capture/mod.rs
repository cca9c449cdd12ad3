//! Local media acquisition

use async_trait::async_trait;
use livepub_core::{DeviceError, MediaStream};

use crate::constraints::MediaConstraints;

/// Constraints the device layer understands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SupportedConstraints {
    /// Camera can be selected by facing direction
    pub facing_mode: bool,
}

/// Device layer granting access to the camera and microphone.
///
/// `get_user_media` resolves with the captured stream or fails with the raw
/// device error; there is no retry at this level.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// Constraints this device layer supports
    fn supported_constraints(&self) -> SupportedConstraints;

    /// Acquire local media matching the constraints
    async fn get_user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<MediaStream, DeviceError>;
}
