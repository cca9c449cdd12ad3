//! # livepub - camera/microphone publisher sessions
//!
//! livepub drives an external real-time media provider through the life of a
//! publisher session: acquire the local camera and microphone, preview them,
//! configure and start the broadcast, and tear everything down again. The
//! provider does the actual media work and is plugged in through the traits
//! re-exported from `livepub-core` and `livepub-media`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use livepub::{LivePub, MemoryStore, SessionVariant};
//! # use std::sync::Arc;
//! # async fn example(
//! #     provider: Arc<dyn livepub::PublisherProvider>,
//! #     devices: Arc<dyn livepub::MediaDevices>,
//! # ) -> Result<(), livepub::PublishError> {
//! let store = MemoryStore::new()
//!     .with_item("r5proTestBed", r#"{"stream1": "stream1", "verboseLogging": true}"#);
//!
//! let livepub = LivePub::from_store(provider, devices, &store);
//! let mut session = livepub.session(SessionVariant::CameraSwap).build();
//!
//! // Preview and publish
//! session.start().await?;
//!
//! // Swap cameras on a tap
//! if session.supports_camera_swap() {
//!     session.toggle_facing_mode().await?;
//! }
//!
//! // Host is going away
//! session.teardown().await;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

// Re-export core types for easy access
pub use livepub_core::{
    DeviceError, DeviceErrorKind, ErrorCategory, EventListener, ListenerId, ListenerRegistry,
    LogLevel, MediaStream, MediaTrackInfo, OutboundRtpStats, PeerConnection, ProviderFault,
    PublishConfig, PublishError, PublishResult, Publisher, PublisherEvent, PublisherProvider,
    PublisherView, TrackKind,
};
pub use livepub_diagnostics::{BitrateSample, BitrateTracker, BitrateTrackerConfig, DebugLogger};
pub use livepub_media::{
    FacingMode, MediaConstraintState, MediaConstraints, MediaDevices, SupportedConstraints,
    TrackConstraint,
};

// Public API modules
pub mod config;
pub mod event;
pub mod handle;
pub mod session;

// Re-export main API types
pub use config::{
    ConfigurationSource, ConnectionDefaults, MemoryStore, ServerSettings, SessionStore,
    SessionVariant, TestbedSettings,
};
pub use event::{EventRelay, EventStream, LogStatus, StatusSink};
pub use handle::{SessionHandle, SessionState};
pub use session::{SessionBuilder, SessionController};

use std::sync::Arc;
use tracing::debug;

/// Main entry point for livepub
#[derive(Clone)]
pub struct LivePub {
    inner: Arc<LivePubInner>,
}

struct LivePubInner {
    provider: Arc<dyn PublisherProvider>,
    devices: Arc<dyn MediaDevices>,
    configuration: ConfigurationSource,
}

impl LivePub {
    /// Bind a provider and device layer to already loaded settings.
    ///
    /// Pushes the configured log level to the provider.
    pub fn new(
        provider: Arc<dyn PublisherProvider>,
        devices: Arc<dyn MediaDevices>,
        configuration: ConfigurationSource,
    ) -> Self {
        let level = configuration.log_level();
        debug!("Setting provider log level to {}", level);
        provider.set_log_level(level);
        Self {
            inner: Arc::new(LivePubInner {
                provider,
                devices,
                configuration,
            }),
        }
    }

    /// Read settings from the host's session storage
    pub fn from_store(
        provider: Arc<dyn PublisherProvider>,
        devices: Arc<dyn MediaDevices>,
        store: &dyn SessionStore,
    ) -> Self {
        Self::new(provider, devices, ConfigurationSource::load(store))
    }

    /// Install the tracing subscriber at the configured level
    pub fn init_logging(&self) -> PublishResult<()> {
        DebugLogger::init_logging(self.inner.configuration.log_level())
    }

    /// Create a session builder for the given variant
    pub fn session(&self, variant: SessionVariant) -> SessionBuilder {
        SessionBuilder::new(self, variant)
    }

    /// Loaded settings
    pub fn configuration(&self) -> &ConfigurationSource {
        &self.inner.configuration
    }

    /// Whether the device layer can select cameras by facing
    pub fn supports_facing_mode(&self) -> bool {
        self.inner.devices.supported_constraints().facing_mode
    }

    pub(crate) fn provider(&self) -> &Arc<dyn PublisherProvider> {
        &self.inner.provider
    }

    pub(crate) fn devices(&self) -> &Arc<dyn MediaDevices> {
        &self.inner.devices
    }
}

impl std::fmt::Debug for LivePub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LivePub")
            .field("configuration", &self.inner.configuration)
            .finish()
    }
}
