//! Publisher session lifecycle
//!
//! A [`SessionController`] drives one publisher session through
//! preview → publish → unpublish, with a full reset for camera swaps and a
//! forced teardown for when the host goes away. Every operation takes
//! `&mut self`, so two operations never run on the same handle at once.

use crate::config::{ConfigurationSource, SessionVariant, DEFAULT_ELEMENT_ID, STREAM_NAME_SOURCE};
use crate::event::{EventRelay, EventStream, LogStatus, StatusSink};
use crate::handle::{SessionHandle, SessionState};
use crate::LivePub;
use livepub_core::{
    EventListener, PublishConfig, PublishError, PublishResult, Publisher, PublisherProvider,
};
use livepub_diagnostics::{BitrateTracker, BitrateTrackerConfig};
use livepub_media::{FacingMode, MediaConstraintState, MediaConstraints, MediaDevices};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Fluent builder for a publisher session
pub struct SessionBuilder {
    provider: Arc<dyn PublisherProvider>,
    devices: Arc<dyn MediaDevices>,
    configuration: ConfigurationSource,
    variant: SessionVariant,
    element_id: String,
    status: Option<Arc<dyn StatusSink>>,
    bitrate: BitrateTrackerConfig,
}

impl SessionBuilder {
    pub(crate) fn new(livepub: &LivePub, variant: SessionVariant) -> Self {
        Self {
            provider: Arc::clone(livepub.provider()),
            devices: Arc::clone(livepub.devices()),
            configuration: livepub.configuration().clone(),
            variant,
            element_id: DEFAULT_ELEMENT_ID.to_string(),
            status: None,
            bitrate: BitrateTrackerConfig::default(),
        }
    }

    /// Set the render target of the preview view
    pub fn element_id(mut self, element_id: &str) -> Self {
        self.element_id = element_id.to_string();
        self
    }

    /// Set the host status hooks
    pub fn status_sink(mut self, status: Arc<dyn StatusSink>) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the bitrate sampling interval
    pub fn bitrate_interval(mut self, interval: Duration) -> Self {
        self.bitrate.interval = interval;
        self
    }

    /// Build the session controller; nothing is acquired yet
    pub fn build(self) -> SessionController {
        let status = self.status.unwrap_or_else(|| Arc::new(LogStatus));
        let facing_supported = self.devices.supported_constraints().facing_mode;
        SessionController {
            provider: self.provider,
            devices: self.devices,
            configuration: self.configuration,
            variant: self.variant,
            element_id: self.element_id,
            constraints: MediaConstraintState::new(facing_supported),
            relay: Arc::new(EventRelay::new(status)),
            bitrate: BitrateTracker::with_config(self.bitrate),
            handle: None,
            state: SessionState::Idle,
        }
    }
}

/// Owns the publish lifecycle of one session
pub struct SessionController {
    provider: Arc<dyn PublisherProvider>,
    devices: Arc<dyn MediaDevices>,
    configuration: ConfigurationSource,
    variant: SessionVariant,
    element_id: String,
    constraints: MediaConstraintState,
    relay: Arc<EventRelay>,
    bitrate: BitrateTracker,
    handle: Option<SessionHandle>,
    state: SessionState,
}

impl SessionController {
    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Currently held publisher/view pair
    pub fn handle(&self) -> Option<&SessionHandle> {
        self.handle.as_ref()
    }

    /// Session variant
    pub fn variant(&self) -> SessionVariant {
        self.variant
    }

    /// Current camera facing, `None` when unsupported
    pub fn facing_mode(&self) -> Option<FacingMode> {
        self.constraints.facing_mode()
    }

    /// Whether the user can swap cameras in this session
    pub fn supports_camera_swap(&self) -> bool {
        self.variant.supports_camera_swap() && self.constraints.supports_facing_mode()
    }

    /// Whether bitrate sampling is running
    pub fn is_tracking_bitrate(&self) -> bool {
        self.bitrate.is_tracking()
    }

    /// Open a stream of the events relayed from this session's publishers
    pub fn events(&self) -> EventStream {
        self.relay.subscribe()
    }

    /// Constraints the next preview will request
    pub fn user_media_constraints(&self) -> MediaConstraints {
        self.variant
            .user_media(self.configuration.testbed(), &self.constraints)
    }

    /// Configuration the next publish will hand to the publisher
    pub fn publish_config(&self) -> PublishResult<PublishConfig> {
        let mut config = self
            .variant
            .publish_config(&self.configuration, &self.constraints)?;
        config.derive_stream_name(STREAM_NAME_SOURCE)?;
        Ok(config)
    }

    /// Acquire local media and bind it to a new publisher and view.
    ///
    /// A device failure is returned unchanged inside
    /// [`PublishError::MediaAccess`]; nothing is retried.
    pub async fn preview(&mut self) -> PublishResult<()> {
        if let Some(handle) = &self.handle {
            return Err(PublishError::InvalidState {
                expected: "no active session".to_string(),
                actual: format!("session {} ({})", handle.id(), self.state),
            });
        }

        let constraints = self.user_media_constraints();
        info!("gUM:: {}", constraints.to_pretty_json());

        let publisher = self.provider.create_publisher();
        let view = self.provider.create_view(&self.element_id);
        let listener = publisher.on(Arc::clone(&self.relay) as Arc<dyn EventListener>);
        self.set_state(SessionState::Previewing);

        match self.devices.get_user_media(&constraints).await {
            Ok(media) => {
                info!(
                    "Acquired stream {} with {} track(s) (video: {}, audio: {})",
                    media.id(),
                    media.tracks().len(),
                    media.has_video(),
                    media.has_audio()
                );
                publisher.attach_stream(media.clone());
                view.preview(&media, true);
                if self.variant.attaches_view_on_preview() {
                    view.attach_publisher(Arc::clone(&publisher));
                }
                self.handle = Some(SessionHandle::new(publisher, view, listener));
                Ok(())
            }
            Err(err) => {
                publisher.off(listener);
                self.report_publish_failure(&format!("Error - {}", err));
                self.set_state(SessionState::Idle);
                Err(PublishError::MediaAccess(err))
            }
        }
    }

    /// Configure the held publisher and start broadcasting.
    ///
    /// A rejected init or publish ends the attempt: the session goes back to
    /// idle and keeps its handle so it can still be unpublished or torn down.
    pub async fn publish(&mut self) -> PublishResult<()> {
        let (publisher, view) = match &self.handle {
            Some(handle) => (Arc::clone(handle.publisher()), Arc::clone(handle.view())),
            None => return Err(PublishError::NoActiveSession),
        };
        if self.state != SessionState::Previewing {
            return Err(PublishError::InvalidState {
                expected: SessionState::Previewing.to_string(),
                actual: self.state.to_string(),
            });
        }

        let config = match self.publish_config() {
            Ok(config) => config,
            Err(err) => {
                self.report_publish_failure(&format!("Error - {}", err));
                self.set_state(SessionState::Idle);
                return Err(err);
            }
        };
        info!("config:: {}", config.to_pretty_json());

        if !self.variant.attaches_view_on_preview() {
            view.attach_publisher(Arc::clone(&publisher));
        }
        self.relay
            .status()
            .set_stream_title(config.stream_name().unwrap_or_default());

        match Self::init_and_publish(publisher.as_ref(), &config).await {
            Ok(()) => {
                info!("Publish Complete.");
                self.set_state(SessionState::Published);
                if self.variant.tracks_bitrate() {
                    self.start_bitrate_tracking(&publisher);
                }
                Ok(())
            }
            Err(err) => {
                let detail = err
                    .provider_fault()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| err.to_string());
                self.report_publish_failure(&format!("Error - {}", detail));
                self.set_state(SessionState::Idle);
                Err(err)
            }
        }
    }

    async fn init_and_publish(publisher: &dyn Publisher, config: &PublishConfig) -> PublishResult<()> {
        publisher.init(config).await.map_err(PublishError::Init)?;
        publisher.publish().await.map_err(PublishError::Publish)
    }

    /// Stop broadcasting and release the publisher/view pair.
    ///
    /// Succeeds immediately when no handle is held. On failure the handle is
    /// kept and the previous state restored.
    pub async fn unpublish(&mut self) -> PublishResult<()> {
        let Some(handle) = &self.handle else {
            info!("Unpublish Complete.");
            return Ok(());
        };
        let publisher = Arc::clone(handle.publisher());
        let view = Arc::clone(handle.view());
        let listener = handle.listener();

        let previous = self.state;
        self.set_state(SessionState::Unpublishing);

        match publisher.unpublish().await {
            Ok(()) => {
                view.clear_source();
                publisher.set_view(None);
                publisher.off(listener);
                self.bitrate.untrack();
                self.handle = None;
                self.set_state(SessionState::Idle);
                info!("Unpublish Complete.");
                Ok(())
            }
            Err(fault) => {
                let message = format!("Unpublish Error :: Unmount Error {}", fault);
                error!("{}", message);
                self.relay.status().report_failure(&message);
                self.set_state(previous);
                Err(PublishError::Unpublish(fault))
            }
        }
    }

    /// Preview then publish, as done when the host page loads
    pub async fn start(&mut self) -> PublishResult<()> {
        let result = self.preview_then_publish().await;
        Self::log_chain_failure(&result);
        result
    }

    /// Unpublish, preview and publish again, stopping at the first failure
    pub async fn reset_session(&mut self) -> PublishResult<()> {
        let result = self.unpublish_then_restart().await;
        Self::log_chain_failure(&result);
        result
    }

    async fn preview_then_publish(&mut self) -> PublishResult<()> {
        self.preview().await?;
        self.publish().await
    }

    async fn unpublish_then_restart(&mut self) -> PublishResult<()> {
        self.unpublish().await?;
        self.preview_then_publish().await
    }

    /// Switch between front and rear camera and restart the session
    pub async fn toggle_facing_mode(&mut self) -> PublishResult<FacingMode> {
        if !self.variant.supports_camera_swap() {
            return Err(PublishError::Unsupported {
                feature: format!("camera swap in {:?} sessions", self.variant),
            });
        }
        let Some(mode) = self.constraints.toggle() else {
            return Err(PublishError::Unsupported {
                feature: "facingMode".to_string(),
            });
        };
        info!("🔄 Switching camera to {}", mode);
        self.reset_session().await?;
        Ok(mode)
    }

    /// Release everything before the host goes away.
    ///
    /// Unpublish is attempted once; whatever it returns, the handle is
    /// cleared and bitrate sampling stopped.
    pub async fn teardown(&mut self) {
        if let Err(err) = self.unpublish().await {
            warn!("Unpublish failed during teardown, clearing session anyway: {}", err);
        }
        if let Some(handle) = self.handle.take() {
            handle.publisher().off(handle.listener());
        }
        self.bitrate.untrack();
        self.set_state(SessionState::Idle);
    }

    fn start_bitrate_tracking(&self, publisher: &Arc<dyn Publisher>) {
        match publisher.peer_connection() {
            Some(connection) => {
                let relay = Arc::clone(&self.relay);
                self.bitrate
                    .track(connection, move |sample| relay.relay_statistics(&sample));
            }
            None => warn!("Publisher exposes no peer connection; bitrate not tracked"),
        }
    }

    fn report_publish_failure(&self, message: &str) {
        let line = format!("Publish Error :: {}", message);
        error!("{}", line);
        self.relay.status().report_failure(&line);
    }

    fn log_chain_failure(result: &PublishResult<()>) {
        if let Err(err) = result {
            error!(code = err.error_code(), "Error in publishing - {}", err);
        }
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            debug!("Session state changed: {} -> {}", self.state, state);
            self.state = state;
        }
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("variant", &self.variant)
            .field("state", &self.state)
            .field("element_id", &self.element_id)
            .field("facing_mode", &self.constraints.facing_mode())
            .field("handle", &self.handle)
            .finish()
    }
}
