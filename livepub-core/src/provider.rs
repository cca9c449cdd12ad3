//! Capability traits of the external publisher provider
//!
//! The provider owns transport setup, media negotiation and encoding. This
//! crate only drives it through the traits below; hosts implement them over
//! whatever SDK actually moves the media.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::config::PublishConfig;
use crate::error::ProviderFault;
use crate::event::{EventListener, ListenerId};
use crate::stream::MediaStream;

/// Provider log verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Everything
    Trace,
    /// Debug and above
    Debug,
    /// Info and above
    Info,
    /// Warnings and errors
    Warn,
    /// Errors only
    Error,
}

impl LogLevel {
    /// TRACE when verbose logging is requested, WARN otherwise
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            LogLevel::Trace
        } else {
            LogLevel::Warn
        }
    }

    /// Directive usable in a tracing filter
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_directive())
    }
}

/// Factory for publishers and preview views
pub trait PublisherProvider: Send + Sync {
    /// Create a fresh publisher instance
    fn create_publisher(&self) -> Arc<dyn Publisher>;

    /// Create a preview view bound to a render target
    fn create_view(&self, element_id: &str) -> Arc<dyn PublisherView>;

    /// Adjust provider-side logging
    fn set_log_level(&self, _level: LogLevel) {}
}

/// A single publisher instance
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Subscribe to every event this publisher emits
    fn on(&self, listener: Arc<dyn EventListener>) -> ListenerId;

    /// Unsubscribe; returns false when the listener was not registered
    fn off(&self, id: ListenerId) -> bool;

    /// Hand the captured stream to the publisher
    fn attach_stream(&self, media: MediaStream);

    /// Configure the publisher
    async fn init(&self, config: &PublishConfig) -> Result<(), ProviderFault>;

    /// Start broadcasting
    async fn publish(&self) -> Result<(), ProviderFault>;

    /// Stop broadcasting
    async fn unpublish(&self) -> Result<(), ProviderFault>;

    /// Bind or detach the view rendering this publisher
    fn set_view(&self, view: Option<Arc<dyn PublisherView>>);

    /// Underlying transport, available once publishing
    fn peer_connection(&self) -> Option<Arc<dyn PeerConnection>>;
}

/// Local preview surface
pub trait PublisherView: Send + Sync {
    /// Render target identifier
    fn element_id(&self) -> &str;

    /// Show the captured stream
    fn preview(&self, media: &MediaStream, muted: bool);

    /// Bind this view to a publisher
    fn attach_publisher(&self, publisher: Arc<dyn Publisher>);

    /// Blank the rendered source
    fn clear_source(&self);
}

/// Cumulative outbound RTP counters at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutboundRtpStats {
    /// Total bytes sent
    pub bytes_sent: u64,
    /// Total packets sent
    pub packets_sent: u64,
    /// Report timestamp in milliseconds
    pub timestamp_ms: f64,
}

/// Transport behind a publishing session
#[async_trait]
pub trait PeerConnection: Send + Sync {
    /// Current outbound counters, `None` before the first RTP report
    async fn outbound_stats(&self) -> Result<Option<OutboundRtpStats>, ProviderFault>;
}
