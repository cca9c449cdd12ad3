//! Publisher lifecycle events and listener registration

use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

/// Events a publisher emits over the life of a session
#[derive(Debug, Clone, PartialEq)]
pub enum PublisherEvent {
    /// Signaling connection established
    ConnectSuccess,
    /// Signaling connection could not be established
    ConnectFailure {
        /// Reason reported by the provider
        reason: String,
    },
    /// Broadcast started
    PublishStart,
    /// Broadcast could not start
    PublishFail {
        /// Reason reported by the provider
        reason: String,
    },
    /// Server rejected the stream name
    PublishInvalidName,
    /// Broadcast stopped
    UnpublishSuccess,
    /// Metadata received from the server
    PublishMetadata {
        /// Metadata payload
        metadata: Value,
    },
    /// Free-form status update from the server
    PublishStatus {
        /// Status code
        code: String,
        /// Human readable description
        description: String,
    },
    /// Stream is available for playback on the server
    PublishAvailable,
    /// Outgoing bandwidth is insufficient
    InsufficientBandwidth,
    /// Outgoing bandwidth recovered
    SufficientBandwidth,
    /// Outgoing bandwidth is recovering
    RecoveringBandwidth,
    /// Connection closed
    ConnectionClosed,
    /// Local media stream became available
    MediaStreamAvailable,
    /// Peer connection created
    PeerConnectionAvailable,
    /// SDP offer started
    OfferStart,
    /// SDP offer finished
    OfferEnd,
    /// ICE candidate gathering finished
    IceTrickleComplete,
}

impl PublisherEvent {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            PublisherEvent::ConnectSuccess => "Connect.Success",
            PublisherEvent::ConnectFailure { .. } => "Connect.Failure",
            PublisherEvent::PublishStart => "Publish.Start",
            PublisherEvent::PublishFail { .. } => "Publish.Fail",
            PublisherEvent::PublishInvalidName => "Publish.InvalidName",
            PublisherEvent::UnpublishSuccess => "Unpublish.Success",
            PublisherEvent::PublishMetadata { .. } => "Publish.Metadata",
            PublisherEvent::PublishStatus { .. } => "Publish.Status",
            PublisherEvent::PublishAvailable => "Publish.Available",
            PublisherEvent::InsufficientBandwidth => "Publish.InsufficientBW",
            PublisherEvent::SufficientBandwidth => "Publish.SufficientBW",
            PublisherEvent::RecoveringBandwidth => "Publish.RecoveringBW",
            PublisherEvent::ConnectionClosed => "Publisher.Connection.Closed",
            PublisherEvent::MediaStreamAvailable => "WebRTC.MediaStream.Available",
            PublisherEvent::PeerConnectionAvailable => "WebRTC.PeerConnection.Available",
            PublisherEvent::OfferStart => "WebRTC.Offer.Start",
            PublisherEvent::OfferEnd => "WebRTC.Offer.End",
            PublisherEvent::IceTrickleComplete => "WebRTC.IceTrickle.Complete",
        }
    }

    /// Status line shown to the user for this event
    pub fn status_text(&self) -> String {
        match self {
            PublisherEvent::ConnectSuccess => "Connection established...".to_string(),
            PublisherEvent::ConnectFailure { reason } => {
                format!("Error - Could not establish connection: {}", reason)
            }
            PublisherEvent::PublishStart => "Started publishing session.".to_string(),
            PublisherEvent::PublishFail { reason } => {
                format!("Error - Could not start a publishing session: {}", reason)
            }
            PublisherEvent::PublishInvalidName => {
                "Error - Stream name already in use.".to_string()
            }
            PublisherEvent::UnpublishSuccess => "Unpublished.".to_string(),
            PublisherEvent::PublishStatus { description, .. } => description.clone(),
            PublisherEvent::PublishAvailable => "Stream available for playback.".to_string(),
            PublisherEvent::InsufficientBandwidth => {
                "Warning - Insufficient bandwidth.".to_string()
            }
            PublisherEvent::SufficientBandwidth => "Bandwidth is sufficient.".to_string(),
            PublisherEvent::RecoveringBandwidth => "Bandwidth is recovering.".to_string(),
            PublisherEvent::ConnectionClosed => "Connection closed.".to_string(),
            PublisherEvent::MediaStreamAvailable => "Media stream available.".to_string(),
            PublisherEvent::PeerConnectionAvailable => "Peer Connection available...".to_string(),
            PublisherEvent::OfferStart => "Begin offer...".to_string(),
            PublisherEvent::OfferEnd => "Offer accepted...".to_string(),
            PublisherEvent::IceTrickleComplete => "Negotiation complete. Waiting Publish Start...".to_string(),
            PublisherEvent::PublishMetadata { .. } => "Metadata received.".to_string(),
        }
    }
}

impl fmt::Display for PublisherEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_type())
    }
}

/// Receiver of every event a publisher emits
pub trait EventListener: Send + Sync {
    /// Handle one event
    fn on_event(&self, event: &PublisherEvent);
}

impl<F> EventListener for F
where
    F: Fn(&PublisherEvent) + Send + Sync,
{
    fn on_event(&self, event: &PublisherEvent) {
        self(event)
    }
}

/// Token returned by [`crate::Publisher::on`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Listener bookkeeping for publisher implementations.
///
/// Removal is idempotent and dispatch goes to listeners in registration order.
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(ListenerId, Arc<dyn EventListener>)>>,
}

impl ListenerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener
    pub fn add(&self, listener: Arc<dyn EventListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, listener));
        id
    }

    /// Remove a listener, returning whether it was registered
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        before != listeners.len()
    }

    /// Deliver an event to every registered listener
    pub fn dispatch(&self, event: &PublisherEvent) {
        // Snapshot so listeners may unsubscribe from inside the callback
        let listeners: Vec<_> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        debug!("Dispatching {} to {} listener(s)", event, listeners.len());
        for listener in listeners {
            listener.on_event(event);
        }
    }

    /// Number of registered listeners
    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Whether no listener is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}
