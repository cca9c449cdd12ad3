//! # livepub Core
//!
//! Error types, the capability traits of the external publisher provider,
//! publisher events and the merged publish configuration. Everything else in
//! the workspace is built on these.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod event;
pub mod provider;
pub mod stream;

// Re-export main types
pub use config::{PublishConfig, STREAM_NAME_KEY};
pub use error::{
    DeviceError, DeviceErrorKind, ErrorCategory, ProviderFault, PublishError, PublishResult,
};
pub use event::{EventListener, ListenerId, ListenerRegistry, PublisherEvent};
pub use provider::{
    LogLevel, OutboundRtpStats, PeerConnection, Publisher, PublisherProvider, PublisherView,
};
pub use stream::{MediaStream, MediaTrackInfo, TrackKind};
