//! Session handle and lifecycle state

use livepub_core::{ListenerId, Publisher, PublisherView};
use std::fmt;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Lifecycle state of a publisher session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No media held, or the last attempt failed
    Idle,
    /// Local media acquired and shown, not yet broadcasting
    Previewing,
    /// Broadcasting
    Published,
    /// Waiting for the publisher to stop
    Unpublishing,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Previewing => "previewing",
            SessionState::Published => "published",
            SessionState::Unpublishing => "unpublishing",
        };
        f.write_str(name)
    }
}

/// The live publisher/view pair of a session
pub struct SessionHandle {
    id: Uuid,
    publisher: Arc<dyn Publisher>,
    view: Arc<dyn PublisherView>,
    listener: ListenerId,
}

impl SessionHandle {
    pub(crate) fn new(
        publisher: Arc<dyn Publisher>,
        view: Arc<dyn PublisherView>,
        listener: ListenerId,
    ) -> Self {
        let id = Uuid::new_v4();
        info!("🎥 Created session handle {} on {}", id, view.element_id());
        Self {
            id,
            publisher,
            view,
            listener,
        }
    }

    /// Get handle ID
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Publisher of this session
    pub fn publisher(&self) -> &Arc<dyn Publisher> {
        &self.publisher
    }

    /// Preview view of this session
    pub fn view(&self) -> &Arc<dyn PublisherView> {
        &self.view
    }

    /// Event listener registered on the publisher
    pub fn listener(&self) -> ListenerId {
        self.listener
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id)
            .field("element_id", &self.view.element_id())
            .field("listener", &self.listener)
            .finish()
    }
}
