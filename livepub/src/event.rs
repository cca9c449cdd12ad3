//! Event/status relay between publishers and the host page

use futures::Stream;
use livepub_core::{EventListener, PublisherEvent};
use livepub_diagnostics::BitrateSample;
use parking_lot::Mutex;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tracing::{error, info};

/// Status display hooks supplied by the host
pub trait StatusSink: Send + Sync {
    /// Update the status line from a publisher event
    fn update_from_event(&self, event: &PublisherEvent);

    /// Show the name of the stream being published
    fn set_stream_title(&self, _title: &str) {}

    /// Show the latest statistics line
    fn set_statistics(&self, _text: &str) {}

    /// Surface a failed step
    fn report_failure(&self, _message: &str) {}
}

/// [`StatusSink`] that only writes to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogStatus;

impl StatusSink for LogStatus {
    fn update_from_event(&self, event: &PublisherEvent) {
        info!("Status: {}", event.status_text());
    }

    fn set_stream_title(&self, title: &str) {
        info!("Stream title: {}", title);
    }

    fn set_statistics(&self, text: &str) {
        info!("{}", text);
    }

    fn report_failure(&self, message: &str) {
        error!("{}", message);
    }
}

/// Forwards publisher events to the status sink and to event streams.
///
/// Registered as the single listener on every publisher a session creates.
pub struct EventRelay {
    status: Arc<dyn StatusSink>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<PublisherEvent>>>,
}

impl EventRelay {
    /// Create a relay feeding `status`
    pub fn new(status: Arc<dyn StatusSink>) -> Self {
        Self {
            status,
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Status sink events are relayed to
    pub fn status(&self) -> &Arc<dyn StatusSink> {
        &self.status
    }

    /// Open a new stream receiving every event relayed from now on
    pub fn subscribe(&self) -> EventStream {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        EventStream::new(rx)
    }

    /// Show a bitrate sample; the latest one replaces the previous line
    pub fn relay_statistics(&self, sample: &BitrateSample) {
        self.status.set_statistics(&sample.to_string());
    }

    fn forward(&self, event: &PublisherEvent) {
        // Dropped streams fall out here
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

impl EventListener for EventRelay {
    fn on_event(&self, event: &PublisherEvent) {
        info!("[publisher] {}.", event.event_type());
        self.status.update_from_event(event);
        self.forward(event);
    }
}

impl fmt::Debug for EventRelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRelay")
            .field("subscribers", &self.subscribers.lock().len())
            .finish()
    }
}

/// Stream of publisher events for async iteration
#[derive(Debug)]
pub struct EventStream {
    receiver: mpsc::UnboundedReceiver<PublisherEvent>,
}

impl EventStream {
    /// Create a new event stream with a receiver
    pub fn new(receiver: mpsc::UnboundedReceiver<PublisherEvent>) -> Self {
        Self { receiver }
    }

    /// Get the next event from the stream
    pub async fn next(&mut self) -> Option<PublisherEvent> {
        self.receiver.recv().await
    }

    /// Try to get the next event without blocking
    pub fn try_next(&mut self) -> Result<Option<PublisherEvent>, mpsc::error::TryRecvError> {
        match self.receiver.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => {
                Err(mpsc::error::TryRecvError::Disconnected)
            }
        }
    }

    /// Close the event stream
    pub fn close(&mut self) {
        self.receiver.close();
    }
}

impl Stream for EventStream {
    type Item = PublisherEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
