//! Shared fakes for session tests
//!
//! Every fake appends to one call log so tests can assert on the exact order
//! of provider calls across publishers, views and the device layer.

#![allow(dead_code)]

use async_trait::async_trait;
use livepub::*;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Ordered record of every provider-side call
#[derive(Default, Clone)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn push(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}

/// Failures the next publisher calls should report
#[derive(Default, Clone)]
pub struct Script {
    pub fail_init: Option<ProviderFault>,
    pub fail_publish: Option<ProviderFault>,
    pub fail_unpublish: Option<ProviderFault>,
    pub with_peer_connection: bool,
}

pub struct FakePublisher {
    pub index: usize,
    log: CallLog,
    script: Arc<Mutex<Script>>,
    listeners: ListenerRegistry,
    pub config: Mutex<Option<PublishConfig>>,
    pub view: Mutex<Option<Arc<dyn PublisherView>>>,
    connection: Arc<SteadyConnection>,
}

impl FakePublisher {
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn call(&self, name: &str) {
        self.log.push(format!("publisher{}.{}", self.index, name));
    }
}

#[async_trait]
impl Publisher for FakePublisher {
    fn on(&self, listener: Arc<dyn EventListener>) -> ListenerId {
        self.call("on");
        self.listeners.add(listener)
    }

    fn off(&self, id: ListenerId) -> bool {
        self.call("off");
        self.listeners.remove(id)
    }

    fn attach_stream(&self, _media: MediaStream) {
        self.call("attach_stream");
    }

    async fn init(&self, config: &PublishConfig) -> Result<(), ProviderFault> {
        self.call("init");
        *self.config.lock() = Some(config.clone());
        match self.script.lock().fail_init.clone() {
            Some(fault) => Err(fault),
            None => Ok(()),
        }
    }

    async fn publish(&self) -> Result<(), ProviderFault> {
        self.call("publish");
        if let Some(fault) = self.script.lock().fail_publish.clone() {
            self.listeners.dispatch(&PublisherEvent::PublishFail {
                reason: fault.to_string(),
            });
            return Err(fault);
        }
        self.listeners.dispatch(&PublisherEvent::ConnectSuccess);
        self.listeners.dispatch(&PublisherEvent::PublishStart);
        Ok(())
    }

    async fn unpublish(&self) -> Result<(), ProviderFault> {
        self.call("unpublish");
        if let Some(fault) = self.script.lock().fail_unpublish.clone() {
            return Err(fault);
        }
        self.listeners.dispatch(&PublisherEvent::UnpublishSuccess);
        Ok(())
    }

    fn set_view(&self, view: Option<Arc<dyn PublisherView>>) {
        self.call(if view.is_some() { "set_view" } else { "clear_view" });
        *self.view.lock() = view;
    }

    fn peer_connection(&self) -> Option<Arc<dyn PeerConnection>> {
        if self.script.lock().with_peer_connection {
            Some(self.connection.clone() as Arc<dyn PeerConnection>)
        } else {
            None
        }
    }
}

pub struct FakeView {
    pub index: usize,
    element_id: String,
    log: CallLog,
}

impl PublisherView for FakeView {
    fn element_id(&self) -> &str {
        &self.element_id
    }

    fn preview(&self, _media: &MediaStream, muted: bool) {
        self.log
            .push(format!("view{}.preview(muted={})", self.index, muted));
    }

    fn attach_publisher(&self, _publisher: Arc<dyn Publisher>) {
        self.log.push(format!("view{}.attach_publisher", self.index));
    }

    fn clear_source(&self) {
        self.log.push(format!("view{}.clear_source", self.index));
    }
}

#[derive(Default)]
pub struct FakeProvider {
    pub log: CallLog,
    pub script: Arc<Mutex<Script>>,
    pub publishers: Mutex<Vec<Arc<FakePublisher>>>,
    pub views: Mutex<Vec<Arc<FakeView>>>,
    pub log_level: Mutex<Option<LogLevel>>,
}

impl FakeProvider {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            ..Default::default()
        }
    }

    pub fn script(&self, update: impl FnOnce(&mut Script)) {
        update(&mut self.script.lock());
    }

    pub fn publisher(&self, index: usize) -> Arc<FakePublisher> {
        self.publishers.lock()[index].clone()
    }

    pub fn publisher_count(&self) -> usize {
        self.publishers.lock().len()
    }
}

impl PublisherProvider for FakeProvider {
    fn create_publisher(&self) -> Arc<dyn Publisher> {
        let mut publishers = self.publishers.lock();
        let publisher = Arc::new(FakePublisher {
            index: publishers.len(),
            log: self.log.clone(),
            script: self.script.clone(),
            listeners: ListenerRegistry::new(),
            config: Mutex::new(None),
            view: Mutex::new(None),
            connection: Arc::new(SteadyConnection::default()),
        });
        self.log.push(format!("create_publisher{}", publisher.index));
        publishers.push(publisher.clone());
        publisher
    }

    fn create_view(&self, element_id: &str) -> Arc<dyn PublisherView> {
        let mut views = self.views.lock();
        let view = Arc::new(FakeView {
            index: views.len(),
            element_id: element_id.to_string(),
            log: self.log.clone(),
        });
        self.log.push(format!("create_view{}", view.index));
        views.push(view.clone());
        view
    }

    fn set_log_level(&self, level: LogLevel) {
        *self.log_level.lock() = Some(level);
    }
}

/// Sends 125 000 bytes and 100 packets per second
#[derive(Default)]
pub struct SteadyConnection {
    polls: AtomicU64,
}

#[async_trait]
impl PeerConnection for SteadyConnection {
    async fn outbound_stats(&self) -> Result<Option<OutboundRtpStats>, ProviderFault> {
        let n = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Some(OutboundRtpStats {
            bytes_sent: n * 125_000,
            packets_sent: n * 100,
            timestamp_ms: n as f64 * 1000.0,
        }))
    }
}

pub struct FakeDevices {
    log: CallLog,
    facing_mode: bool,
    pub deny_with: Mutex<Option<DeviceError>>,
    pub requests: Mutex<Vec<MediaConstraints>>,
}

impl FakeDevices {
    pub fn new(log: CallLog, facing_mode: bool) -> Self {
        Self {
            log,
            facing_mode,
            deny_with: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn last_request(&self) -> Option<MediaConstraints> {
        self.requests.lock().last().cloned()
    }
}

#[async_trait]
impl MediaDevices for FakeDevices {
    fn supported_constraints(&self) -> SupportedConstraints {
        SupportedConstraints {
            facing_mode: self.facing_mode,
        }
    }

    async fn get_user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<MediaStream, DeviceError> {
        self.log.push("get_user_media");
        self.requests.lock().push(constraints.clone());
        if let Some(err) = self.deny_with.lock().clone() {
            return Err(err);
        }
        Ok(MediaStream::new(vec![MediaTrackInfo {
            id: "v0".to_string(),
            kind: TrackKind::Video,
            label: "Front Camera".to_string(),
        }]))
    }
}

/// Status sink keeping everything it is told
#[derive(Default)]
pub struct RecordingStatus {
    pub statuses: Mutex<Vec<String>>,
    pub titles: Mutex<Vec<String>>,
    pub statistics: Mutex<Vec<String>>,
    pub failures: Mutex<Vec<String>>,
}

impl StatusSink for RecordingStatus {
    fn update_from_event(&self, event: &PublisherEvent) {
        self.statuses.lock().push(event.status_text());
    }

    fn set_stream_title(&self, title: &str) {
        self.titles.lock().push(title.to_string());
    }

    fn set_statistics(&self, text: &str) {
        self.statistics.lock().push(text.to_string());
    }

    fn report_failure(&self, message: &str) {
        self.failures.lock().push(message.to_string());
    }
}

/// Everything a session test needs
pub struct Harness {
    pub log: CallLog,
    pub provider: Arc<FakeProvider>,
    pub devices: Arc<FakeDevices>,
    pub status: Arc<RecordingStatus>,
    pub livepub: LivePub,
}

impl Harness {
    pub fn new(testbed: &str) -> Self {
        Self::with_facing_mode(testbed, true)
    }

    pub fn with_facing_mode(testbed: &str, facing_mode: bool) -> Self {
        let log = CallLog::default();
        let provider = Arc::new(FakeProvider::new(log.clone()));
        let devices = Arc::new(FakeDevices::new(log.clone(), facing_mode));
        let store = MemoryStore::new().with_item("r5proTestBed", testbed);
        let livepub = LivePub::from_store(provider.clone(), devices.clone(), &store);
        Self {
            log,
            provider,
            devices,
            status: Arc::new(RecordingStatus::default()),
            livepub,
        }
    }

    pub fn session(&self, variant: SessionVariant) -> SessionController {
        self.livepub
            .session(variant)
            .status_sink(self.status.clone())
            .build()
    }
}
