//! Outgoing bitrate sampling
//!
//! Polls the publisher's peer connection on a fixed interval and turns the
//! cumulative outbound RTP counters into a bitrate. The first poll only
//! records a baseline; every later poll yields one sample.

use chrono::{DateTime, Utc};
use livepub_core::{OutboundRtpStats, PeerConnection};
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Bitrate tracker configuration
#[derive(Debug, Clone)]
pub struct BitrateTrackerConfig {
    /// Time between two stats polls
    pub interval: Duration,
}

impl Default for BitrateTrackerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
        }
    }
}

/// One bitrate measurement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BitrateSample {
    /// Outgoing bitrate in kbit/s over the last interval
    pub kbps: f64,
    /// Total packets sent so far
    pub packets_sent: u64,
    /// When the sample was taken
    pub captured_at: DateTime<Utc>,
}

impl fmt::Display for BitrateSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Bitrate: {}. Packets Sent: {}.",
            self.kbps.floor() as i64,
            self.packets_sent
        )
    }
}

/// Bitrate in kbit/s between two reports.
///
/// `None` when the reports are not strictly ordered in time.
pub fn compute_bitrate(previous: &OutboundRtpStats, current: &OutboundRtpStats) -> Option<f64> {
    let elapsed_ms = current.timestamp_ms - previous.timestamp_ms;
    if elapsed_ms <= 0.0 {
        return None;
    }
    let bytes = current.bytes_sent.saturating_sub(previous.bytes_sent);
    Some(8.0 * bytes as f64 / elapsed_ms)
}

/// Periodic sampler bound to at most one peer connection at a time
#[derive(Debug, Default)]
pub struct BitrateTracker {
    config: BitrateTrackerConfig,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl BitrateTracker {
    /// Create a tracker with the default one second interval
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tracker with custom configuration
    pub fn with_config(config: BitrateTrackerConfig) -> Self {
        Self {
            config,
            task: Mutex::new(None),
        }
    }

    /// Start sampling `connection`, replacing any previous sampler.
    ///
    /// Must be called from within a tokio runtime.
    pub fn track<F>(&self, connection: Arc<dyn PeerConnection>, mut on_sample: F)
    where
        F: FnMut(BitrateSample) + Send + 'static,
    {
        self.untrack();

        let period = self.config.interval;
        debug!("Starting bitrate tracking every {:?}", period);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately
            ticker.tick().await;

            let mut last: Option<OutboundRtpStats> = None;
            loop {
                ticker.tick().await;
                match connection.outbound_stats().await {
                    Ok(Some(current)) => {
                        if let Some(kbps) = last.and_then(|prev| compute_bitrate(&prev, &current)) {
                            on_sample(BitrateSample {
                                kbps,
                                packets_sent: current.packets_sent,
                                captured_at: Utc::now(),
                            });
                        }
                        last = Some(current);
                    }
                    Ok(None) => debug!("No outbound RTP report yet"),
                    Err(fault) => warn!("Could not read outbound stats: {}", fault),
                }
            }
        });

        *self.task.lock() = Some(handle);
    }

    /// Stop sampling; no-op when not tracking
    pub fn untrack(&self) {
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
            debug!("Stopped bitrate tracking");
        }
    }

    /// Whether a sampler is running
    pub fn is_tracking(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for BitrateTracker {
    fn drop(&mut self) {
        self.untrack();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use livepub_core::ProviderFault;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Sends 125 000 bytes and 100 packets per second
    struct SteadyConnection {
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

    fn steady() -> Arc<SteadyConnection> {
        Arc::new(SteadyConnection {
            polls: AtomicU64::new(0),
        })
    }

    #[test]
    fn test_compute_bitrate() {
        let previous = OutboundRtpStats {
            bytes_sent: 0,
            packets_sent: 0,
            timestamp_ms: 1000.0,
        };
        let current = OutboundRtpStats {
            bytes_sent: 250_000,
            packets_sent: 200,
            timestamp_ms: 3000.0,
        };
        assert_eq!(compute_bitrate(&previous, &current), Some(1000.0));
        assert_eq!(compute_bitrate(&current, &previous), None);
    }

    #[test]
    fn test_sample_display() {
        let sample = BitrateSample {
            kbps: 1234.98,
            packets_sent: 42,
            captured_at: Utc::now(),
        };
        assert_eq!(sample.to_string(), "Bitrate: 1234. Packets Sent: 42.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_poll_is_baseline() {
        let tracker = BitrateTracker::new();
        let samples = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&samples);
        tracker.track(steady(), move |sample| sink.lock().push(sample));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(samples.lock().is_empty());

        tokio::time::sleep(Duration::from_millis(2000)).await;
        let samples = samples.lock();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].kbps, 1000.0);
        assert_eq!(samples[1].packets_sent, 300);
    }

    #[tokio::test(start_paused = true)]
    async fn test_untrack_stops_sampling() {
        let tracker = BitrateTracker::new();
        let samples = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&samples);
        tracker.track(steady(), move |sample| sink.lock().push(sample));
        assert!(tracker.is_tracking());

        tokio::time::sleep(Duration::from_millis(2500)).await;
        tracker.untrack();
        assert!(!tracker.is_tracking());
        let seen = samples.lock().len();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(samples.lock().len(), seen);

        // Untracking twice is harmless
        tracker.untrack();
    }

    #[tokio::test(start_paused = true)]
    async fn test_retrack_replaces_previous_sampler() {
        let tracker = BitrateTracker::new();
        let first = Arc::new(Mutex::new(0usize));
        let second = Arc::new(Mutex::new(0usize));

        let counter = Arc::clone(&first);
        tracker.track(steady(), move |_| *counter.lock() += 1);
        tokio::time::sleep(Duration::from_millis(2500)).await;
        let first_count = *first.lock();
        assert_eq!(first_count, 1);

        let counter = Arc::clone(&second);
        tracker.track(steady(), move |_| *counter.lock() += 1);
        tokio::time::sleep(Duration::from_millis(3500)).await;

        assert_eq!(*first.lock(), first_count);
        assert_eq!(*second.lock(), 2);
    }
}
