use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::bus::SessionHandle;
use crate::event::{DetectionEvent, PresenceEvent};

/// Sole writer of session state. Consumes presence events to open/extend a
/// session; a separate watchdog poll closes it on timeout.
pub struct SessionMonitor {
    session: SessionHandle,
    target_subject: String,
    timeout: Duration,
    poll_interval: Duration,
}

impl SessionMonitor {
    pub fn new(
        session: SessionHandle,
        target_subject: &str,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            session,
            target_subject: target_subject.to_lowercase(),
            timeout,
            poll_interval,
        }
    }

    /// Presence consumer. Events are handled in arrival order; only the
    /// configured target drives activation, everything else is ignored.
    /// Runs until the channel closes.
    pub async fn run_consumer(&self, mut presence_rx: mpsc::UnboundedReceiver<PresenceEvent>) {
        while let Some(event) = presence_rx.recv().await {
            self.observe(&event);
        }
        info!("presence channel closed; session consumer exiting");
    }

    /// Apply one presence event to session state.
    pub fn observe(&self, event: &PresenceEvent) {
        if event.subject.to_lowercase() != self.target_subject {
            debug!(subject = %event.subject, "ignoring non-target presence");
            return;
        }
        if self.session.mark_seen(event.observed_at) {
            info!(
                subject = %event.subject,
                confidence = event.confidence,
                "session opened"
            );
        } else {
            debug!(subject = %event.subject, "session refreshed");
        }
    }

    /// Timeout watchdog. A fixed-interval poll rather than a re-armed
    /// timer: presence bursts extend the deadline without any rescheduling.
    /// Runs forever.
    pub async fn run_watchdog(&self) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if self.poll_once(Instant::now()) {
                info!(timeout_s = self.timeout.as_secs(), "session ended (timeout)");
            }
        }
    }

    /// One watchdog step; returns true only on the Active -> Idle
    /// transition. Split out so tests can drive time explicitly.
    pub fn poll_once(&self, now: Instant) -> bool {
        self.session.expire_if_timed_out(now, self.timeout)
    }

    /// Drain ambient detections. They carry no session semantics; we trace
    /// them while a session is active and drop them otherwise.
    pub async fn run_detection_drain(
        &self,
        mut detection_rx: mpsc::UnboundedReceiver<DetectionEvent>,
    ) {
        while let Some(det) = detection_rx.recv().await {
            if self.session.is_active() {
                debug!(label = %det.label, confidence = det.confidence, "detection");
            }
        }
        warn!("detection channel closed; drain exiting");
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }
}
