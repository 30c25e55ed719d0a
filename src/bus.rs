use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, Notify};

use crate::event::{DetectionEvent, PresenceEvent};

/// The singleton session record. Exclusively mutated by the SessionMonitor;
/// everyone else reads snapshots.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionState {
    pub active: bool,
    pub last_seen: Option<Instant>,
}

/// Cloneable read handle over [`SessionState`]. Mutators are crate-private
/// so the monitor stays the single writer. The inner lock is never held
/// across an await.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<RwLock<SessionState>>,
    activated: Arc<Notify>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(SessionState::default())),
            activated: Arc::new(Notify::new()),
        }
    }

    pub fn is_active(&self) -> bool {
        self.inner.read().expect("session lock poisoned").active
    }

    pub fn snapshot(&self) -> SessionState {
        *self.inner.read().expect("session lock poisoned")
    }

    /// Suspend until the session is (or becomes) active.
    pub async fn wait_active(&self) {
        loop {
            // Register interest before checking, so an activation between
            // the check and the await is not lost.
            let notified = self.activated.notified();
            if self.is_active() {
                return;
            }
            notified.await;
        }
    }

    /// Record a confirmed sighting of the target. Returns true on the
    /// Idle -> Active transition, false on a refresh.
    pub(crate) fn mark_seen(&self, at: Instant) -> bool {
        let mut state = self.inner.write().expect("session lock poisoned");
        state.last_seen = Some(at);
        let transitioned = !state.active;
        state.active = true;
        drop(state);
        if transitioned {
            self.activated.notify_waiters();
        }
        transitioned
    }

    /// Timeout poll. Flips Active -> Idle when the deadline has passed;
    /// returns true only on the transition so the caller logs it once.
    pub(crate) fn expire_if_timed_out(&self, now: Instant, timeout: Duration) -> bool {
        let mut state = self.inner.write().expect("session lock poisoned");
        if !state.active {
            return false;
        }
        match state.last_seen {
            Some(seen) if now.duration_since(seen) >= timeout => {
                state.active = false;
                true
            }
            // Active without a sighting cannot happen via mark_seen; treat
            // it as expired rather than active forever.
            None => {
                state.active = false;
                true
            }
            Some(_) => false,
        }
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiver halves of the two perception channels, handed to the tasks
/// that consume them.
pub struct BusReceivers {
    pub presence_rx: mpsc::UnboundedReceiver<PresenceEvent>,
    pub detection_rx: mpsc::UnboundedReceiver<DetectionEvent>,
}

/// Process-wide shared state: the two event channels plus the session
/// handle. Pure data and synchronization, no logic.
#[derive(Clone)]
pub struct EventBus {
    pub presence_tx: mpsc::UnboundedSender<PresenceEvent>,
    pub detection_tx: mpsc::UnboundedSender<DetectionEvent>,
    pub session: SessionHandle,
}

impl EventBus {
    pub fn new() -> (Self, BusReceivers) {
        let (presence_tx, presence_rx) = mpsc::unbounded_channel();
        let (detection_tx, detection_rx) = mpsc::unbounded_channel();
        (
            Self {
                presence_tx,
                detection_tx,
                session: SessionHandle::new(),
            },
            BusReceivers {
                presence_rx,
                detection_rx,
            },
        )
    }
}
