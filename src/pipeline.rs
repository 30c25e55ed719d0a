use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::bus::SessionHandle;
use crate::error::Error;
use crate::router::{Decision, IntentRouter};
use crate::transcript::TranscriptSource;

/// Pause between capture cycles so the loop never spins.
const CYCLE_PACING: Duration = Duration::from_millis(100);
/// Pause after an unexpected cycle error before resuming.
const ERROR_BACKOFF: Duration = Duration::from_millis(200);

/// The active-session processing loop: transcript capture -> router ->
/// (inline) actuation. Session expiry is observed only at the top of each
/// iteration; an in-flight capture or actuation always completes.
pub struct CommandLoop {
    session: SessionHandle,
    router: IntentRouter,
    transcript: Arc<dyn TranscriptSource>,
    capture_window: Duration,
    /// Routed decisions are handed back to the caller here, untouched.
    decisions_tx: Option<mpsc::UnboundedSender<Decision>>,
}

impl CommandLoop {
    pub fn new(
        session: SessionHandle,
        router: IntentRouter,
        transcript: Arc<dyn TranscriptSource>,
        capture_window: Duration,
    ) -> Self {
        Self {
            session,
            router,
            transcript,
            capture_window,
            decisions_tx: None,
        }
    }

    /// Attach a sink that receives every routed decision.
    pub fn with_decision_sink(mut self, tx: mpsc::UnboundedSender<Decision>) -> Self {
        self.decisions_tx = Some(tx);
        self
    }

    /// Runs forever: park until a session opens, process while it stays
    /// active, park again. Any unexpected cycle error logs, backs off, and
    /// resumes rather than killing the task.
    pub async fn run(&self) {
        loop {
            self.session.wait_active().await;
            info!("session active; listening for commands");

            while self.session.is_active() {
                if let Err(e) = self.cycle().await {
                    warn!(error = %e, "command cycle failed");
                    tokio::time::sleep(ERROR_BACKOFF).await;
                }
                tokio::time::sleep(CYCLE_PACING).await;
            }

            info!("session idle; command loop parked");
        }
    }

    /// One capture-and-route cycle. A capture timeout is "no command this
    /// cycle", not an error.
    async fn cycle(&self) -> crate::error::Result<()> {
        let text = match self.transcript.capture(self.capture_window).await {
            Ok(Some(text)) => text,
            Ok(None) | Err(Error::CaptureTimeout) => {
                debug!("no transcript this cycle");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        info!(%text, "transcript captured");
        let decision = self.router.decide(&text).await;
        info!(
            domain = ?decision.domain,
            scores = ?decision.scores,
            "utterance routed"
        );

        if let Some(tx) = &self.decisions_tx {
            // A closed sink means the caller went away; nothing to do.
            let _ = tx.send(decision);
        }
        Ok(())
    }
}
