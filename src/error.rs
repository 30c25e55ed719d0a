use serde::Serialize;
use thiserror::Error;

/// Runtime failure taxonomy for the command core.
///
/// `Clone` because transient actuation failures are embedded per-intent in
/// `ActuationResult` rather than aborting a batch. Session expiry is NOT an
/// error: the processing loop observes the flag at loop top and simply stops
/// iterating.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum Error {
    /// Connection/timeout failure against the relay controller after the
    /// retry budget is exhausted.
    #[error("transient network error: {0}")]
    TransientNetwork(String),

    /// Unknown device name, bad relay index, or otherwise broken wiring.
    /// Rejected before any network call is made.
    #[error("config error: {0}")]
    Config(String),

    /// Malformed or empty perception event. Logged and dropped by the
    /// consumer; never touches session state.
    #[error("malformed perception event: {0}")]
    Parse(String),

    /// No transcript arrived within the capture window. Treated as
    /// "no command this cycle" by the processing loop.
    #[error("no transcript captured within the window")]
    CaptureTimeout,
}

pub type Result<T> = std::result::Result<T, Error>;
