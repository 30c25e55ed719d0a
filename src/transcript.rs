use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

use crate::error::{Error, Result};

/// Capability boundary to the external speech collaborator. The core never
/// depends on how recognition happens; it only waits (bounded) for text.
///
/// `Ok(None)` and `Err(Error::CaptureTimeout)` both mean "nothing captured
/// this window"; the processing loop treats them identically.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn capture(&self, window: Duration) -> Result<Option<String>>;
}

/// Line-oriented stdin transcript, standing in for the speech collaborator
/// when running the binary by hand.
pub struct StdinTranscript {
    lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl StdinTranscript {
    pub fn new() -> Self {
        Self {
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }
}

impl Default for StdinTranscript {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptSource for StdinTranscript {
    async fn capture(&self, window: Duration) -> Result<Option<String>> {
        let mut lines = self.lines.lock().await;
        match tokio::time::timeout(window, lines.next_line()).await {
            Ok(Ok(Some(line))) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(line))
                }
            }
            Ok(Ok(None)) => Ok(None),
            Ok(Err(e)) => Err(Error::Parse(format!("stdin read failed: {e}"))),
            Err(_) => Err(Error::CaptureTimeout),
        }
    }
}
