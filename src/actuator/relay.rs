use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Error, Result};

/// Snapshot of every relay channel, decoded from the controller's bitmask
/// reply. Bit i is relay i.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayStates {
    pub bitmask: u8,
}

impl RelayStates {
    pub fn is_on(&self, relay: u8) -> bool {
        (self.bitmask >> relay) & 1 == 1
    }

    /// The firmware replies with the bitmask as plain text, occasionally
    /// with trailing noise. Non-digit bytes are stripped, an empty reply
    /// decodes to all-off.
    pub fn parse(body: &str) -> Self {
        let digits: String = body.chars().filter(|c| c.is_ascii_digit()).collect();
        let bitmask = digits.parse::<u8>().unwrap_or(0);
        Self { bitmask }
    }
}

/// Wire seam to the relay controller. The production impl speaks the HTTP
/// firmware protocol; tests substitute a fake.
#[async_trait]
pub trait RelayTransport: Send + Sync {
    async fn status(&self) -> Result<RelayStates>;
    /// Returns the HTTP status code of the write.
    async fn set(&self, relay: u8, on: bool) -> Result<u16>;
    async fn toggle(&self, relay: u8) -> Result<u16>;
    async fn scene(&self, on: bool) -> Result<u16>;
}

/// HTTP transport: GET with query params against the controller base URL,
/// pooled connections, bounded per-request timeout, exponential backoff on
/// transient failures (connect/timeout errors and 429/5xx replies).
pub struct HttpRelay {
    client: Client,
    base_url: String,
    attempts: u32,
    base_delay: Duration,
}

impl HttpRelay {
    /// Fails only on client construction, which is a config-class problem
    /// and legitimately fatal at startup.
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| Error::Config(format!("http client construction: {e}")))?;
        Ok(Self {
            client,
            base_url: config.relay_base_url.clone(),
            attempts: config.retry_attempts.max(1),
            base_delay: config.retry_base_delay(),
        })
    }

    fn state_word(on: bool) -> &'static str {
        if on {
            "on"
        } else {
            "off"
        }
    }

    async fn call(&self, params: &[(&str, String)]) -> Result<reqwest::Response> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.client.get(&self.base_url).query(params).send().await {
                Ok(resp) => {
                    let code = resp.status();
                    let retryable = code.as_u16() == 429 || code.is_server_error();
                    if retryable && attempt < self.attempts {
                        warn!(%code, attempt, "relay replied retryable status");
                        self.backoff(attempt).await;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(e) => {
                    let transient = e.is_timeout() || e.is_connect() || e.is_request();
                    if transient && attempt < self.attempts {
                        debug!(error = %e, attempt, "relay call failed, retrying");
                        self.backoff(attempt).await;
                        continue;
                    }
                    return Err(Error::TransientNetwork(e.to_string()));
                }
            }
        }
    }

    async fn backoff(&self, attempt: u32) {
        let delay = self.base_delay * 2u32.saturating_pow(attempt - 1);
        tokio::time::sleep(delay).await;
    }
}

#[async_trait]
impl RelayTransport for HttpRelay {
    async fn status(&self) -> Result<RelayStates> {
        let resp = self.call(&[("action", "status".to_string())]).await?;
        let code = resp.status();
        if !code.is_success() {
            return Err(Error::TransientNetwork(format!(
                "status query returned {code}"
            )));
        }
        let body = resp
            .text()
            .await
            .map_err(|e| Error::TransientNetwork(e.to_string()))?;
        Ok(RelayStates::parse(&body))
    }

    async fn set(&self, relay: u8, on: bool) -> Result<u16> {
        let resp = self
            .call(&[
                ("action", "set".to_string()),
                ("relay", relay.to_string()),
                ("state", Self::state_word(on).to_string()),
            ])
            .await?;
        Ok(resp.status().as_u16())
    }

    async fn toggle(&self, relay: u8) -> Result<u16> {
        let resp = self
            .call(&[
                ("action", "toggle".to_string()),
                ("relay", relay.to_string()),
            ])
            .await?;
        Ok(resp.status().as_u16())
    }

    async fn scene(&self, on: bool) -> Result<u16> {
        let resp = self
            .call(&[
                ("action", "scene".to_string()),
                ("state", Self::state_word(on).to_string()),
            ])
            .await?;
        Ok(resp.status().as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitmask_decodes_per_relay() {
        let states = RelayStates::parse("5");
        assert!(states.is_on(0));
        assert!(!states.is_on(1));
        assert!(states.is_on(2));
        assert!(!states.is_on(3));
    }

    #[test]
    fn noisy_reply_is_stripped_to_digits() {
        assert_eq!(RelayStates::parse(" 12\r\n").bitmask, 12);
        assert_eq!(RelayStates::parse("mask=9;").bitmask, 9);
        assert_eq!(RelayStates::parse("").bitmask, 0);
    }

}
