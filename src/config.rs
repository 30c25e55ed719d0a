use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Number of relay channels on the remote controller.
pub const RELAY_COUNT: u8 = 4;

/// Independent routing thresholds, not a weighted vote. Fallback has none:
/// it is the terminal route.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub device_control: f32,
    pub knowledge: f32,
    pub macros: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            device_control: 0.85,
            knowledge: 0.10,
            macros: 0.75,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The one subject whose presence opens a session.
    pub target_subject: String,
    pub session_timeout_s: u64,
    pub watchdog_poll_ms: u64,
    /// Bounded wait for a transcript each processing cycle.
    pub capture_window_s: u64,

    /// Relay controller endpoint, HTTP on the local network.
    pub relay_base_url: String,
    pub request_timeout_ms: u64,
    pub retry_attempts: u32,
    pub retry_base_delay_ms: u64,

    /// Device name -> relay index. Synonyms may share a relay; every name
    /// the classifier accepts resolves through this map.
    pub devices: HashMap<String, u8>,
    pub macro_keywords: Vec<String>,
    pub thresholds: Thresholds,
}

impl Default for Config {
    fn default() -> Self {
        let devices = HashMap::from([
            ("switch1".to_string(), 0),
            ("lamp".to_string(), 0),
            ("bulb".to_string(), 1),
            ("light".to_string(), 2),
            ("desk light".to_string(), 2),
            ("switch2".to_string(), 3),
            ("fan".to_string(), 3),
        ]);
        Self {
            target_subject: "Rommel".to_string(),
            session_timeout_s: 30,
            watchdog_poll_ms: 500,
            capture_window_s: 5,
            relay_base_url: "http://192.168.10.100/api".to_string(),
            request_timeout_ms: 1500,
            retry_attempts: 3,
            retry_base_delay_ms: 100,
            devices,
            macro_keywords: vec!["focus".to_string(), "security".to_string()],
            thresholds: Thresholds::default(),
        }
    }
}

impl Config {
    /// Startup validation. Config problems are the only fatal class of
    /// error; everything at runtime degrades per-event instead.
    pub fn validate(&self) -> Result<()> {
        if self.devices.is_empty() {
            return Err(Error::Config("device map is empty".into()));
        }
        for (name, relay) in &self.devices {
            if *relay >= RELAY_COUNT {
                return Err(Error::Config(format!(
                    "device '{name}' maps to relay {relay}, controller has {RELAY_COUNT}"
                )));
            }
        }
        if self.target_subject.trim().is_empty() {
            return Err(Error::Config("target_subject is empty".into()));
        }
        Ok(())
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_s)
    }

    pub fn watchdog_poll(&self) -> Duration {
        Duration::from_millis(self.watchdog_poll_ms)
    }

    pub fn capture_window(&self) -> Duration {
        Duration::from_secs(self.capture_window_s)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}
