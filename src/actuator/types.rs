use serde::{Deserialize, Serialize};

use crate::error::Error;

/// What the user asked a single device to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceAction {
    On,
    Off,
    Toggle,
    Status,
}

impl DeviceAction {
    /// The relay state this action demands, when it demands one.
    /// Toggle and Status have no target state.
    pub fn desired_state(&self) -> Option<bool> {
        match self {
            DeviceAction::On => Some(true),
            DeviceAction::Off => Some(false),
            DeviceAction::Toggle | DeviceAction::Status => None,
        }
    }
}

/// One structured device command. Compound utterances produce several.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceIntent {
    pub device: String,
    pub action: DeviceAction,
    /// Optional 0-100 level spoken alongside a single-device command
    /// ("set the lamp to 30%"). Carried through for callers; the relay
    /// protocol itself is binary.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub level: Option<u8>,
}

impl DeviceIntent {
    pub fn new(device: &str, action: DeviceAction) -> Self {
        Self {
            device: device.to_string(),
            action,
            level: None,
        }
    }
}

/// Whole-fleet verbs addressing every mapped relay in one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FleetAction {
    AllOn,
    AllOff,
    Status,
}

/// Outcome of one intent. Batch calls return one of these per intent no
/// matter what happened to its siblings.
#[derive(Debug, Clone, Serialize)]
pub struct ActuationResult {
    pub device: String,
    pub action: DeviceAction,
    pub pre_state: Option<bool>,
    pub post_state: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Error>,
    pub skipped: bool,
}

impl ActuationResult {
    pub fn new(device: &str, action: DeviceAction) -> Self {
        Self {
            device: device.to_string(),
            action,
            pre_state: None,
            post_state: None,
            http_status: None,
            error: None,
            skipped: false,
        }
    }

    pub fn ok(&self) -> bool {
        self.error.is_none()
    }
}
