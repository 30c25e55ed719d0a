pub mod relay;
pub mod types;

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tracing::warn;

use crate::config::Config;
use crate::error::{Error, Result};
use relay::RelayTransport;
pub use types::{ActuationResult, DeviceAction, DeviceIntent, FleetAction};

/// Executes device commands against the relay controller.
///
/// The controller is the source of truth: state is re-read before every
/// mutation instead of cached, because relays can be flipped out-of-band.
/// Intents in a batch are independent; one failure never aborts siblings.
pub struct DeviceActuator {
    transport: Arc<dyn RelayTransport>,
    devices: HashMap<String, u8>,
}

impl DeviceActuator {
    pub fn new(config: &Config, transport: Arc<dyn RelayTransport>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            transport,
            devices: config
                .devices
                .iter()
                .map(|(name, relay)| (name.to_lowercase(), *relay))
                .collect(),
        })
    }

    /// Device names the actuator can resolve. The classifier derives its
    /// vocabulary from this, so every parseable name is guaranteed mapped.
    pub fn device_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.devices.keys().cloned().collect();
        names.sort();
        names
    }

    /// Batch execution. Always returns one result per intent, in order.
    pub async fn execute(&self, intents: &[DeviceIntent]) -> Vec<ActuationResult> {
        let mut results = Vec::with_capacity(intents.len());
        for intent in intents {
            results.push(self.execute_one(intent).await);
        }
        results
    }

    /// Single-intent convenience path.
    pub async fn execute_one(&self, intent: &DeviceIntent) -> ActuationResult {
        let mut result = ActuationResult::new(&intent.device, intent.action);

        let relay = match self.devices.get(&intent.device.to_lowercase()) {
            Some(r) => *r,
            None => {
                result.error = Some(Error::Config(format!(
                    "unknown device '{}'",
                    intent.device
                )));
                result.skipped = true;
                return result;
            }
        };

        // Pre-state read. A failed read is noted but does not block the
        // write; idempotency just cannot be applied without it.
        let pre = match self.transport.status().await {
            Ok(states) => Some(states.is_on(relay)),
            Err(e) => {
                warn!(device = %intent.device, error = %e, "pre-state read failed");
                None
            }
        };
        result.pre_state = pre;

        match intent.action {
            DeviceAction::Status => {
                result.post_state = pre;
                result.skipped = true;
                if pre.is_none() {
                    result.error = Some(Error::TransientNetwork(
                        "status read failed".to_string(),
                    ));
                }
            }
            DeviceAction::On | DeviceAction::Off => {
                let want = intent.action.desired_state().unwrap_or(false);
                if pre == Some(want) {
                    // Already in the requested state: no write at all.
                    result.post_state = pre;
                    result.skipped = true;
                    return result;
                }
                match self.transport.set(relay, want).await {
                    Ok(code) => {
                        result.http_status = Some(code);
                        self.read_post_state(relay, &mut result).await;
                    }
                    Err(e) => result.error = Some(e),
                }
            }
            DeviceAction::Toggle => match self.transport.toggle(relay).await {
                Ok(code) => {
                    result.http_status = Some(code);
                    self.read_post_state(relay, &mut result).await;
                }
                Err(e) => result.error = Some(e),
            },
        }

        result
    }

    /// Whole-fleet verb: one status read, at most one scene write, one
    /// result per mapped device name. Devices already in the requested
    /// state report `skipped` with pre == post.
    pub async fn execute_fleet(&self, action: FleetAction) -> Vec<ActuationResult> {
        let pre = self.transport.status().await;
        if let Err(e) = &pre {
            warn!(error = %e, "fleet pre-state read failed");
        }

        let per_device_action = match action {
            FleetAction::AllOn => DeviceAction::On,
            FleetAction::AllOff => DeviceAction::Off,
            FleetAction::Status => DeviceAction::Status,
        };

        let names = self.device_names();

        if action == FleetAction::Status {
            return names
                .iter()
                .map(|name| {
                    let relay = self.devices[name];
                    let mut r = ActuationResult::new(name, DeviceAction::Status);
                    r.skipped = true;
                    match &pre {
                        Ok(states) => {
                            r.pre_state = Some(states.is_on(relay));
                            r.post_state = r.pre_state;
                        }
                        Err(e) => r.error = Some(e.clone()),
                    }
                    r
                })
                .collect();
        }

        let want = per_device_action.desired_state().unwrap_or(false);

        // Idempotency across the fleet: skip the scene write entirely when
        // every mapped relay already holds the requested state. Unmapped
        // relay channels are not ours to reason about.
        if let Ok(states) = &pre {
            let mapped: BTreeSet<u8> = self.devices.values().copied().collect();
            if mapped.iter().all(|r| states.is_on(*r) == want) {
                return names
                    .iter()
                    .map(|name| {
                        let mut r = ActuationResult::new(name, per_device_action);
                        r.pre_state = Some(states.is_on(self.devices[name]));
                        r.post_state = r.pre_state;
                        r.skipped = true;
                        r
                    })
                    .collect();
            }
        }

        let write = self.transport.scene(want).await;
        let post = match &write {
            Ok(_) => match self.transport.status().await {
                Ok(states) => Some(states),
                Err(e) => {
                    warn!(error = %e, "fleet post-state read failed");
                    None
                }
            },
            Err(_) => None,
        };

        names
            .iter()
            .map(|name| {
                let relay = self.devices[name];
                let mut r = ActuationResult::new(name, per_device_action);
                r.pre_state = pre.as_ref().ok().map(|s| s.is_on(relay));
                match &write {
                    Ok(code) => {
                        // A relay already in the requested state was a
                        // per-device no-op even though the scene call ran.
                        if r.pre_state == Some(want) {
                            r.skipped = true;
                            r.post_state = r.pre_state;
                        } else {
                            r.http_status = Some(*code);
                            r.post_state = post.as_ref().map(|s| s.is_on(relay));
                        }
                    }
                    Err(e) => r.error = Some(e.clone()),
                }
                r
            })
            .collect()
    }

    async fn read_post_state(&self, relay: u8, result: &mut ActuationResult) {
        match self.transport.status().await {
            Ok(states) => result.post_state = Some(states.is_on(relay)),
            Err(e) => {
                warn!(error = %e, "post-state read failed");
                result.error = Some(e);
            }
        }
    }

    pub fn relay_index(&self, device: &str) -> Option<u8> {
        self.devices.get(&device.to_lowercase()).copied()
    }
}
