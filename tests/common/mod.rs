#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use alira::actuator::relay::{RelayStates, RelayTransport};
use alira::config::RELAY_COUNT;
use alira::error::{Error, Result};

/// In-memory relay controller. Holds the bitmask, counts every wire call,
/// and can be told to fail writes against specific relays.
pub struct FakeRelay {
    state: Mutex<u8>,
    fail_relays: HashSet<u8>,
    pub status_calls: AtomicUsize,
    pub set_calls: AtomicUsize,
    pub toggle_calls: AtomicUsize,
    pub scene_calls: AtomicUsize,
}

impl FakeRelay {
    pub fn with_state(bitmask: u8) -> Self {
        Self {
            state: Mutex::new(bitmask),
            fail_relays: HashSet::new(),
            status_calls: AtomicUsize::new(0),
            set_calls: AtomicUsize::new(0),
            toggle_calls: AtomicUsize::new(0),
            scene_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(bitmask: u8, relays: &[u8]) -> Self {
        let mut fake = Self::with_state(bitmask);
        fake.fail_relays = relays.iter().copied().collect();
        fake
    }

    pub fn bitmask(&self) -> u8 {
        *self.state.lock().unwrap()
    }

    pub fn writes(&self) -> usize {
        self.set_calls.load(Ordering::SeqCst)
            + self.toggle_calls.load(Ordering::SeqCst)
            + self.scene_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RelayTransport for FakeRelay {
    async fn status(&self) -> Result<RelayStates> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        Ok(RelayStates {
            bitmask: *self.state.lock().unwrap(),
        })
    }

    async fn set(&self, relay: u8, on: bool) -> Result<u16> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_relays.contains(&relay) {
            return Err(Error::TransientNetwork(
                "connection reset by relay".to_string(),
            ));
        }
        let mut state = self.state.lock().unwrap();
        if on {
            *state |= 1 << relay;
        } else {
            *state &= !(1 << relay);
        }
        Ok(200)
    }

    async fn toggle(&self, relay: u8) -> Result<u16> {
        self.toggle_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_relays.contains(&relay) {
            return Err(Error::TransientNetwork(
                "connection reset by relay".to_string(),
            ));
        }
        *self.state.lock().unwrap() ^= 1 << relay;
        Ok(200)
    }

    async fn scene(&self, on: bool) -> Result<u16> {
        self.scene_calls.fetch_add(1, Ordering::SeqCst);
        let mask = if on { (1u8 << RELAY_COUNT) - 1 } else { 0 };
        *self.state.lock().unwrap() = mask;
        Ok(200)
    }
}
