use async_trait::async_trait;

use super::{Domain, RoutedPayload, ScoredCandidate, Scorer};
use crate::actuator::{DeviceAction, DeviceIntent};

/// Score when at least one complete device+action pair parsed.
const SCORE_COMPLETE: f32 = 0.95;
/// Device mentioned but no resolvable action.
const SCORE_DEVICE_ONLY: f32 = 0.6;
/// No device vocabulary at all.
const SCORE_NONE: f32 = 0.1;

/// Detects device vocabulary plus action vocabulary, including compound
/// commands ("turn on the light and the fan"). Vocabulary comes from the
/// actuator's device map, so every name this scorer can emit is mapped.
pub struct DeviceScorer {
    /// Device phrases as token sequences, longest first, so "desk light"
    /// wins over "light" at the same position.
    vocab: Vec<Vec<String>>,
    threshold: f32,
}

#[derive(Debug, Default)]
struct ParseOutcome {
    intents: Vec<DeviceIntent>,
    device_seen: bool,
}

impl DeviceScorer {
    pub fn new(device_names: Vec<String>, threshold: f32) -> Self {
        let mut vocab: Vec<Vec<String>> = device_names
            .iter()
            .map(|name| name.split_whitespace().map(str::to_string).collect())
            .collect();
        vocab.sort_by(|a, b| {
            b.len()
                .cmp(&a.len())
                .then(b.join(" ").len().cmp(&a.join(" ").len()))
        });
        Self { vocab, threshold }
    }

    fn normalize(text: &str) -> Vec<String> {
        text.to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '%' { c } else { ' ' })
            .collect::<String>()
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    fn detect_action(tokens: &[String]) -> Option<DeviceAction> {
        // "off" checked first so "switch off" never reads as a toggle.
        if tokens.iter().any(|t| t == "off") {
            return Some(DeviceAction::Off);
        }
        if tokens.iter().any(|t| t == "on") {
            return Some(DeviceAction::On);
        }
        if tokens.iter().any(|t| t == "toggle" || t == "switch") {
            return Some(DeviceAction::Toggle);
        }
        if tokens.iter().any(|t| t == "status") {
            return Some(DeviceAction::Status);
        }
        None
    }

    /// Longest-phrase-first left-to-right scan. Matched tokens are
    /// consumed, so a two-word device never also yields its one-word
    /// substring.
    fn detect_devices(&self, tokens: &[String]) -> Vec<String> {
        let mut found = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            let mut matched = false;
            for phrase in &self.vocab {
                if tokens[i..].len() >= phrase.len()
                    && tokens[i..i + phrase.len()] == phrase[..]
                {
                    let name = phrase.join(" ");
                    if !found.contains(&name) {
                        found.push(name);
                    }
                    i += phrase.len();
                    matched = true;
                    break;
                }
            }
            if !matched {
                i += 1;
            }
        }
        found
    }

    /// A level is only a level when it is anchored: a `%` suffix, or a
    /// preceding "set"/"to". A bare number ("back in 5") is not one.
    fn detect_level(tokens: &[String]) -> Option<u8> {
        tokens.iter().enumerate().find_map(|(i, t)| {
            let (digits, percent) = match t.strip_suffix('%') {
                Some(d) => (d, true),
                None => (t.as_str(), false),
            };
            if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            let anchored = percent
                || i.checked_sub(1)
                    .map(|p| tokens[p] == "set" || tokens[p] == "to")
                    .unwrap_or(false);
            if !anchored {
                return None;
            }
            digits.parse::<u8>().ok().filter(|v| *v <= 100)
        })
    }

    /// Compound parse: split on "and", parse each clause independently,
    /// carry the action forward into clauses that omit one.
    fn parse(&self, text: &str) -> ParseOutcome {
        let tokens = Self::normalize(text);
        let clauses: Vec<&[String]> = tokens.split(|t| t == "and").collect();

        let mut outcome = ParseOutcome::default();
        let mut carried: Option<DeviceAction> = None;

        for clause in clauses {
            let explicit = Self::detect_action(clause);
            let devices = self.detect_devices(clause);
            if explicit.is_some() {
                carried = explicit;
            }
            if devices.is_empty() {
                // Action-only clause ("and turn off"): just updates carry.
                continue;
            }
            outcome.device_seen = true;
            if let Some(action) = explicit.or(carried) {
                for device in devices {
                    outcome.intents.push(DeviceIntent::new(&device, action));
                }
            }
        }

        // A spoken percentage only makes sense on a single-device command.
        if outcome.intents.len() == 1 {
            outcome.intents[0].level = Self::detect_level(&tokens);
        }

        outcome
    }
}

#[async_trait]
impl Scorer for DeviceScorer {
    fn domain(&self) -> Domain {
        Domain::DeviceControl
    }

    fn threshold(&self) -> f32 {
        self.threshold
    }

    async fn score(&self, text: &str) -> ScoredCandidate {
        let outcome = self.parse(text);
        let score = if !outcome.intents.is_empty() {
            SCORE_COMPLETE
        } else if outcome.device_seen {
            SCORE_DEVICE_ONLY
        } else {
            SCORE_NONE
        };
        ScoredCandidate {
            domain: Domain::DeviceControl,
            score,
            payload: RoutedPayload::Device {
                intents: outcome.intents,
                results: Vec::new(),
            },
        }
    }
}
