pub mod device;
pub mod fallback;
pub mod knowledge;
pub mod macros;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::actuator::{ActuationResult, DeviceActuator, DeviceIntent};
use crate::config::Config;
use crate::knowledge::KnowledgeBase;

pub use device::DeviceScorer;
pub use fallback::FallbackScorer;
pub use knowledge::KnowledgeScorer;
pub use macros::MacroScorer;

/// The four intent domains, in routing priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    DeviceControl,
    Knowledge,
    Macro,
    Fallback,
}

/// Tagged payload for a routed decision. Each domain carries its own
/// structured data; there are no ad hoc key lookups downstream.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoutedPayload {
    Device {
        intents: Vec<DeviceIntent>,
        /// Filled by the router when the device route wins; empty in the
        /// raw scorer candidate.
        results: Vec<ActuationResult>,
    },
    Knowledge {
        answer: String,
        matched_query: String,
    },
    Macro {
        name: String,
    },
    Fallback {
        reason: String,
    },
}

/// Raw score of every scorer, always reported for observability regardless
/// of which domain won.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RouterScores {
    pub device_control: f32,
    pub knowledge: f32,
    #[serde(rename = "macro")]
    pub macros: f32,
    pub fallback: f32,
}

impl RouterScores {
    fn record(&mut self, domain: Domain, score: f32) {
        match domain {
            Domain::DeviceControl => self.device_control = score,
            Domain::Knowledge => self.knowledge = score,
            Domain::Macro => self.macros = score,
            Domain::Fallback => self.fallback = score,
        }
    }
}

/// One scorer's verdict for an utterance.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub domain: Domain,
    pub score: f32,
    pub payload: RoutedPayload,
}

/// A classification unit for one intent domain. Scorers are independent;
/// the router owns priority and thresholds.
#[async_trait]
pub trait Scorer: Send + Sync {
    fn domain(&self) -> Domain;
    fn threshold(&self) -> f32;
    async fn score(&self, text: &str) -> ScoredCandidate;
}

/// A fully routed utterance.
#[derive(Debug, Clone, Serialize)]
pub struct Decision {
    pub domain: Domain,
    pub payload: RoutedPayload,
    pub scores: RouterScores,
}

/// Runs the fixed, priority-ordered scorer ensemble and picks exactly one
/// domain per utterance. Never fails: the fallback scorer is always
/// routable, so every text resolves to *a* decision.
pub struct IntentRouter {
    scorers: Vec<Box<dyn Scorer>>,
    actuator: Arc<DeviceActuator>,
}

impl IntentRouter {
    /// Standard ensemble. Priority is construction order: device control,
    /// knowledge, macro, fallback. Adding a domain means appending here.
    pub fn from_config(
        config: &Config,
        actuator: Arc<DeviceActuator>,
        kb: Arc<dyn KnowledgeBase>,
    ) -> Self {
        let scorers: Vec<Box<dyn Scorer>> = vec![
            Box::new(DeviceScorer::new(
                actuator.device_names(),
                config.thresholds.device_control,
            )),
            Box::new(KnowledgeScorer::new(kb, config.thresholds.knowledge)),
            Box::new(MacroScorer::new(
                config.macro_keywords.clone(),
                config.thresholds.macros,
            )),
            Box::new(FallbackScorer::new()),
        ];
        Self { scorers, actuator }
    }

    /// Classify one utterance and, when the device domain wins, actuate
    /// inline. Device control is the only side-effecting route; every
    /// other domain hands its payload back to the caller untouched.
    pub async fn decide(&self, text: &str) -> Decision {
        let mut candidates = Vec::with_capacity(self.scorers.len());
        let mut scores = RouterScores::default();
        for scorer in &self.scorers {
            let candidate = scorer.score(text).await;
            scores.record(candidate.domain, candidate.score);
            candidates.push((scorer.threshold(), candidate));
        }
        debug!(?scores, text, "scored");

        for (threshold, candidate) in candidates {
            if candidate.score < threshold {
                continue;
            }
            let payload = match candidate.payload {
                RoutedPayload::Device { intents, .. } => {
                    let results = self.actuator.execute(&intents).await;
                    RoutedPayload::Device { intents, results }
                }
                other => other,
            };
            return Decision {
                domain: candidate.domain,
                payload,
                scores,
            };
        }

        // Unreachable while the fallback scorer has no threshold; kept so
        // the routing stays total even if the ensemble is reconfigured.
        Decision {
            domain: Domain::Fallback,
            payload: RoutedPayload::Fallback {
                reason: "unclassified".to_string(),
            },
            scores,
        }
    }
}
