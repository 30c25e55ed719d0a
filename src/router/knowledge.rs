use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::{Domain, RoutedPayload, ScoredCandidate, Scorer};
use crate::knowledge::KnowledgeBase;

/// Delegates to the knowledge-base collaborator and surfaces its best-match
/// score. A collaborator error degrades to a zero score; it never fails
/// the routing pass.
pub struct KnowledgeScorer {
    kb: Arc<dyn KnowledgeBase>,
    threshold: f32,
}

impl KnowledgeScorer {
    pub fn new(kb: Arc<dyn KnowledgeBase>, threshold: f32) -> Self {
        Self { kb, threshold }
    }
}

#[async_trait]
impl Scorer for KnowledgeScorer {
    fn domain(&self) -> Domain {
        Domain::Knowledge
    }

    fn threshold(&self) -> f32 {
        self.threshold
    }

    async fn score(&self, text: &str) -> ScoredCandidate {
        let (score, answer, matched_query) = match self.kb.query(text).await {
            Ok(Some(m)) => (m.score.clamp(0.0, 1.0), m.answer, m.matched_query),
            Ok(None) => (0.0, String::new(), String::new()),
            Err(e) => {
                warn!(error = %e, "knowledge lookup failed");
                (0.0, String::new(), String::new())
            }
        };
        ScoredCandidate {
            domain: Domain::Knowledge,
            score,
            payload: RoutedPayload::Knowledge {
                answer,
                matched_query,
            },
        }
    }
}
