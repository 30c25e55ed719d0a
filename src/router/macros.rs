use async_trait::async_trait;

use super::{Domain, RoutedPayload, ScoredCandidate, Scorer};

const SCORE_HIT: f32 = 0.90;
const SCORE_MISS: f32 = 0.10;

/// Fixed-keyword macro detection: a substring hit on any configured
/// keyword scores high, everything else low.
pub struct MacroScorer {
    keywords: Vec<String>,
    threshold: f32,
}

impl MacroScorer {
    pub fn new(keywords: Vec<String>, threshold: f32) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            threshold,
        }
    }
}

#[async_trait]
impl Scorer for MacroScorer {
    fn domain(&self) -> Domain {
        Domain::Macro
    }

    fn threshold(&self) -> f32 {
        self.threshold
    }

    async fn score(&self, text: &str) -> ScoredCandidate {
        let lowered = text.to_lowercase();
        let hit = self.keywords.iter().find(|k| lowered.contains(k.as_str()));
        let (score, name) = match hit {
            Some(k) => (SCORE_HIT, k.clone()),
            None => (SCORE_MISS, String::new()),
        };
        ScoredCandidate {
            domain: Domain::Macro,
            score,
            payload: RoutedPayload::Macro { name },
        }
    }
}
