use async_trait::async_trait;

use super::{Domain, RoutedPayload, ScoredCandidate, Scorer};

/// Phrases that suggest an abstract request needing open-ended handling.
const ABSTRACT_PHRASES: [&str; 5] = [
    "make it better",
    "plan my",
    "explain",
    "summarize",
    "comfortable",
];

const SCORE_ABSTRACT: f32 = 0.80;
const SCORE_DEFAULT: f32 = 0.20;

/// Terminal scorer. Has no threshold, so every utterance that nothing
/// else claims lands here; the router never fails to classify.
pub struct FallbackScorer;

impl FallbackScorer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FallbackScorer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Scorer for FallbackScorer {
    fn domain(&self) -> Domain {
        Domain::Fallback
    }

    fn threshold(&self) -> f32 {
        0.0
    }

    async fn score(&self, text: &str) -> ScoredCandidate {
        let lowered = text.to_lowercase();
        let abstract_hit = ABSTRACT_PHRASES.iter().any(|p| lowered.contains(p));
        let (score, reason) = if abstract_hit {
            (SCORE_ABSTRACT, "abstract")
        } else {
            (SCORE_DEFAULT, "unclassified")
        };
        ScoredCandidate {
            domain: Domain::Fallback,
            score,
            payload: RoutedPayload::Fallback {
                reason: reason.to_string(),
            },
        }
    }
}
