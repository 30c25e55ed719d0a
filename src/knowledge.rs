use async_trait::async_trait;
use serde::Serialize;

/// Best answer the knowledge collaborator found for a query.
#[derive(Debug, Clone, Serialize)]
pub struct KbMatch {
    pub answer: String,
    pub score: f32,
    pub matched_query: String,
}

/// Interface boundary to the knowledge-base collaborator. Ranking mechanics
/// (TF-IDF or otherwise) live entirely behind this trait; the router only
/// consumes the `(score, answer)` contract.
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    async fn query(&self, text: &str) -> anyhow::Result<Option<KbMatch>>;
}

/// In-memory question/answer seed scored by token overlap. Deterministic
/// and dependency-free; a real deployment swaps in the search collaborator.
pub struct StaticKnowledge {
    items: Vec<(String, String)>,
}

impl StaticKnowledge {
    pub fn new(items: Vec<(String, String)>) -> Self {
        Self { items }
    }

    /// The original seed corpus.
    pub fn seed() -> Self {
        let items = [
            ("what is 1kz head bolt torque", "118 Nm"),
            ("wifi ssid name", "Nova"),
            ("fan relay pin", "D1"),
            ("desk light pin", "D2"),
            ("focus recipe", "Desk light 30%, fan 30%, 50-minute timer."),
            (
                "camera lab steps",
                "Power capture card, start viewer, check Coral USB, run pipeline.",
            ),
        ];
        Self::new(
            items
                .iter()
                .map(|(q, a)| (q.to_string(), a.to_string()))
                .collect(),
        )
    }

    fn overlap(query: &[&str], doc: &str) -> f32 {
        if query.is_empty() {
            return 0.0;
        }
        let doc_tokens: Vec<&str> = doc.split_whitespace().collect();
        let hits = query.iter().filter(|t| doc_tokens.contains(t)).count();
        hits as f32 / query.len() as f32
    }
}

#[async_trait]
impl KnowledgeBase for StaticKnowledge {
    async fn query(&self, text: &str) -> anyhow::Result<Option<KbMatch>> {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered.split_whitespace().collect();

        let best = self
            .items
            .iter()
            .map(|(q, a)| (Self::overlap(&tokens, q), q, a))
            .max_by(|a, b| a.0.total_cmp(&b.0));

        Ok(best.and_then(|(score, q, a)| {
            if score > 0.0 {
                Some(KbMatch {
                    answer: a.clone(),
                    score,
                    matched_query: q.clone(),
                })
            } else {
                None
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seed_answers_a_near_question() {
        let kb = StaticKnowledge::seed();
        let m = kb.query("what is the fan relay pin").await.unwrap().unwrap();
        assert_eq!(m.answer, "D1");
        assert!(m.score > 0.3);
    }

    #[tokio::test]
    async fn gibberish_misses() {
        let kb = StaticKnowledge::seed();
        assert!(kb.query("zxqv flurble").await.unwrap().is_none());
    }
}
