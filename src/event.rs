use std::time::Instant;

use serde::Deserialize;

use crate::error::Error;

/// Minimum confidence an ambient detection needs to be admitted to the bus.
pub const DETECTION_CONFIDENCE_FLOOR: f32 = 0.5;

/// Wire envelope pushed by the external perception collaborator.
/// Transport framing is the collaborator's problem; we only see the payload.
#[derive(Debug, Clone, Deserialize)]
pub struct PerceptionEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "subjectOrLabel")]
    pub subject_or_label: String,
    pub confidence: f32,
}

/// A presence sighting of some subject. Consumed once by the SessionMonitor.
#[derive(Debug, Clone)]
pub struct PresenceEvent {
    pub subject: String,
    pub confidence: f32,
    pub observed_at: Instant,
}

impl PresenceEvent {
    pub fn now(subject: &str, confidence: f32) -> Self {
        Self {
            subject: subject.to_string(),
            confidence,
            observed_at: Instant::now(),
        }
    }
}

/// An ambient object detection. Carries no session semantics.
#[derive(Debug, Clone)]
pub struct DetectionEvent {
    pub label: String,
    pub confidence: f32,
}

/// Typed perception event after envelope validation.
#[derive(Debug, Clone)]
pub enum PerceptionEvent {
    Presence(PresenceEvent),
    Detection(DetectionEvent),
}

impl PerceptionEvent {
    /// Parse one raw envelope. Malformed payloads are a `Parse` error the
    /// caller logs and drops; low-confidence detections are filtered here so
    /// the bus never carries noise.
    pub fn parse(raw: &str) -> Result<Option<Self>, Error> {
        let env: PerceptionEnvelope =
            serde_json::from_str(raw).map_err(|e| Error::Parse(e.to_string()))?;

        if env.subject_or_label.trim().is_empty() {
            return Err(Error::Parse("empty subjectOrLabel".into()));
        }
        if !env.confidence.is_finite() || !(0.0..=1.0).contains(&env.confidence) {
            return Err(Error::Parse(format!(
                "confidence out of range: {}",
                env.confidence
            )));
        }

        match env.kind.as_str() {
            "presence" => Ok(Some(PerceptionEvent::Presence(PresenceEvent::now(
                env.subject_or_label.trim(),
                env.confidence,
            )))),
            "detection" => {
                if env.confidence < DETECTION_CONFIDENCE_FLOOR {
                    return Ok(None);
                }
                Ok(Some(PerceptionEvent::Detection(DetectionEvent {
                    label: env.subject_or_label.trim().to_string(),
                    confidence: env.confidence,
                })))
            }
            other => Err(Error::Parse(format!("unknown event type '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_presence_envelope() {
        let raw = r#"{"type":"presence","subjectOrLabel":"Rommel","confidence":0.95}"#;
        match PerceptionEvent::parse(raw).unwrap() {
            Some(PerceptionEvent::Presence(p)) => {
                assert_eq!(p.subject, "Rommel");
                assert!((p.confidence - 0.95).abs() < 1e-6);
            }
            other => panic!("expected presence, got {other:?}"),
        }
    }

    #[test]
    fn low_confidence_detection_is_filtered() {
        let raw = r#"{"type":"detection","subjectOrLabel":"cup","confidence":0.3}"#;
        assert!(PerceptionEvent::parse(raw).unwrap().is_none());
    }

    #[test]
    fn malformed_payloads_are_parse_errors() {
        assert!(matches!(PerceptionEvent::parse("not json"), Err(Error::Parse(_))));

        let empty = r#"{"type":"presence","subjectOrLabel":"  ","confidence":0.9}"#;
        assert!(matches!(PerceptionEvent::parse(empty), Err(Error::Parse(_))));

        let bad_kind = r#"{"type":"sonar","subjectOrLabel":"x","confidence":0.9}"#;
        assert!(matches!(PerceptionEvent::parse(bad_kind), Err(Error::Parse(_))));

        let bad_conf = r#"{"type":"presence","subjectOrLabel":"x","confidence":7.0}"#;
        assert!(matches!(PerceptionEvent::parse(bad_conf), Err(Error::Parse(_))));
    }
}
