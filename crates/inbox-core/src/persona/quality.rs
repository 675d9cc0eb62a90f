//! Quality gates and confidence scoring for extracted persona parameters.

use super::params::{ConfidenceScores, PersonaParameter, PersonaParameters};
use crate::conversation::{ConversationMessage, count_mentions};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const BASE_CONFIDENCE: f64 = 0.3;
const RICH_VALUE_BONUS: f64 = 0.2;
const MENTION_BONUS: f64 = 0.1;
const MAX_MENTION_BONUS: f64 = 0.3;

/// Acceptance threshold for one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityGate {
    pub minimum_confidence: f64,
    /// Minimum number of transcript messages that mention the parameter.
    pub required_data_points: usize,
}

impl QualityGate {
    const fn new(minimum_confidence: f64, required_data_points: usize) -> Self {
        Self {
            minimum_confidence,
            required_data_points,
        }
    }
}

static QUALITY_GATES: Lazy<HashMap<PersonaParameter, QualityGate>> = Lazy::new(|| {
    use PersonaParameter::*;
    HashMap::from([
        (Tone, QualityGate::new(0.6, 2)),
        (CommunicationStyle, QualityGate::new(0.6, 2)),
        (AllowedTopics, QualityGate::new(0.5, 1)),
        (RestrictedTopics, QualityGate::new(0.5, 1)),
        (Boundaries, QualityGate::new(0.7, 1)),
        (FallbackReply, QualityGate::new(0.5, 1)),
        (ResponseLength, QualityGate::new(0.4, 0)),
        (SignaturePhrases, QualityGate::new(0.4, 1)),
    ])
});

/// The gate for a parameter name, if it has one.
pub fn quality_gate(parameter: &str) -> Option<QualityGate> {
    let parameter: PersonaParameter = parameter.parse().ok()?;
    QUALITY_GATES.get(&parameter).copied()
}

/// One turn of output from the extraction collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonaExtraction {
    pub parameters: PersonaParameters,
    pub confidence: ConfidenceScores,
}

/// Whether an extracted parameter clears its quality gate.
///
/// Parameters without a gate always pass. A missing confidence score counts
/// as zero.
pub fn validate_parameter_quality(
    parameter: &str,
    extraction: &PersonaExtraction,
    history: &[ConversationMessage],
) -> bool {
    let Some(gate) = quality_gate(parameter) else {
        return true;
    };

    let confidence = extraction.confidence.get(parameter).copied().unwrap_or(0.0);
    confidence >= gate.minimum_confidence
        && count_mentions(history, parameter) >= gate.required_data_points
}

/// Heuristic confidence for every extracted parameter.
///
/// Starts at 0.3, adds 0.2 for a rich value, adds 0.1 per transcript message
/// mentioning the parameter name (at most 0.3) and clamps to `[0, 1]`.
pub fn calculate_confidence_scores(
    parameters: &PersonaParameters,
    history: &[ConversationMessage],
) -> ConfidenceScores {
    parameters
        .iter()
        .map(|(name, value)| {
            let mut score = BASE_CONFIDENCE;
            if value.is_rich() {
                score += RICH_VALUE_BONUS;
            }
            let mentions = count_mentions(history, name) as f64;
            score += (mentions * MENTION_BONUS).min(MAX_MENTION_BONUS);
            (name.clone(), score.clamp(0.0, 1.0))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::ParamValue;

    fn params(entries: &[(&str, ParamValue)]) -> PersonaParameters {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_confidence_rich_value_with_mention() {
        let extraction = params(&[("tone", ParamValue::from("a very expressive and warm voice"))]);
        let history = vec![ConversationMessage::user("I love my tone of writing")];

        let scores = calculate_confidence_scores(&extraction, &history);
        let tone = scores["tone"];
        assert!(tone > 0.3 && tone < 1.0, "tone confidence was {tone}");
        assert!((tone - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_base_only() {
        let extraction = params(&[("tone", ParamValue::from("calm"))]);
        let scores = calculate_confidence_scores(&extraction, &[]);
        assert!((scores["tone"] - BASE_CONFIDENCE).abs() < 1e-9);
    }

    #[test]
    fn test_mention_bonus_is_capped() {
        let extraction = params(&[(
            "allowed_topics",
            ParamValue::from(vec!["music".to_string(), "food".to_string()]),
        )]);
        let history: Vec<ConversationMessage> = (0..10)
            .map(|i| ConversationMessage::user(format!("allowed_topics #{i}")))
            .collect();
        let scores = calculate_confidence_scores(&extraction, &history);
        assert!((scores["allowed_topics"] - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_parameter_passes_gate() {
        let extraction = PersonaExtraction::default();
        assert!(quality_gate("favourite_emoji").is_none());
        assert!(validate_parameter_quality("favourite_emoji", &extraction, &[]));
    }

    #[test]
    fn test_gate_requires_confidence_and_evidence() {
        let mut extraction = PersonaExtraction::default();
        extraction.confidence.insert("tone".to_string(), 0.7);

        let one_mention = vec![ConversationMessage::user("tone: upbeat")];
        assert!(!validate_parameter_quality("tone", &extraction, &one_mention));

        let two_mentions = vec![
            ConversationMessage::assistant("Describe your Tone"),
            ConversationMessage::user("My tone is upbeat"),
        ];
        assert!(validate_parameter_quality("tone", &extraction, &two_mentions));

        extraction.confidence.insert("tone".to_string(), 0.5);
        assert!(!validate_parameter_quality("tone", &extraction, &two_mentions));
    }

    #[test]
    fn test_missing_confidence_fails_gate() {
        let extraction = PersonaExtraction::default();
        assert!(!validate_parameter_quality("response_length", &extraction, &[]));
    }
}
