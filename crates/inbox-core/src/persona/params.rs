//! Persona parameters collected during an interview.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// The avatar traits the interview tries to collect.
///
/// Parameter maps are keyed by the snake_case name so extractors may also
/// report keys outside this list; those are stored but have no quality gate.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PersonaParameter {
    Tone,
    CommunicationStyle,
    AllowedTopics,
    RestrictedTopics,
    Boundaries,
    FallbackReply,
    ResponseLength,
    SignaturePhrases,
}

impl PersonaParameter {
    pub fn as_str(&self) -> &str {
        self.as_ref()
    }
}

/// An extracted parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Text(String),
    List(Vec<String>),
}

impl ParamValue {
    /// A long free-text answer or a list with more than one entry.
    pub fn is_rich(&self) -> bool {
        match self {
            ParamValue::Text(text) => text.chars().count() > 15,
            ParamValue::List(items) => items.len() > 1,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(value: Vec<String>) -> Self {
        ParamValue::List(value)
    }
}

/// Parameter name to extracted value.
pub type PersonaParameters = BTreeMap<String, ParamValue>;

/// Parameter name to confidence in `[0, 1]`.
pub type ConfidenceScores = BTreeMap<String, f64>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_parameter_names_are_snake_case() {
        assert_eq!(PersonaParameter::AllowedTopics.as_str(), "allowed_topics");
        assert_eq!(
            PersonaParameter::from_str("fallback_reply").unwrap(),
            PersonaParameter::FallbackReply
        );
    }

    #[test]
    fn test_rich_values() {
        assert!(ParamValue::from("a very expressive and warm voice").is_rich());
        assert!(!ParamValue::from("casual").is_rich());
        assert!(ParamValue::from(vec!["music".to_string(), "travel".to_string()]).is_rich());
        assert!(!ParamValue::from(vec!["music".to_string()]).is_rich());
    }

    #[test]
    fn test_untagged_deserialization() {
        let params: PersonaParameters =
            serde_json::from_str(r#"{"tone": "friendly", "allowed_topics": ["music", "travel"]}"#)
                .unwrap();
        assert_eq!(params["tone"], ParamValue::Text("friendly".to_string()));
        assert!(matches!(params["allowed_topics"], ParamValue::List(_)));
    }
}
