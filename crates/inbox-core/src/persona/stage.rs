//! Interview stages.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Coarse progress label derived from the number of collected parameters.
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
pub enum Stage {
    Introduction,
    Discovery,
    CoreCollection,
    PersonaPreview,
    Completion,
}

impl Stage {
    /// `0` introduction, `<2` discovery, `<4` core collection,
    /// `<6` persona preview, otherwise completion.
    pub fn from_parameter_count(count: usize) -> Self {
        match count {
            0 => Stage::Introduction,
            1 => Stage::Discovery,
            2..=3 => Stage::CoreCollection,
            4..=5 => Stage::PersonaPreview,
            _ => Stage::Completion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds() {
        let stages: Vec<Stage> = (0..8).map(Stage::from_parameter_count).collect();
        assert_eq!(
            stages,
            vec![
                Stage::Introduction,
                Stage::Discovery,
                Stage::CoreCollection,
                Stage::CoreCollection,
                Stage::PersonaPreview,
                Stage::PersonaPreview,
                Stage::Completion,
                Stage::Completion,
            ]
        );
    }

    #[test]
    fn test_display_matches_serde() {
        assert_eq!(Stage::CoreCollection.to_string(), "core_collection");
        assert_eq!(
            serde_json::to_string(&Stage::PersonaPreview).unwrap(),
            "\"persona_preview\""
        );
    }
}
