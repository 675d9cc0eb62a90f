//! Persona interview session state.
//!
//! `PersonaState` is plain data plus the pure transitions of the state
//! machine. Locking, storage and expiry bookkeeping live in the application
//! layer's session manager.

use super::params::{ConfidenceScores, PersonaParameters};
use super::stage::Stage;
use crate::conversation::ConversationMessage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle phase of a persona session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Parameters are still being collected.
    #[default]
    Core,
    /// Terminal.
    Completed,
}

/// Snapshot of a session's progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub timestamp: DateTime<Utc>,
    pub parameters: PersonaParameters,
    /// Mean of all per-parameter confidence scores.
    pub confidence: f64,
    pub stage: Stage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaState {
    pub session_id: String,
    pub user_id: String,
    pub phase: Phase,
    pub parameters: PersonaParameters,
    pub confidence_scores: ConfidenceScores,
    pub conversation_history: Vec<ConversationMessage>,
    pub checkpoints: Vec<Checkpoint>,
    pub version: u32,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Read-only progress summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub parameter_count: usize,
    pub confidence: f64,
    pub stage: Stage,
    pub checkpoint_count: usize,
    pub conversation_length: usize,
}

impl PersonaState {
    /// Formats the session id for a user at a point in time.
    pub fn session_id_for(user_id: &str, created_at: DateTime<Utc>) -> String {
        format!("persona_{}_{}", user_id, created_at.timestamp_millis())
    }

    pub fn new(user_id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        let user_id = user_id.into();
        Self {
            session_id: Self::session_id_for(&user_id, created_at),
            user_id,
            phase: Phase::Core,
            parameters: PersonaParameters::new(),
            confidence_scores: ConfidenceScores::new(),
            conversation_history: Vec::new(),
            checkpoints: Vec::new(),
            version: 1,
            completed_at: None,
        }
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    /// Arithmetic mean of the confidence scores, or 0 when there are none.
    pub fn aggregate_confidence(&self) -> f64 {
        if self.confidence_scores.is_empty() {
            return 0.0;
        }
        self.confidence_scores.values().sum::<f64>() / self.confidence_scores.len() as f64
    }

    pub fn stage(&self) -> Stage {
        Stage::from_parameter_count(self.parameter_count())
    }

    pub fn is_completed(&self) -> bool {
        self.phase == Phase::Completed
    }

    /// Shallow-merges a turn into the session and bumps the version.
    ///
    /// New parameter and confidence values overwrite existing ones. The
    /// history is replaced: callers pass the complete running transcript.
    pub fn apply_update(
        &mut self,
        parameters: PersonaParameters,
        confidence: ConfidenceScores,
        messages: Vec<ConversationMessage>,
    ) {
        self.parameters.extend(parameters);
        self.confidence_scores.extend(confidence);
        self.conversation_history = messages;
        self.version += 1;
    }

    /// Whether the current parameter count lands on a checkpoint boundary.
    pub fn is_checkpoint_due(&self, interval: usize) -> bool {
        let count = self.parameter_count();
        interval > 0 && count > 0 && count % interval == 0
    }

    /// Appends a checkpoint, keeping only the `max_checkpoints` most recent.
    pub fn record_checkpoint(&mut self, now: DateTime<Utc>, max_checkpoints: usize) -> &Checkpoint {
        self.checkpoints.push(Checkpoint {
            timestamp: now,
            parameters: self.parameters.clone(),
            confidence: self.aggregate_confidence(),
            stage: self.stage(),
        });
        let keep = max_checkpoints.max(1);
        if self.checkpoints.len() > keep {
            let excess = self.checkpoints.len() - keep;
            self.checkpoints.drain(..excess);
        }
        &self.checkpoints[self.checkpoints.len() - 1]
    }

    /// Marks the session completed and records the final checkpoint.
    pub fn complete(&mut self, now: DateTime<Utc>, max_checkpoints: usize) {
        self.phase = Phase::Completed;
        self.completed_at = Some(now);
        self.record_checkpoint(now, max_checkpoints);
    }

    /// Timestamp of the newest checkpoint.
    ///
    /// Sessions without checkpoints report a time already past `timeout`, so
    /// they are expired by the next restore or sweep. Kept as-is: a session
    /// that has not reached its first checkpoint is not recoverable.
    pub fn last_activity(&self, now: DateTime<Utc>, timeout: chrono::Duration) -> DateTime<Utc> {
        self.checkpoints
            .last()
            .map(|c| c.timestamp)
            .unwrap_or_else(|| now - timeout - chrono::Duration::seconds(1))
    }

    pub fn is_expired(&self, now: DateTime<Utc>, timeout: chrono::Duration) -> bool {
        now - self.last_activity(now, timeout) > timeout
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            parameter_count: self.parameter_count(),
            confidence: self.aggregate_confidence(),
            stage: self.stage(),
            checkpoint_count: self.checkpoints.len(),
            conversation_length: self.conversation_history.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::ParamValue;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn one(name: &str, value: &str, confidence: f64) -> (PersonaParameters, ConfidenceScores) {
        (
            PersonaParameters::from([(name.to_string(), ParamValue::from(value))]),
            ConfidenceScores::from([(name.to_string(), confidence)]),
        )
    }

    #[test]
    fn test_new_state() {
        let state = PersonaState::new("u42", now());
        assert_eq!(state.session_id, format!("persona_u42_{}", now().timestamp_millis()));
        assert_eq!(state.version, 1);
        assert_eq!(state.phase, Phase::Core);
        assert_eq!(state.stats().stage, Stage::Introduction);
        assert_eq!(state.aggregate_confidence(), 0.0);
    }

    #[test]
    fn test_apply_update_merges_and_replaces_history() {
        let mut state = PersonaState::new("u1", now());
        let (p, c) = one("tone", "warm", 0.4);
        state.apply_update(p, c, vec![ConversationMessage::user("first")]);
        let (p, c) = one("tone", "playful", 0.8);
        state.apply_update(
            p,
            c,
            vec![
                ConversationMessage::user("first"),
                ConversationMessage::user("second"),
            ],
        );

        assert_eq!(state.version, 3);
        assert_eq!(state.parameters["tone"], ParamValue::from("playful"));
        assert_eq!(state.confidence_scores["tone"], 0.8);
        assert_eq!(state.conversation_history.len(), 2);
    }

    #[test]
    fn test_checkpoint_due_on_multiples() {
        let mut state = PersonaState::new("u1", now());
        assert!(!state.is_checkpoint_due(2));
        let names = ["tone", "boundaries", "fallback_reply", "allowed_topics"];
        for (i, name) in names.iter().enumerate() {
            let (p, c) = one(name, "x", 0.5);
            state.apply_update(p, c, Vec::new());
            assert_eq!(state.is_checkpoint_due(2), (i + 1) % 2 == 0);
        }
        assert!(!state.is_checkpoint_due(0));
    }

    #[test]
    fn test_record_checkpoint_caps_history() {
        let mut state = PersonaState::new("u1", now());
        let (p, c) = one("tone", "warm", 0.5);
        state.apply_update(p, c, Vec::new());
        for minute in 0..7 {
            state.record_checkpoint(now() + Duration::minutes(minute), 5);
        }
        assert_eq!(state.checkpoints.len(), 5);
        assert_eq!(state.checkpoints[0].timestamp, now() + Duration::minutes(2));
        assert_eq!(state.checkpoints[4].stage, Stage::Discovery);
        assert_eq!(state.checkpoints[4].confidence, 0.5);
    }

    #[test]
    fn test_zero_checkpoints_is_immediately_expired() {
        let state = PersonaState::new("u1", now());
        assert!(state.is_expired(now(), Duration::hours(24)));
    }

    #[test]
    fn test_expiry_uses_newest_checkpoint() {
        let mut state = PersonaState::new("u1", now());
        state.record_checkpoint(now(), 5);
        assert!(!state.is_expired(now() + Duration::hours(24), Duration::hours(24)));
        assert!(state.is_expired(now() + Duration::hours(25), Duration::hours(24)));
    }

    #[test]
    fn test_complete_sets_phase_and_checkpoint() {
        let mut state = PersonaState::new("u1", now());
        state.complete(now(), 5);
        assert!(state.is_completed());
        assert_eq!(state.completed_at, Some(now()));
        assert_eq!(state.checkpoints.len(), 1);
    }
}
