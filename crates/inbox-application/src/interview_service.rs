//! Persona interview orchestration.
//!
//! Sits between the AI extraction collaborator and the session manager: each
//! turn's raw extraction is scored, filtered through the quality gates and
//! merged, and the next interview question is chosen for the resulting stage.

use crate::session::PersonaSessionManager;
use inbox_core::conversation::ConversationMessage;
use inbox_core::error::Result;
use inbox_core::persona::{
    PersonaExtraction, PersonaParameters, PersonaState, Stage, calculate_confidence_scores,
    next_question_for_stage, validate_parameter_quality,
};
use serde::Serialize;
use std::sync::Arc;

/// Result of processing one interview turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnOutcome {
    pub version: u32,
    /// Parameters that cleared their quality gate and were merged.
    pub accepted: Vec<String>,
    /// Parameters held back for more evidence.
    pub rejected: Vec<String>,
    pub stage: Stage,
    pub next_question: Option<String>,
}

pub struct PersonaInterviewService {
    sessions: Arc<PersonaSessionManager>,
}

impl PersonaInterviewService {
    pub fn new(sessions: Arc<PersonaSessionManager>) -> Self {
        Self { sessions }
    }

    pub fn sessions(&self) -> &Arc<PersonaSessionManager> {
        &self.sessions
    }

    /// Creates a session and returns it with the opening question.
    pub async fn start_interview(&self, user_id: &str) -> Result<(PersonaState, Option<String>)> {
        let state = self.sessions.create_session(user_id).await?;
        let question = next_question_for_stage(
            state.stage().as_ref(),
            &state.conversation_history,
            &state.parameters,
        )
        .map(str::to_string);
        Ok((state, question))
    }

    /// Scores, gates and merges one turn of extracted parameters.
    ///
    /// `history` is the complete transcript so far; it replaces the stored
    /// one even when no parameter is accepted.
    ///
    /// # Returns
    ///
    /// The outcome, or `None` if the session does not exist.
    pub async fn process_turn(
        &self,
        session_id: &str,
        extracted: PersonaParameters,
        history: Vec<ConversationMessage>,
    ) -> Result<Option<TurnOutcome>> {
        let confidence = calculate_confidence_scores(&extracted, &history);
        let extraction = PersonaExtraction {
            parameters: extracted,
            confidence,
        };

        let (accepted, rejected): (Vec<String>, Vec<String>) = extraction
            .parameters
            .keys()
            .cloned()
            .partition(|name| validate_parameter_quality(name, &extraction, &history));

        if !rejected.is_empty() {
            tracing::debug!(
                session_id = %session_id,
                "[PersonaInterview] Held back parameters below quality gate: {:?}",
                rejected
            );
        }

        let PersonaExtraction {
            mut parameters,
            mut confidence,
        } = extraction;
        parameters.retain(|name, _| accepted.contains(name));
        confidence.retain(|name, _| accepted.contains(name));

        let Some(state) = self
            .sessions
            .update_session(session_id, parameters, confidence, history)
            .await?
        else {
            return Ok(None);
        };

        let stage = state.stage();
        let next_question =
            next_question_for_stage(stage.as_ref(), &state.conversation_history, &state.parameters)
                .map(str::to_string);

        Ok(Some(TurnOutcome {
            version: state.version,
            accepted,
            rejected,
            stage,
            next_question,
        }))
    }

    /// Completes the interview.
    pub async fn finish_interview(&self, session_id: &str) -> Result<bool> {
        self.sessions.complete_session(session_id).await
    }
}
