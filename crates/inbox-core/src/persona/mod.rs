//! Persona interview domain module.
//!
//! This module contains the avatar persona session model, its store
//! interface, and the pure helpers that drive the interview.
//!
//! # Module Structure
//!
//! - `params`: Persona parameters and values (`PersonaParameter`, `ParamValue`)
//! - `stage`: Progress labels (`Stage`)
//! - `state`: Session state and transitions (`PersonaState`, `Checkpoint`)
//! - `store`: Store trait for session persistence
//! - `quality`: Quality gates and confidence scoring
//! - `questions`: Stage question selection
//!
//! # Usage
//!
//! ```ignore
//! use inbox_core::persona::{PersonaState, PersonaSessionStore, Stage};
//! use inbox_core::persona::{calculate_confidence_scores, validate_parameter_quality};
//! ```

mod params;
mod quality;
mod questions;
mod stage;
mod state;
mod store;

// Re-export public API
pub use params::{ConfidenceScores, ParamValue, PersonaParameter, PersonaParameters};
pub use quality::{
    PersonaExtraction, QualityGate, calculate_confidence_scores, quality_gate,
    validate_parameter_quality,
};
pub use questions::next_question_for_stage;
pub use stage::Stage;
pub use state::{Checkpoint, PersonaState, Phase, SessionStats};
pub use store::PersonaSessionStore;
