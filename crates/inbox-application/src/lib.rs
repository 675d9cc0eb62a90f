pub mod interview_service;
pub mod session;

pub use interview_service::{PersonaInterviewService, TurnOutcome};
pub use session::{PersonaSessionManager, SessionLocks};
