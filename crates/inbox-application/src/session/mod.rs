//! Persona session application services.
//!
//! This module contains the persona session state machine and the
//! per-session exclusion it runs under.

mod locks;
mod manager;

pub use locks::SessionLocks;
pub use manager::PersonaSessionManager;
