//! Domain core of the social inbox.
//!
//! Holds the conversation threading algorithm, the avatar persona interview
//! model and its helpers, the shared error type and the configuration model.
//! Nothing in this crate performs I/O.

pub mod config;
pub mod conversation;
pub mod error;
pub mod persona;
pub mod thread;

// Re-export common error type
pub use error::InboxError;
