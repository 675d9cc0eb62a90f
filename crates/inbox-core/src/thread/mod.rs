//! Conversation threading.
//!
//! # Module Structure
//!
//! - `message`: Inbox message and raw parent reference types
//! - `reconstruct`: Reply forest reconstruction (`reconstruct_threads`)

mod message;
mod reconstruct;

pub use message::{Message, RawParentId};
pub use reconstruct::{ThreadNode, ThreadView, ThreadedMessage, reconstruct_threads};
