pub mod config_service;
pub mod in_memory_session_store;
pub mod paths;

pub use crate::config_service::ConfigService;
pub use crate::in_memory_session_store::InMemorySessionStore;
pub use crate::paths::InboxPaths;
