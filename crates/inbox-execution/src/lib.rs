pub mod cleanup;
pub mod logging;
pub mod session_log_layer;

pub use cleanup::{CleanupHandle, CleanupScheduler};
pub use logging::init_tracing;
pub use session_log_layer::{SessionLogLayer, SessionLogLine};
