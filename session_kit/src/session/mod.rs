mod config;
mod errors;
mod main;
mod types;

pub use config::{DEFAULT_ACTIVITY_QUEUE_CAPACITY, DEFAULT_SESSION_NAME, SessionConfig};
pub use errors::SessionError;
pub use main::{FingerprintFn, SessionManager, SessionManagerBuilder, fingerprint_from_headers};
pub use types::{Session, SessionStats};
