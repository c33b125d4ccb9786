mod activity;
mod builder;
mod fingerprint;
mod manager;

pub use builder::SessionManagerBuilder;
pub use fingerprint::fingerprint_from_headers;
pub use manager::{FingerprintFn, SessionManager};
