//! session-kit - Server-side session management for Rust web services
//!
//! Sessions start anonymous, are bound to a user on login under a freshly
//! rotated token, and are destroyed on logout. Persistence goes through the
//! [`SessionStore`] trait and the token travels through a [`Transport`]
//! (encrypted cookie, header, or both). [`SessionManager`] ties them
//! together and works on plain [`http::HeaderMap`]s so that any HTTP
//! framework can drive it.

mod cookie;
mod session;
mod storage;
mod transport;
mod utils;

#[cfg(test)]
mod test_utils;

pub use cookie::{
    CookieCodec, CookieError, CookieOptions, MIN_SECRET_LEN, SameSite, TokenCodec, delete_cookie,
    get_cookie, get_encrypted_cookie, get_signed_cookie, set_cookie, set_encrypted_cookie,
    set_signed_cookie,
};

pub use session::{
    DEFAULT_ACTIVITY_QUEUE_CAPACITY, DEFAULT_SESSION_NAME, FingerprintFn, Session, SessionConfig,
    SessionError, SessionManager, SessionManagerBuilder, SessionStats, fingerprint_from_headers,
};

pub use storage::{InMemorySessionStore, SessionStore, StorageError};

pub use transport::{
    CompositeTransport, CookieTransport, DEFAULT_TOKEN_PREFIX, HeaderTransport, Transport,
};

pub use utils::{UtilError, gen_random_string};
