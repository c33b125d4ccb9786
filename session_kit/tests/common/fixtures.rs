use std::sync::{Arc, Once};

use http::HeaderMap;
use http::header::USER_AGENT;
use session_kit::{CookieCodec, InMemorySessionStore, SessionConfig, SessionManager};

pub const TEST_SECRET: &[u8] = b"integration-test-secret-0123456789abcdef";

static INIT: Once = Once::new();

/// Loads `.env` once so local overrides apply to every test.
pub fn init_test_environment() {
    INIT.call_once(|| {
        dotenvy::dotenv().ok();
    });
}

pub struct TestApp {
    pub manager: SessionManager,
    pub store: Arc<InMemorySessionStore>,
}

impl TestApp {
    pub fn new(config: SessionConfig) -> Result<Self, Box<dyn std::error::Error>> {
        init_test_environment();
        let store = Arc::new(InMemorySessionStore::new());
        let manager = SessionManager::builder()
            .config(config)
            .store(store.clone())
            .cookie_codec(Arc::new(CookieCodec::new(TEST_SECRET)?))
            .build()?;
        Ok(Self { manager, store })
    }

    /// Binds sessions to the `User-Agent` header so tests can pick fingerprints.
    pub fn with_user_agent_fingerprint(
        config: SessionConfig,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        init_test_environment();
        let store = Arc::new(InMemorySessionStore::new());
        let manager = SessionManager::builder()
            .config(config)
            .store(store.clone())
            .cookie_codec(Arc::new(CookieCodec::new(TEST_SECRET)?))
            .fingerprint(|headers: &HeaderMap| {
                headers
                    .get(USER_AGENT)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string()
            })
            .build()?;
        Ok(Self { manager, store })
    }
}
