use std::env;

use chrono::{DateTime, Duration, Utc};

use crate::cookie::{CookieOptions, SameSite};
use crate::session::types::Session;

pub const DEFAULT_SESSION_NAME: &str = "sid";
pub const DEFAULT_ACTIVITY_QUEUE_CAPACITY: usize = 1000;

/// Timeouts and transport attributes for a [`SessionManager`](crate::SessionManager).
///
/// Anonymous and authenticated sessions each have an idle timeout (gap since
/// last recorded activity) and an absolute max lifetime measured from
/// creation. A session expires at whichever comes first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Cookie or header name carrying the token.
    pub cookie_name: String,
    pub anonymous_idle_timeout: Duration,
    pub anonymous_max_lifetime: Duration,
    pub authenticated_idle_timeout: Duration,
    pub authenticated_max_lifetime: Duration,
    /// Minimum gap between two persisted activity timestamps.
    pub activity_update_threshold: Duration,
    /// Background expiry sweep period; zero disables the sweeper.
    pub cleanup_interval: Duration,
    /// Forces the `Secure` attribute. Leave off only for local development.
    pub secure_cookie: bool,
    pub cookie_path: String,
    pub cookie_domain: Option<String>,
    pub same_site: SameSite,
    pub http_only: bool,
    pub activity_queue_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_SESSION_NAME.to_string(),
            anonymous_idle_timeout: Duration::minutes(30),
            anonymous_max_lifetime: Duration::hours(24),
            authenticated_idle_timeout: Duration::hours(2),
            authenticated_max_lifetime: Duration::hours(720),
            activity_update_threshold: Duration::minutes(5),
            cleanup_interval: Duration::minutes(5),
            secure_cookie: false,
            cookie_path: "/".to_string(),
            cookie_domain: None,
            same_site: SameSite::Lax,
            http_only: true,
            activity_queue_capacity: DEFAULT_ACTIVITY_QUEUE_CAPACITY,
        }
    }
}

impl SessionConfig {
    /// Reads overrides from `SESSION_*` environment variables. Absent or
    /// unparsable values keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            cookie_name: env::var("SESSION_COOKIE_NAME")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.cookie_name),
            anonymous_idle_timeout: env_seconds("SESSION_ANON_IDLE_TIMEOUT")
                .unwrap_or(defaults.anonymous_idle_timeout),
            anonymous_max_lifetime: env_seconds("SESSION_ANON_MAX_LIFETIME")
                .unwrap_or(defaults.anonymous_max_lifetime),
            authenticated_idle_timeout: env_seconds("SESSION_AUTH_IDLE_TIMEOUT")
                .unwrap_or(defaults.authenticated_idle_timeout),
            authenticated_max_lifetime: env_seconds("SESSION_AUTH_MAX_LIFETIME")
                .unwrap_or(defaults.authenticated_max_lifetime),
            activity_update_threshold: env_seconds("SESSION_ACTIVITY_THRESHOLD")
                .unwrap_or(defaults.activity_update_threshold),
            cleanup_interval: env_seconds("SESSION_CLEANUP_INTERVAL")
                .unwrap_or(defaults.cleanup_interval),
            secure_cookie: env_bool("SESSION_SECURE_COOKIE").unwrap_or(defaults.secure_cookie),
            cookie_domain: env::var("SESSION_COOKIE_DOMAIN")
                .ok()
                .filter(|s| !s.is_empty())
                .or(defaults.cookie_domain),
            activity_queue_capacity: env::var("SESSION_ACTIVITY_QUEUE_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.activity_queue_capacity),
            ..defaults
        };

        if !config.secure_cookie {
            tracing::warn!(
                "Session cookies are issued without the Secure attribute; set SESSION_SECURE_COOKIE=true outside local development"
            );
        }

        config
    }

    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    pub fn with_anonymous_timeouts(mut self, idle: Duration, max_lifetime: Duration) -> Self {
        self.anonymous_idle_timeout = idle;
        self.anonymous_max_lifetime = max_lifetime;
        self
    }

    pub fn with_authenticated_timeouts(mut self, idle: Duration, max_lifetime: Duration) -> Self {
        self.authenticated_idle_timeout = idle;
        self.authenticated_max_lifetime = max_lifetime;
        self
    }

    pub fn with_activity_update_threshold(mut self, threshold: Duration) -> Self {
        self.activity_update_threshold = threshold;
        self
    }

    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    pub fn with_secure_cookie(mut self, secure: bool) -> Self {
        self.secure_cookie = secure;
        self
    }

    pub fn with_activity_queue_capacity(mut self, capacity: usize) -> Self {
        self.activity_queue_capacity = capacity;
        self
    }

    pub fn idle_timeout(&self, authenticated: bool) -> Duration {
        if authenticated {
            self.authenticated_idle_timeout
        } else {
            self.anonymous_idle_timeout
        }
    }

    pub fn max_lifetime(&self, authenticated: bool) -> Duration {
        if authenticated {
            self.authenticated_max_lifetime
        } else {
            self.anonymous_max_lifetime
        }
    }

    /// Expiry for `session` after activity at `now`: the idle deadline, capped
    /// by the max-lifetime ceiling anchored at creation. Both are picked by
    /// the session's current authentication state.
    pub fn next_expiry(&self, session: &Session, now: DateTime<Utc>) -> DateTime<Utc> {
        let authenticated = session.is_authenticated();
        let idle_deadline = now.checked_add_signed(self.idle_timeout(authenticated));
        let ceiling = session
            .created_at()
            .checked_add_signed(self.max_lifetime(authenticated));

        // A bound past the representable range never applies
        match (idle_deadline, ceiling) {
            (Some(idle), Some(ceiling)) => idle.min(ceiling),
            (Some(deadline), None) | (None, Some(deadline)) => deadline,
            (None, None) => DateTime::<Utc>::MAX_UTC,
        }
    }

    /// Attributes for the session cookie. `max_age` is filled in per write.
    pub fn cookie_options(&self) -> CookieOptions {
        CookieOptions {
            name: self.cookie_name.clone(),
            path: self.cookie_path.clone(),
            domain: self.cookie_domain.clone(),
            max_age: None,
            secure: self.secure_cookie,
            http_only: self.http_only,
            same_site: self.same_site,
        }
    }
}

fn env_seconds(key: &str) -> Option<Duration> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<i64>() {
        Ok(secs) if secs >= 0 => Duration::try_seconds(secs).or_else(|| {
            tracing::warn!("Ignoring out-of-range value for {}: {:?}", key, raw);
            None
        }),
        _ => {
            tracing::warn!("Ignoring invalid value for {}: {:?}", key, raw);
            None
        }
    }
}

fn env_bool(key: &str) -> Option<bool> {
    let raw = env::var(key).ok()?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => {
            tracing::warn!("Ignoring invalid value for {}: {:?}", key, raw);
            None
        }
    }
}
