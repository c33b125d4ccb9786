use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use subtle::ConstantTimeEq;
use uuid::Uuid;

/// Server-side state of one visitor, keyed in the store by `token`.
///
/// `id`, `created_at` and `fingerprint` are fixed at creation and only
/// readable through accessors. Everything else is a detached copy: changes
/// become durable only once handed back to a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    id: Uuid,
    /// Opaque lookup key; rotated on authentication.
    pub token: String,
    /// `None` while anonymous.
    pub user_id: Option<Uuid>,
    fingerprint: String,
    #[serde(default)]
    pub data: HashMap<String, Value>,
    pub expires_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: impl Into<String>, fingerprint: impl Into<String>) -> Self {
        Self::new_at(token, fingerprint, Utc::now())
    }

    /// Creates an anonymous session whose clock starts at `now`. The expiry is
    /// `now` until the owner computes a real one.
    pub fn new_at(
        token: impl Into<String>,
        fingerprint: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            token: token.into(),
            user_id: None,
            fingerprint: fingerprint.into(),
            data: HashMap::new(),
            expires_at: now,
            last_activity_at: now,
            created_at: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.data
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// Reads an integer, accepting floats with no fractional part as they
    /// come back from JSON round-trips.
    pub fn get_int(&self, key: &str) -> Option<i64> {
        let Value::Number(number) = self.data.get(key)? else {
            return None;
        };

        if let Some(i) = number.as_i64() {
            return Some(i);
        }

        number
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
            .map(|f| f as i64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.data.get(key).and_then(Value::as_bool)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(key.into(), value.into());
    }

    pub fn delete(&mut self, key: &str) {
        self.data.remove(key);
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn touch(&mut self) {
        self.last_activity_at = Utc::now();
    }

    /// Constant-time comparison against the stored fingerprint. A session
    /// without a fingerprint accepts any candidate.
    pub fn validate_fingerprint(&self, candidate: &str) -> bool {
        if self.fingerprint.is_empty() {
            return true;
        }
        if self.fingerprint.len() != candidate.len() {
            return false;
        }
        self.fingerprint
            .as_bytes()
            .ct_eq(candidate.as_bytes())
            .into()
    }
}

/// Counts reported by a store for observability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub total: usize,
    pub authenticated: usize,
    pub anonymous: usize,
}
