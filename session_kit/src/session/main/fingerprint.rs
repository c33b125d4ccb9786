use http::header::{ACCEPT_LANGUAGE, HeaderMap, USER_AGENT};
use sha2::{Digest, Sha256};

use crate::utils::base64url_encode;

/// Default client fingerprint: SHA-256 over `User-Agent` and
/// `Accept-Language`, base64url encoded. Absent headers hash as empty.
pub fn fingerprint_from_headers(headers: &HeaderMap) -> String {
    let mut hasher = Sha256::new();
    for name in [USER_AGENT, ACCEPT_LANGUAGE] {
        let value = headers.get(&name).map(|v| v.as_bytes()).unwrap_or_default();
        hasher.update(value);
        // Separator so that ("ab", "") and ("a", "b") differ
        hasher.update([0u8]);
    }
    base64url_encode(&hasher.finalize())
}
