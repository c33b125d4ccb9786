//! Authenticated encryption and signing of cookie values.
//!
//! A single application secret is stretched into two independent keys, one
//! for AES-256-GCM encryption and one for HMAC-SHA256 signing, so that a
//! signed cookie can never be replayed as an encrypted one or vice versa.

use hmac::{Hmac, Mac};
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, NONCE_LEN, Nonce, UnboundKey};
use sha2::Sha256;

use super::errors::CookieError;
use crate::utils::{base64url_decode, base64url_encode, gen_random_bytes};

type HmacSha256 = Hmac<Sha256>;

/// Minimum length of the application secret in bytes.
pub const MIN_SECRET_LEN: usize = 32;

const TAG_LEN: usize = 16;
const ENCRYPTION_LABEL: &[u8] = b"session-kit/cookie/encryption/v1";
const SIGNING_LABEL: &[u8] = b"session-kit/cookie/signing/v1";

/// Opaque-token protection consumed by the session layer.
///
/// `decrypt` fails for malformed input and for authentication failures alike;
/// callers that only care about "is there a usable token" treat any error as
/// absence.
pub trait TokenCodec: Send + Sync + 'static {
    fn encrypt(&self, plaintext: &str) -> Result<String, CookieError>;

    fn decrypt(&self, ciphertext: &str) -> Result<String, CookieError>;
}

pub struct CookieCodec {
    encryption_key: LessSafeKey,
    signing_key: [u8; 32],
}

impl std::fmt::Debug for CookieCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieCodec").finish_non_exhaustive()
    }
}

impl CookieCodec {
    /// Builds a codec from an application secret of at least [`MIN_SECRET_LEN`] bytes.
    pub fn new(secret: &[u8]) -> Result<Self, CookieError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(CookieError::InvalidKey(format!(
                "secret must be at least {MIN_SECRET_LEN} bytes, got {}",
                secret.len()
            )));
        }

        let encryption_bytes = derive_key(secret, ENCRYPTION_LABEL)?;
        let unbound = UnboundKey::new(&AES_256_GCM, &encryption_bytes)
            .map_err(|_| CookieError::InvalidKey("Failed to create AES-256-GCM key".to_string()))?;

        Ok(Self {
            encryption_key: LessSafeKey::new(unbound),
            signing_key: derive_key(secret, SIGNING_LABEL)?,
        })
    }

    /// Returns a fresh random secret, base64url encoded, suitable for `new`
    /// after decoding. Intended for development setups.
    pub fn generate_secret() -> Result<String, CookieError> {
        let bytes = gen_random_bytes(MIN_SECRET_LEN).map_err(|e| CookieError::Crypto(e.to_string()))?;
        Ok(base64url_encode(&bytes))
    }

    /// Appends an HMAC-SHA256 tag: `value.tag`.
    pub fn sign(&self, value: &str) -> Result<String, CookieError> {
        let mut mac = self.signing_mac()?;
        mac.update(value.as_bytes());
        let tag = mac.finalize().into_bytes();
        Ok(format!("{value}.{}", base64url_encode(&tag)))
    }

    /// Checks the tag produced by [`sign`](Self::sign) and returns the bare value.
    pub fn verify(&self, signed: &str) -> Result<String, CookieError> {
        let (value, tag) = signed
            .rsplit_once('.')
            .ok_or_else(|| CookieError::Format("Signed value has no tag".to_string()))?;

        let tag = base64url_decode(tag).map_err(|e| CookieError::Format(e.to_string()))?;

        let mut mac = self.signing_mac()?;
        mac.update(value.as_bytes());
        mac.verify_slice(&tag)
            .map_err(|_| CookieError::Crypto("Signature mismatch".to_string()))?;

        Ok(value.to_string())
    }

    fn signing_mac(&self) -> Result<HmacSha256, CookieError> {
        HmacSha256::new_from_slice(&self.signing_key)
            .map_err(|e| CookieError::InvalidKey(e.to_string()))
    }
}

impl TokenCodec for CookieCodec {
    fn encrypt(&self, plaintext: &str) -> Result<String, CookieError> {
        let nonce_bytes: [u8; NONCE_LEN] = gen_random_bytes(NONCE_LEN)
            .map_err(|e| CookieError::Crypto(e.to_string()))?
            .try_into()
            .map_err(|_| CookieError::Crypto("Invalid nonce length".to_string()))?;

        let mut in_out = plaintext.as_bytes().to_vec();
        self.encryption_key
            .seal_in_place_append_tag(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::empty(),
                &mut in_out,
            )
            .map_err(|_| CookieError::Crypto("Encryption failed".to_string()))?;

        let mut output = Vec::with_capacity(NONCE_LEN + in_out.len());
        output.extend_from_slice(&nonce_bytes);
        output.extend_from_slice(&in_out);
        Ok(base64url_encode(&output))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, CookieError> {
        let data = base64url_decode(ciphertext).map_err(|e| CookieError::Format(e.to_string()))?;

        if data.len() < NONCE_LEN + TAG_LEN {
            return Err(CookieError::Format("Ciphertext too short".to_string()));
        }

        let (nonce_bytes, sealed) = data.split_at(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
            .map_err(|_| CookieError::Format("Invalid nonce".to_string()))?;

        let mut in_out = sealed.to_vec();
        let plaintext = self
            .encryption_key
            .open_in_place(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| CookieError::Crypto("Decryption failed".to_string()))?;

        String::from_utf8(plaintext.to_vec())
            .map_err(|_| CookieError::Format("Plaintext is not valid UTF-8".to_string()))
    }
}

fn derive_key(secret: &[u8], label: &[u8]) -> Result<[u8; 32], CookieError> {
    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|e| CookieError::InvalidKey(e.to_string()))?;
    mac.update(label);
    let digest = mac.finalize().into_bytes();

    let mut key = [0u8; 32];
    key.copy_from_slice(&digest);
    Ok(key)
}
