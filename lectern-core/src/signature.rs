//! Callback signatures
//!
//! Outcome reports are authenticated with HMAC-SHA256 over the raw request
//! body, keyed with a secret shared by the worker and the api. The api
//! recomputes the code and compares it in constant time; nothing that
//! mutates a job may skip [`CallbackSecret::verify`].

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Shared secret used to sign and verify outcome reports
#[derive(Clone)]
pub struct CallbackSecret(Vec<u8>);

impl fmt::Debug for CallbackSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CallbackSecret(<redacted>)")
    }
}

/// Errors produced while signing or verifying
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("callback secret is empty")]
    EmptySecret,

    #[error("callback secret rejected by MAC: {0}")]
    InvalidKey(String),

    #[error("signature is missing")]
    Missing,

    #[error("signature is not valid hex")]
    Malformed,

    #[error("signature does not match payload")]
    Mismatch,
}

impl CallbackSecret {
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, SignatureError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(SignatureError::EmptySecret);
        }
        Ok(Self(secret))
    }

    /// Hex-encoded HMAC-SHA256 of `payload`
    pub fn sign(&self, payload: &[u8]) -> Result<String, SignatureError> {
        Ok(hex::encode(self.mac(payload)?))
    }

    /// Check `signature` (hex) against `payload`.
    pub fn verify(&self, payload: &[u8], signature: Option<&str>) -> Result<(), SignatureError> {
        let signature = signature
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(SignatureError::Missing)?;
        let provided = hex::decode(signature).map_err(|_| SignatureError::Malformed)?;
        let expected = self.mac(payload)?;

        if provided.len() != expected.len() {
            return Err(SignatureError::Mismatch);
        }
        if bool::from(provided.ct_eq(expected.as_slice())) {
            Ok(())
        } else {
            Err(SignatureError::Mismatch)
        }
    }

    fn mac(&self, payload: &[u8]) -> Result<Vec<u8>, SignatureError> {
        let mut mac = HmacSha256::new_from_slice(&self.0)
            .map_err(|e| SignatureError::InvalidKey(e.to_string()))?;
        mac.update(payload);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}
