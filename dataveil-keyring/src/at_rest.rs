//! At-rest protection for key material.
//!
//! The key-ring manager wraps raw key material immediately before repository
//! writes and unwraps it immediately after reads, so repositories only ever
//! see opaque bytes. Hosts with a platform key vault or HSM implement
//! [`KeyAtRestProtector`] against it; [`SealedAtRest`] covers the common
//! case of a locally held key-encryption key.

use crate::error::{KeyRingError, KeyRingResult};
use dataveil_crypto::{open, seal, AeadAlgorithm, DerivedKey};

const AT_REST_AAD: &[u8] = b"dataveil.key-at-rest.v1";

/// Encrypts and decrypts raw key material around repository I/O.
pub trait KeyAtRestProtector: Send + Sync {
    /// Encrypts raw key material for storage.
    fn wrap(&self, raw: &[u8]) -> KeyRingResult<Vec<u8>>;

    /// Decrypts key material loaded from storage.
    fn unwrap(&self, wrapped: &[u8]) -> KeyRingResult<Vec<u8>>;
}

/// Pass-through protector that stores material unencrypted.
///
/// For tests and development only; the deliberately blunt name keeps it from
/// slipping into production configuration unnoticed.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlaintextAtRest;

impl KeyAtRestProtector for PlaintextAtRest {
    fn wrap(&self, raw: &[u8]) -> KeyRingResult<Vec<u8>> {
        Ok(raw.to_vec())
    }

    fn unwrap(&self, wrapped: &[u8]) -> KeyRingResult<Vec<u8>> {
        Ok(wrapped.to_vec())
    }
}

/// Wraps key material with XChaCha20-Poly1305 under a caller-supplied
/// 256-bit key-encryption key. Output layout is nonce followed by
/// ciphertext and tag.
pub struct SealedAtRest {
    kek: DerivedKey,
}

impl SealedAtRest {
    pub fn new(kek: DerivedKey) -> Self {
        Self { kek }
    }
}

impl KeyAtRestProtector for SealedAtRest {
    fn wrap(&self, raw: &[u8]) -> KeyRingResult<Vec<u8>> {
        let sealed = seal(AeadAlgorithm::XChaCha20Poly1305, &self.kek, AT_REST_AAD, raw)
            .map_err(|e| KeyRingError::AtRest(e.to_string()))?;
        let mut out = sealed.nonce;
        out.extend_from_slice(&sealed.ciphertext);
        Ok(out)
    }

    fn unwrap(&self, wrapped: &[u8]) -> KeyRingResult<Vec<u8>> {
        let nonce_len = AeadAlgorithm::XChaCha20Poly1305.nonce_len();
        if wrapped.len() < nonce_len {
            return Err(KeyRingError::AtRest(
                "wrapped material shorter than nonce".to_string(),
            ));
        }
        let (nonce, ciphertext) = wrapped.split_at(nonce_len);
        open(
            AeadAlgorithm::XChaCha20Poly1305,
            &self.kek,
            AT_REST_AAD,
            nonce,
            ciphertext,
        )
        .map_err(|e| KeyRingError::AtRest(e.to_string()))
    }
}
