//! Authenticated encryption behind an algorithm-id registry.
//!
//! Currently a single AEAD is registered: XChaCha20-Poly1305 (24-byte nonce,
//! so random nonces are safe at any volume). The registry exists so a new
//! primitive can be added under a new id without breaking the payload format.

use crate::error::{CryptoError, CryptoResult};
use crate::purpose::DerivedKey;
use chacha20poly1305::aead::{Aead, Payload};
use chacha20poly1305::{KeyInit, XChaCha20Poly1305, XNonce};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Registered AEAD primitives, identified by the algorithm byte in the
/// payload envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AeadAlgorithm {
    /// XChaCha20-Poly1305 with a 192-bit nonce and 128-bit tag.
    XChaCha20Poly1305,
}

impl AeadAlgorithm {
    /// The wire identifier stored in the payload envelope.
    pub const fn id(self) -> u8 {
        match self {
            Self::XChaCha20Poly1305 => 0x01,
        }
    }

    /// Looks up an algorithm by its wire identifier.
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0x01 => Some(Self::XChaCha20Poly1305),
            _ => None,
        }
    }

    /// Key size in bytes.
    pub const fn key_len(self) -> usize {
        match self {
            Self::XChaCha20Poly1305 => 32,
        }
    }

    /// Nonce size in bytes.
    pub const fn nonce_len(self) -> usize {
        match self {
            Self::XChaCha20Poly1305 => 24,
        }
    }

    /// Authentication tag size in bytes.
    pub const fn tag_len(self) -> usize {
        match self {
            Self::XChaCha20Poly1305 => 16,
        }
    }
}

/// Output of [`seal`]: a fresh nonce plus ciphertext with the tag appended,
/// exactly as the AEAD emits it.
#[derive(Clone, Debug)]
pub struct SealedBox {
    pub nonce: Vec<u8>,
    /// Ciphertext followed by the authentication tag.
    pub ciphertext: Vec<u8>,
}

/// Encrypts `plaintext` under `key`, authenticating `aad` alongside it.
///
/// A fresh random nonce is generated per call and never reused for a key.
pub fn seal(
    algorithm: AeadAlgorithm,
    key: &DerivedKey,
    aad: &[u8],
    plaintext: &[u8],
) -> CryptoResult<SealedBox> {
    match algorithm {
        AeadAlgorithm::XChaCha20Poly1305 => {
            let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
            let mut nonce = vec![0u8; algorithm.nonce_len()];
            rand::rng().fill_bytes(&mut nonce);

            let ciphertext = cipher
                .encrypt(
                    XNonce::from_slice(&nonce),
                    Payload {
                        msg: plaintext,
                        aad,
                    },
                )
                .map_err(|_| CryptoError::Authentication)?;

            Ok(SealedBox { nonce, ciphertext })
        }
    }
}

/// Decrypts and verifies a sealed box.
///
/// Verification is constant-time in the underlying primitive, and every
/// failure mode collapses into [`CryptoError::Authentication`]: a caller (or
/// attacker) cannot tell a wrong key from wrong associated data from a
/// flipped ciphertext bit.
pub fn open(
    algorithm: AeadAlgorithm,
    key: &DerivedKey,
    aad: &[u8],
    nonce: &[u8],
    ciphertext: &[u8],
) -> CryptoResult<Vec<u8>> {
    match algorithm {
        AeadAlgorithm::XChaCha20Poly1305 => {
            if nonce.len() != algorithm.nonce_len() || ciphertext.len() < algorithm.tag_len() {
                return Err(CryptoError::Authentication);
            }
            let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
            cipher
                .decrypt(
                    XNonce::from_slice(nonce),
                    Payload {
                        msg: ciphertext,
                        aad,
                    },
                )
                .map_err(|_| CryptoError::Authentication)
        }
    }
}

/// Minimum sealed size for an algorithm (nonce + empty ciphertext + tag).
/// Used by the codec to reject truncated envelopes early.
pub(crate) fn min_sealed_len(algorithm: AeadAlgorithm) -> usize {
    algorithm.nonce_len() + algorithm.tag_len()
}
