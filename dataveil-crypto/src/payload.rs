//! The self-describing payload envelope.
//!
//! Wire layout (version 1):
//!
//! ```text
//! byte 0        : format version
//! bytes 1-16    : key id (uuid, big-endian)
//! byte 17       : algorithm id
//! bytes 18..    : nonce (algorithm-defined length)
//! ..trailing    : ciphertext followed by the authentication tag
//! ```
//!
//! The purpose chain is deliberately *not* stored: it is mixed into key
//! derivation and associated data, so a payload presented under the wrong
//! purpose fails authentication instead of silently decrypting.

use crate::encryptor::{min_sealed_len, AeadAlgorithm};
use crate::error::{CryptoResult, FormatError};
use uuid::Uuid;

/// Current envelope format version.
pub const FORMAT_VERSION: u8 = 1;

/// Fixed header size: version byte + key id + algorithm byte.
const HEADER_LEN: usize = 1 + 16 + 1;

/// A decoded payload envelope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    /// Id of the key the payload was sealed under.
    pub key_id: Uuid,
    /// AEAD primitive used.
    pub algorithm: AeadAlgorithm,
    /// Per-payload nonce.
    pub nonce: Vec<u8>,
    /// Ciphertext with the authentication tag appended.
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    /// Serializes the envelope to the version-1 wire layout.
    pub fn encode(&self) -> Vec<u8> {
        let mut out =
            Vec::with_capacity(HEADER_LEN + self.nonce.len() + self.ciphertext.len());
        out.push(FORMAT_VERSION);
        out.extend_from_slice(self.key_id.as_bytes());
        out.push(self.algorithm.id());
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Parses an envelope, rejecting anything it does not fully understand.
    ///
    /// An unknown version or algorithm id is an explicit [`FormatError`];
    /// the codec never guesses a layout.
    pub fn decode(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(FormatError::Truncated(bytes.len()).into());
        }

        let version = bytes[0];
        if version != FORMAT_VERSION {
            return Err(FormatError::UnknownVersion(version).into());
        }

        let mut id_bytes = [0u8; 16];
        id_bytes.copy_from_slice(&bytes[1..17]);
        let key_id = Uuid::from_bytes(id_bytes);

        let algorithm = AeadAlgorithm::from_id(bytes[17])
            .ok_or(FormatError::UnknownAlgorithm(bytes[17]))?;

        let body = &bytes[HEADER_LEN..];
        if body.len() < min_sealed_len(algorithm) {
            return Err(FormatError::Truncated(bytes.len()).into());
        }

        let (nonce, ciphertext) = body.split_at(algorithm.nonce_len());
        Ok(Self {
            key_id,
            algorithm,
            nonce: nonce.to_vec(),
            ciphertext: ciphertext.to_vec(),
        })
    }
}
