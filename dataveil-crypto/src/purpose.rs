//! Purpose chains and sub-key derivation.
//!
//! A purpose chain is an ordered, non-empty list of strings that scopes a
//! protector (e.g. `["App", "Email", "Confirm"]`). Two different chains can
//! never decrypt each other's payloads: the chain is folded through
//! HKDF-SHA256 to derive a purpose-specific sub-key from the master key
//! material, and its canonical encoding is bound into the AEAD associated
//! data.

use crate::error::{CryptoError, CryptoResult};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of a derived sub-key in bytes (matches the AEAD key size).
pub const SUBKEY_SIZE: usize = 32;

/// Domain-separation salt for purpose derivation. Versioned so a future
/// derivation change cannot silently produce colliding sub-keys.
const DERIVE_SALT: &[u8] = b"dataveil.purpose.v1";

/// A 256-bit derived sub-key. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; SUBKEY_SIZE]);

impl DerivedKey {
    /// Wraps raw key bytes. Intended for at-rest key-encryption keys and
    /// tests; protectors obtain derived keys via [`PurposeChain::derive_subkey`].
    pub fn from_bytes(bytes: [u8; SUBKEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Generates a random key from the OS entropy pool.
    pub fn random() -> Self {
        let mut bytes = [0u8; SUBKEY_SIZE];
        rand::rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Returns the raw key bytes.
    ///
    /// # Security
    ///
    /// The returned slice is zeroized when the key is dropped. Do not store
    /// copies beyond the encrypt/decrypt call that needs them.
    pub fn as_bytes(&self) -> &[u8; SUBKEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}

/// An ordered, non-empty chain of purpose strings.
///
/// Equality is order- and case-sensitive. Extending a chain with
/// [`PurposeChain::child`] and deriving is byte-identical to deriving over
/// the full chain in one call.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PurposeChain {
    segments: Vec<String>,
}

impl PurposeChain {
    /// Creates a chain from an ordered list of segments.
    ///
    /// Returns [`CryptoError::EmptyPurposeChain`] for an empty list.
    pub fn new<I, S>(segments: I) -> CryptoResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(CryptoError::EmptyPurposeChain);
        }
        Ok(Self { segments })
    }

    /// Creates a single-segment chain.
    pub fn root(segment: impl Into<String>) -> Self {
        Self {
            segments: vec![segment.into()],
        }
    }

    /// Returns a new chain with `segment` appended.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// The chain's segments, in order.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Canonical binary encoding: each segment UTF-8 encoded and prefixed
    /// with its byte length as 4 bytes big-endian, concatenated in order.
    ///
    /// The length prefix keeps distinct chains distinct: `["A", "BC"]` and
    /// `["AB", "C"]` encode differently. This exact encoding is also used as
    /// AEAD associated data, so it must never change for a given format
    /// version.
    pub fn canonical_encoding(&self) -> Vec<u8> {
        let total: usize = self.segments.iter().map(|s| 4 + s.len()).sum();
        let mut out = Vec::with_capacity(total);
        for segment in &self.segments {
            out.extend_from_slice(&(segment.len() as u32).to_be_bytes());
            out.extend_from_slice(segment.as_bytes());
        }
        out
    }

    /// Derives the purpose-specific sub-key from master key material.
    ///
    /// The chain is folded left-to-right: each segment's length-prefixed
    /// encoding is the HKDF `info` for one derivation step, whose output is
    /// the input key material for the next. Folding makes chaining truly
    /// associative: deriving `[A, B]` equals deriving `A` and then deriving
    /// `B` from the result, byte for byte.
    ///
    /// Pure function of `(master, chain)`: no I/O, no shared state.
    pub fn derive_subkey(&self, master: &[u8]) -> CryptoResult<DerivedKey> {
        let mut parent = [0u8; SUBKEY_SIZE];
        let mut first = true;
        for segment in &self.segments {
            let mut info = Vec::with_capacity(4 + segment.len());
            info.extend_from_slice(&(segment.len() as u32).to_be_bytes());
            info.extend_from_slice(segment.as_bytes());

            let ikm: &[u8] = if first { master } else { &parent };
            let hk = Hkdf::<Sha256>::new(Some(DERIVE_SALT), ikm);
            let mut okm = [0u8; SUBKEY_SIZE];
            hk.expand(&info, &mut okm)
                .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
            parent.zeroize();
            parent = okm;
            first = false;
        }
        Ok(DerivedKey(parent))
    }
}

impl std::fmt::Display for PurposeChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}
