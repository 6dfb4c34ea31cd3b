//! Cryptographic core for Dataveil.
//!
//! Provides the three pure building blocks of the data-protection system:
//!
//! 1. **Purpose chains**: ordered lists of purpose strings with a canonical
//!    binary encoding and an HKDF-SHA256 sub-key derivation, so every purpose
//!    gets its own key without persisting anything per purpose.
//! 2. **Authenticated encryption**: XChaCha20-Poly1305 seal/open with
//!    associated data, behind an algorithm-id registry.
//! 3. **Payload codec**: the versioned, self-describing binary envelope that
//!    carries key id, algorithm id, nonce, ciphertext, and tag.
//!
//! Everything in this crate is CPU-bound and free of I/O; key lifecycle and
//! storage live in `dataveil-keyring`.

mod encryptor;
mod error;
mod payload;
mod purpose;

pub use encryptor::{open, seal, AeadAlgorithm, SealedBox};
pub use error::{CryptoError, CryptoResult, FormatError};
pub use payload::{Envelope, FORMAT_VERSION};
pub use purpose::{DerivedKey, PurposeChain, SUBKEY_SIZE};
