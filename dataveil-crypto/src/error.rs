//! Crypto layer error types.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in the cryptographic core.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// A purpose chain must contain at least one segment.
    #[error("purpose chain must not be empty")]
    EmptyPurposeChain,

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Deliberately carries no detail: wrong key, wrong associated data,
    /// and a corrupted ciphertext or tag are indistinguishable to callers.
    #[error("authentication failed (wrong key, wrong purpose, or tampered payload)")]
    Authentication,

    #[error("payload format error: {0}")]
    Format(#[from] FormatError),
}

/// Errors from the payload envelope codec.
///
/// Format errors are fatal for the payload in question; the codec never
/// guesses a layout for an envelope it does not understand.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("payload truncated: {0} bytes is shorter than the minimum envelope")]
    Truncated(usize),

    #[error("unknown payload format version {0}")]
    UnknownVersion(u8),

    #[error("unknown algorithm id {0:#04x}")]
    UnknownAlgorithm(u8),

    #[error("time-limited payload is missing its expiry prefix")]
    MissingExpiry,
}
