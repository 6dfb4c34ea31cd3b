//! Caller-facing error taxonomy for protect/unprotect.
//!
//! Each variant demands a different caller response, so they are explicit
//! enum cases rather than an exception-style hierarchy: tampering is never
//! retriable, a revoked key needs an explicit opt-in, expiry is a business
//! outcome, and configuration problems are fatal at creation time.

use chrono::{DateTime, Utc};
use dataveil_keyring::KeyRingError;
use thiserror::Error;
use uuid::Uuid;

/// Result type for protector operations.
pub type ProtectResult<T> = Result<T, ProtectError>;

/// Errors surfaced by [`crate::Protector`] and
/// [`crate::TimeLimitedProtector`].
#[derive(Debug, Error)]
pub enum ProtectError {
    /// Authentication failed. Wrong purpose chain, wrong key, and a
    /// corrupted payload are deliberately indistinguishable.
    #[error("payload failed authentication (wrong purpose chain or tampered)")]
    Tampered,

    /// The payload references a key absent from the ring. Retrying cannot
    /// help; the key either never existed here or was deleted out of band.
    #[error("payload references unknown key {key_id}")]
    KeyNotFound { key_id: Uuid },

    /// The governing key is revoked and the caller did not opt into
    /// revoked-key decryption.
    #[error("key {key_id} has been revoked")]
    KeyRevoked { key_id: Uuid },

    /// A time-limited payload authenticated successfully but its embedded
    /// expiry has passed.
    #[error("payload expired at {expired_at}")]
    Expired { expired_at: DateTime<Utc> },

    /// The payload envelope could not be understood.
    #[error("payload format error: {0}")]
    Format(#[from] dataveil_crypto::FormatError),

    /// No usable default key, or an internal derivation invariant failed.
    #[error("protector configuration error: {0}")]
    Configuration(String),

    /// The key ring could not be loaded at all (no cached snapshot).
    #[error(transparent)]
    KeyRing(#[from] KeyRingError),
}
