//! Expiring payloads.
//!
//! Decorates a [`Protector`] by prefixing the plaintext with an 8-byte
//! big-endian expiry epoch (milliseconds) before encryption. The prefix
//! rides inside the ciphertext, so expiry is only checked after full
//! authentication: an attacker cannot distinguish an expired payload from a
//! tampered one without first producing a valid tag.

use crate::error::{ProtectError, ProtectResult};
use crate::protector::Protector;
use chrono::{DateTime, TimeDelta, Utc};
use dataveil_crypto::FormatError;
use dataveil_keyring::Clock;
use std::sync::Arc;

const EXPIRY_PREFIX_LEN: usize = 8;

/// A [`Protector`] whose payloads carry an expiration timestamp.
#[derive(Clone)]
pub struct TimeLimitedProtector {
    inner: Protector,
    clock: Arc<dyn Clock>,
}

impl TimeLimitedProtector {
    /// Wraps a protector. The clock is usually
    /// [`KeyRingManager::clock`](dataveil_keyring::KeyRingManager::clock)
    /// so expiry decisions agree with key lifecycle decisions.
    pub fn new(inner: Protector, clock: Arc<dyn Clock>) -> Self {
        Self { inner, clock }
    }

    /// Protects `plaintext` with a lifetime of `ttl` from now.
    pub fn protect(&self, plaintext: &[u8], ttl: TimeDelta) -> ProtectResult<Vec<u8>> {
        self.protect_until(plaintext, self.clock.now() + ttl)
    }

    /// Protects `plaintext` until the given instant.
    pub fn protect_until(
        &self,
        plaintext: &[u8],
        expires_at: DateTime<Utc>,
    ) -> ProtectResult<Vec<u8>> {
        let mut framed = Vec::with_capacity(EXPIRY_PREFIX_LEN + plaintext.len());
        framed.extend_from_slice(&expires_at.timestamp_millis().to_be_bytes());
        framed.extend_from_slice(plaintext);
        self.inner.protect(&framed)
    }

    /// Unprotects and validates expiry, rejecting revoked keys.
    pub fn unprotect(&self, payload: &[u8]) -> ProtectResult<Vec<u8>> {
        let framed = self.inner.unprotect(payload)?;
        self.strip_expiry(framed)
    }

    /// Unprotects and validates expiry, allowing revoked keys.
    pub fn unprotect_allowing_revoked(&self, payload: &[u8]) -> ProtectResult<Vec<u8>> {
        let framed = self.inner.unprotect_allowing_revoked(payload)?;
        self.strip_expiry(framed)
    }

    /// Runs only after successful authentication: by the time we look at
    /// the prefix, the payload is already known to be genuine.
    fn strip_expiry(&self, framed: Vec<u8>) -> ProtectResult<Vec<u8>> {
        if framed.len() < EXPIRY_PREFIX_LEN {
            return Err(ProtectError::Format(FormatError::MissingExpiry));
        }
        let (prefix, plaintext) = framed.split_at(EXPIRY_PREFIX_LEN);

        let mut millis_bytes = [0u8; EXPIRY_PREFIX_LEN];
        millis_bytes.copy_from_slice(prefix);
        let millis = i64::from_be_bytes(millis_bytes);
        let expires_at = DateTime::from_timestamp_millis(millis)
            .ok_or(ProtectError::Format(FormatError::MissingExpiry))?;

        if expires_at < self.clock.now() {
            return Err(ProtectError::Expired {
                expired_at: expires_at,
            });
        }
        Ok(plaintext.to_vec())
    }
}
