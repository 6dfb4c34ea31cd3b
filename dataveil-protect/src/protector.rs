//! Purpose-scoped protect/unprotect.

use crate::error::{ProtectError, ProtectResult};
use dataveil_crypto::{open, seal, CryptoError, Envelope, PurposeChain};
use dataveil_keyring::KeyRingManager;
use std::sync::Arc;
use uuid::Uuid;

/// Builds [`Protector`]s bound to purpose chains.
///
/// The factory carries the key-ring manager as an explicit dependency;
/// there is no process-wide ambient key ring.
#[derive(Clone)]
pub struct ProtectorFactory {
    manager: Arc<KeyRingManager>,
}

impl ProtectorFactory {
    pub fn new(manager: Arc<KeyRingManager>) -> Self {
        Self { manager }
    }

    /// Creates a protector bound to `chain`.
    ///
    /// Fails with [`ProtectError::Configuration`] when the ring has no
    /// default key (possible only with auto-generation disabled), so a
    /// misconfigured host fails at creation time rather than on the first
    /// protect call.
    pub fn protector(&self, chain: PurposeChain) -> ProtectResult<Protector> {
        let ring = self.manager.current_ring().map_err(|e| match e {
            dataveil_keyring::KeyRingError::NoEligibleKey => {
                ProtectError::Configuration(e.to_string())
            }
            other => ProtectError::KeyRing(other),
        })?;
        if ring.default_key_id().is_none() {
            return Err(ProtectError::Configuration(
                "key ring has no default encryption key".to_string(),
            ));
        }
        Ok(Protector {
            manager: Arc::clone(&self.manager),
            chain,
        })
    }
}

/// Encrypts and decrypts opaque payloads under a fixed purpose chain.
///
/// Cheap to clone and safe to share across threads; every call reads the
/// key ring snapshot current at that moment.
#[derive(Clone)]
pub struct Protector {
    manager: Arc<KeyRingManager>,
    chain: PurposeChain,
}

impl std::fmt::Debug for Protector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Protector({})", self.chain)
    }
}

impl Protector {
    /// The purpose chain this protector is bound to.
    pub fn purposes(&self) -> &PurposeChain {
        &self.chain
    }

    /// Returns a protector for this chain extended by one segment.
    ///
    /// Equivalent, payload for payload, to building a protector on the full
    /// chain directly.
    pub fn sub_protector(&self, segment: impl Into<String>) -> Protector {
        Protector {
            manager: Arc::clone(&self.manager),
            chain: self.chain.child(segment),
        }
    }

    /// Protects `plaintext` under the current default key.
    pub fn protect(&self, plaintext: &[u8]) -> ProtectResult<Vec<u8>> {
        let ring = self.manager.current_ring()?;
        let key = ring.default_key().ok_or_else(|| {
            ProtectError::Configuration("key ring has no default encryption key".to_string())
        })?;

        let subkey = self
            .chain
            .derive_subkey(key.material())
            .map_err(configuration)?;
        let aad = associated_data(&self.chain, key.id());
        let sealed =
            seal(key.algorithm(), &subkey, &aad, plaintext).map_err(configuration)?;

        Ok(Envelope {
            key_id: key.id(),
            algorithm: key.algorithm(),
            nonce: sealed.nonce,
            ciphertext: sealed.ciphertext,
        }
        .encode())
    }

    /// Unprotects a payload, rejecting revoked keys.
    pub fn unprotect(&self, payload: &[u8]) -> ProtectResult<Vec<u8>> {
        self.unprotect_inner(payload, false)
    }

    /// Unprotects a payload even if its governing key is revoked.
    ///
    /// The explicit opt-in keeps "the key was revoked" a deliberate caller
    /// decision instead of a silent default.
    pub fn unprotect_allowing_revoked(&self, payload: &[u8]) -> ProtectResult<Vec<u8>> {
        self.unprotect_inner(payload, true)
    }

    /// Decode → look up key → derive → open. A pure function of the payload
    /// and the current ring; no step is retried.
    fn unprotect_inner(&self, payload: &[u8], allow_revoked: bool) -> ProtectResult<Vec<u8>> {
        let envelope = Envelope::decode(payload).map_err(unprotect_error)?;

        let ring = self.manager.current_ring()?;
        // Any key in the ring may decrypt, not just the default; old
        // payloads must outlive rotation.
        let key = ring.key(&envelope.key_id).ok_or(ProtectError::KeyNotFound {
            key_id: envelope.key_id,
        })?;

        if key.is_revoked() && !allow_revoked {
            return Err(ProtectError::KeyRevoked { key_id: key.id() });
        }

        let subkey = self
            .chain
            .derive_subkey(key.material())
            .map_err(configuration)?;
        let aad = associated_data(&self.chain, key.id());
        open(
            envelope.algorithm,
            &subkey,
            &aad,
            &envelope.nonce,
            &envelope.ciphertext,
        )
        .map_err(unprotect_error)
    }
}

/// Associated data binding a payload to its purpose chain and key: the
/// chain's canonical encoding followed by the key id. Swapping either
/// without re-deriving fails authentication.
fn associated_data(chain: &PurposeChain, key_id: Uuid) -> Vec<u8> {
    let mut aad = chain.canonical_encoding();
    aad.extend_from_slice(key_id.as_bytes());
    aad
}

/// Maps crypto errors on the unprotect path: authentication failures become
/// [`ProtectError::Tampered`], format errors keep their identity, anything
/// else is an internal invariant breach.
fn unprotect_error(e: CryptoError) -> ProtectError {
    match e {
        CryptoError::Authentication => ProtectError::Tampered,
        CryptoError::Format(f) => ProtectError::Format(f),
        other => ProtectError::Configuration(other.to_string()),
    }
}

fn configuration(e: CryptoError) -> ProtectError {
    ProtectError::Configuration(e.to_string())
}
