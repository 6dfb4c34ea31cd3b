//! The key model: in-memory keys with zeroized material and their
//! persisted, at-rest-wrapped record form.

use crate::at_rest::KeyAtRestProtector;
use crate::error::{KeyRingError, KeyRingResult};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use dataveil_crypto::AeadAlgorithm;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Raw key material. Zeroized on drop, redacted in debug output.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
struct KeyMaterial(Vec<u8>);

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyMaterial({} bytes)", self.0.len())
    }
}

/// Lifecycle status of a key at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyStatus {
    /// Usable for both encryption and decryption.
    Active,
    /// Created but not yet activated; exists so other readers can learn
    /// about it before it becomes the default.
    ActivatingSoon,
    /// Past its expiration time; decrypt-only.
    Expired,
    /// Explicitly revoked; decrypt-only, and only behind an explicit opt-in.
    Revoked,
}

/// A unit of key material with its lifecycle metadata.
///
/// Keys are immutable once created; rotation always creates a new key, and
/// revocation is recorded in the repository and reflected in the next ring
/// snapshot.
#[derive(Clone, Debug)]
pub struct Key {
    id: Uuid,
    created_at: DateTime<Utc>,
    activates_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
    algorithm: AeadAlgorithm,
    material: KeyMaterial,
}

impl Key {
    /// Creates a key with fresh random material under a caller-chosen id
    /// (random for bootstrap keys, deterministic for rotation successors).
    ///
    /// Enforces `created_at <= activates_at < expires_at`.
    pub fn generate(
        id: Uuid,
        created_at: DateTime<Utc>,
        activates_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        algorithm: AeadAlgorithm,
        material_len: usize,
    ) -> KeyRingResult<Self> {
        let mut material = vec![0u8; material_len];
        rand::rng().fill_bytes(&mut material);
        Self::from_parts(
            id,
            created_at,
            activates_at,
            expires_at,
            None,
            algorithm,
            material,
        )
    }

    fn from_parts(
        id: Uuid,
        created_at: DateTime<Utc>,
        activates_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        revoked_at: Option<DateTime<Utc>>,
        algorithm: AeadAlgorithm,
        material: Vec<u8>,
    ) -> KeyRingResult<Self> {
        if created_at > activates_at || activates_at >= expires_at {
            return Err(KeyRingError::InvalidRecord {
                id,
                reason: format!(
                    "key times must satisfy created <= activates < expires \
                     (created {created_at}, activates {activates_at}, expires {expires_at})"
                ),
            });
        }
        if material.is_empty() {
            return Err(KeyRingError::InvalidRecord {
                id,
                reason: "key material is empty".to_string(),
            });
        }
        Ok(Self {
            id,
            created_at,
            activates_at,
            expires_at,
            revoked_at,
            algorithm,
            material: KeyMaterial(material),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn activates_at(&self) -> DateTime<Utc> {
        self.activates_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn revoked_at(&self) -> Option<DateTime<Utc>> {
        self.revoked_at
    }

    pub fn algorithm(&self) -> AeadAlgorithm {
        self.algorithm
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Raw master key material.
    ///
    /// # Security
    ///
    /// Zeroized when the key is dropped. Only purpose derivation should
    /// read this; never persist or log it.
    pub fn material(&self) -> &[u8] {
        &self.material.0
    }

    /// Computes the key's status at `now`. Revocation wins over expiry,
    /// expiry over activation.
    pub fn status(&self, now: DateTime<Utc>) -> KeyStatus {
        if self.revoked_at.is_some() {
            KeyStatus::Revoked
        } else if now >= self.expires_at {
            KeyStatus::Expired
        } else if now >= self.activates_at {
            KeyStatus::Active
        } else {
            KeyStatus::ActivatingSoon
        }
    }

    /// Converts to the persisted record form, wrapping the material with the
    /// at-rest protector so it never reaches storage in the clear.
    pub fn to_record(&self, at_rest: &dyn KeyAtRestProtector) -> KeyRingResult<KeyRecord> {
        let wrapped = at_rest.wrap(&self.material.0)?;
        Ok(KeyRecord {
            id: self.id,
            created_at: self.created_at,
            activates_at: self.activates_at,
            expires_at: self.expires_at,
            revoked_at: self.revoked_at,
            algorithm: self.algorithm,
            wrapped_material: BASE64.encode(wrapped),
        })
    }

    /// Reconstructs a key from its persisted record, unwrapping the
    /// material.
    pub fn from_record(
        record: &KeyRecord,
        at_rest: &dyn KeyAtRestProtector,
    ) -> KeyRingResult<Self> {
        let wrapped =
            BASE64
                .decode(&record.wrapped_material)
                .map_err(|e| KeyRingError::InvalidRecord {
                    id: record.id,
                    reason: format!("wrapped material is not valid base64: {e}"),
                })?;
        let material = at_rest.unwrap(&wrapped)?;
        Self::from_parts(
            record.id,
            record.created_at,
            record.activates_at,
            record.expires_at,
            record.revoked_at,
            record.algorithm,
            material,
        )
    }
}

/// The persisted form of a [`Key`].
///
/// Records are immutable once stored, except for the revocation fields.
/// `wrapped_material` is the at-rest-wrapped key material, base64 encoded.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeyRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub activates_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub algorithm: AeadAlgorithm,
    pub wrapped_material: String,
}

impl KeyRecord {
    /// Returns a copy with the revocation timestamp set. The only mutation
    /// a stored record ever sees.
    pub fn revoked(&self, at: DateTime<Utc>) -> Self {
        let mut record = self.clone();
        record.revoked_at = Some(at);
        record
    }
}
