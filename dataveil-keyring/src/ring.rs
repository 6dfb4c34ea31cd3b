//! Immutable key-ring snapshots.

use crate::key::{Key, KeyStatus};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// An immutable snapshot of every known key plus the computed default.
///
/// Rings are rebuilt by the manager and swapped in atomically; they are
/// never mutated, so any number of threads can read one without
/// coordination.
#[derive(Clone, Debug)]
pub struct KeyRing {
    /// Keys ordered by activation time (ties by id).
    keys: Vec<Arc<Key>>,
    by_id: HashMap<Uuid, usize>,
    default_key_id: Option<Uuid>,
    /// Instant the snapshot was computed against.
    as_of: DateTime<Utc>,
}

impl KeyRing {
    /// Builds a snapshot from loaded keys, computing every status against
    /// `now` and selecting the default.
    ///
    /// Default selection is deterministic: among keys that are neither
    /// revoked nor expired and whose activation is no further than
    /// `clock_skew` in the future, the maximum `(activates_at, id)` wins.
    pub fn build(keys: Vec<Key>, now: DateTime<Utc>, clock_skew: TimeDelta) -> Self {
        let mut keys: Vec<Arc<Key>> = keys.into_iter().map(Arc::new).collect();
        keys.sort_by_key(|k| (k.activates_at(), k.id()));

        let by_id = keys
            .iter()
            .enumerate()
            .map(|(i, k)| (k.id(), i))
            .collect();

        let horizon = now + clock_skew;
        let default_key_id = keys
            .iter()
            .filter(|k| {
                !k.is_revoked() && now < k.expires_at() && k.activates_at() <= horizon
            })
            .max_by_key(|k| (k.activates_at(), k.id()))
            .map(|k| k.id());

        Self {
            keys,
            by_id,
            default_key_id,
            as_of: now,
        }
    }

    /// Id of the current default encryption key, if any key is eligible.
    pub fn default_key_id(&self) -> Option<Uuid> {
        self.default_key_id
    }

    /// The current default encryption key.
    pub fn default_key(&self) -> Option<&Arc<Key>> {
        self.default_key_id.and_then(|id| self.key(&id))
    }

    /// Looks up any key by id, regardless of status. Decryption must reach
    /// expired and revoked keys; only the default selection is restrictive.
    pub fn key(&self, id: &Uuid) -> Option<&Arc<Key>> {
        self.by_id.get(id).map(|&i| &self.keys[i])
    }

    /// All keys, ordered by activation time.
    pub fn keys(&self) -> impl Iterator<Item = &Arc<Key>> {
        self.keys.iter()
    }

    /// Status of a key in this snapshot, computed against the snapshot's
    /// own timestamp.
    pub fn status(&self, id: &Uuid) -> Option<KeyStatus> {
        self.key(id).map(|k| k.status(self.as_of))
    }

    /// The instant this snapshot was computed against.
    pub fn as_of(&self) -> DateTime<Utc> {
        self.as_of
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
