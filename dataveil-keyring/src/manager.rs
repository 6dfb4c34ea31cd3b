//! The key-ring manager: single source of truth for key lifecycle.
//!
//! Publishes immutable [`KeyRing`] snapshots through an atomic swap, so any
//! number of protector threads read the current ring without locks while a
//! refresh (the only I/O path) rebuilds the next snapshot. Readers always
//! observe either the old ring or the new one, never a torn state.

use crate::at_rest::KeyAtRestProtector;
use crate::clock::Clock;
use crate::config::KeyRingOptions;
use crate::error::{KeyRingError, KeyRingResult};
use crate::key::{Key, KeyRecord};
use crate::repository::KeyRepository;
use crate::ring::KeyRing;
use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Namespace for deterministic rotation-successor ids. Two processes
/// rotating the same predecessor compute the same successor id, so the
/// repository's conditional insert acts as the rotation lease: exactly one
/// insert wins and the loser adopts the winner's key.
const ROTATION_NAMESPACE: Uuid = Uuid::from_bytes([
    0x6b, 0x1f, 0x0e, 0x2d, 0x8c, 0x5a, 0x4f, 0x3b, 0x9e, 0x7d, 0x1a, 0x42, 0xc0, 0x58, 0x21,
    0x9f,
]);

/// Owns key generation, rotation scheduling, revocation bookkeeping, and
/// atomic publication of [`KeyRing`] snapshots.
///
/// The manager is an explicit dependency: hosts construct one and hand it
/// (behind an `Arc`) to protector factories. There is no ambient singleton.
pub struct KeyRingManager {
    repository: Arc<dyn KeyRepository>,
    at_rest: Arc<dyn KeyAtRestProtector>,
    clock: Arc<dyn Clock>,
    options: KeyRingOptions,
    current: ArcSwapOption<KeyRing>,
    /// Serializes refresh/rotation so one process never generates two
    /// bootstrap keys concurrently. Readers never take this lock.
    refresh_lock: Mutex<()>,
}

impl KeyRingManager {
    /// Creates a manager. Performs no I/O; the first ring load happens
    /// lazily on the first [`KeyRingManager::current_ring`] call.
    pub fn new(
        repository: Arc<dyn KeyRepository>,
        at_rest: Arc<dyn KeyAtRestProtector>,
        clock: Arc<dyn Clock>,
        options: KeyRingOptions,
    ) -> Self {
        Self {
            repository,
            at_rest,
            clock,
            options,
            current: ArcSwapOption::const_empty(),
            refresh_lock: Mutex::new(()),
        }
    }

    /// The manager's clock, shared with time-limited protectors so expiry
    /// decisions agree with key lifecycle decisions.
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    pub fn options(&self) -> &KeyRingOptions {
        &self.options
    }

    /// Returns the latest published snapshot, loading from the repository
    /// only if no snapshot exists yet.
    pub fn current_ring(&self) -> KeyRingResult<Arc<KeyRing>> {
        if let Some(ring) = self.current.load_full() {
            return Ok(ring);
        }
        self.refresh()
    }

    /// Reloads from the repository, recomputes every key's status and the
    /// default, and atomically swaps in the new snapshot.
    ///
    /// Safe to call concurrently with readers. A repository failure is
    /// absorbed when a cached ring exists (the stale ring keeps serving and
    /// the failure is logged); with no cached ring it is fatal.
    pub fn refresh(&self) -> KeyRingResult<Arc<KeyRing>> {
        let _guard = self.lock_refresh();
        match self.load_ring() {
            Ok(ring) => {
                self.current.store(Some(Arc::clone(&ring)));
                debug!(
                    "published key ring snapshot: {} keys, default {:?}",
                    ring.len(),
                    ring.default_key_id()
                );
                Ok(ring)
            }
            Err(e) => match self.current.load_full() {
                Some(cached) => {
                    warn!("key ring refresh failed, serving cached snapshot: {e}");
                    Ok(cached)
                }
                None => Err(e),
            },
        }
    }

    /// Creates a rotation successor when the default key's remaining
    /// validity has dropped to the rotation margin or below.
    ///
    /// The successor activates one propagation window in the future so
    /// other readers pick it up before it becomes the default. Losing the
    /// cross-process race surfaces as `Ok(None)`: the winner's key is
    /// adopted on the refresh that follows.
    pub fn rotate_if_needed(&self) -> KeyRingResult<Option<Uuid>> {
        let ring = self.current_ring()?;
        let Some(default) = ring.default_key() else {
            return Err(KeyRingError::NoEligibleKey);
        };

        let now = self.clock.now();
        if default.expires_at() - now > self.options.rotation_margin() {
            return Ok(None);
        }

        // Walk the deterministic id chain past any successor that was
        // revoked or has already expired; a dead successor must not block
        // rotation until the default itself runs out.
        let mut successor_id = Uuid::new_v5(&ROTATION_NAMESPACE, default.id().as_bytes());
        loop {
            match ring.key(&successor_id) {
                Some(existing) if existing.is_revoked() || now >= existing.expires_at() => {
                    successor_id = Uuid::new_v5(&ROTATION_NAMESPACE, successor_id.as_bytes());
                }
                Some(_) => {
                    // Usable successor already propagating.
                    return Ok(None);
                }
                None => break,
            }
        }

        let activates_at = now + self.options.propagation_window();
        match self.create_key(successor_id, now, activates_at) {
            Ok(()) => {
                info!(
                    "rotated key ring: {} succeeds {}, activates at {activates_at}",
                    successor_id,
                    default.id()
                );
                self.refresh()?;
                Ok(Some(successor_id))
            }
            Err(KeyRingError::Conflict(_)) => {
                debug!("lost rotation race for successor {successor_id}, adopting the winner's key");
                self.refresh()?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Marks a key revoked and republishes the ring.
    ///
    /// Material is never deleted: payloads issued under the key stay
    /// decryptable behind the caller's explicit allow-revoked opt-in.
    /// Revoking an already-revoked key is a no-op.
    pub fn revoke(&self, key_id: Uuid) -> KeyRingResult<()> {
        let records = self.repository.list().map_err(reclassify_unavailable)?;
        let record = records
            .into_iter()
            .find(|r| r.id == key_id)
            .ok_or(KeyRingError::NotFound(key_id))?;

        if record.revoked_at.is_none() {
            let now = self.clock.now();
            self.repository
                .update(&record.revoked(now))
                .map_err(reclassify_unavailable)?;
            warn!("key {key_id} revoked at {now}");
        }
        self.refresh()?;
        Ok(())
    }

    /// Loads records, unwraps material, and builds a snapshot. Synthesizes
    /// a bootstrap key when nothing is default-eligible and auto-generation
    /// is on.
    fn load_ring(&self) -> KeyRingResult<Arc<KeyRing>> {
        let mut keys = self.load_keys()?;
        let now = self.clock.now();
        let ring = KeyRing::build(keys, now, self.options.clock_skew());
        if ring.default_key_id().is_some() {
            return Ok(Arc::new(ring));
        }

        if !self.options.auto_generate {
            return Err(KeyRingError::NoEligibleKey);
        }

        info!("no default-eligible key found, generating a bootstrap key");
        match self.create_key(Uuid::new_v4(), now, now) {
            Ok(()) | Err(KeyRingError::Conflict(_)) => {}
            Err(e) => return Err(e),
        }
        // Re-list so a concurrently bootstrapped key is picked up too.
        keys = self.load_keys()?;
        Ok(Arc::new(KeyRing::build(keys, now, self.options.clock_skew())))
    }

    fn load_keys(&self) -> KeyRingResult<Vec<Key>> {
        let records = self.repository.list().map_err(reclassify_unavailable)?;
        let mut keys = Vec::with_capacity(records.len());
        for record in &records {
            keys.push(Key::from_record(record, self.at_rest.as_ref())?);
        }
        Ok(keys)
    }

    /// Generates a key and stores its wrapped record via the conditional
    /// insert.
    fn create_key(
        &self,
        id: Uuid,
        created_at: DateTime<Utc>,
        activates_at: DateTime<Utc>,
    ) -> KeyRingResult<()> {
        let key = Key::generate(
            id,
            created_at,
            activates_at,
            activates_at + self.options.key_lifetime(),
            self.options.algorithm,
            self.options.material_len,
        )?;
        let record: KeyRecord = key.to_record(self.at_rest.as_ref())?;
        self.repository.insert(&record)
    }

    fn lock_refresh(&self) -> MutexGuard<'_, ()> {
        self.refresh_lock.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Collapses transport-level repository failures into
/// [`KeyRingError::RepositoryUnavailable`] so the uninitialized-manager
/// contract holds regardless of the repository implementation's own error
/// flavor. Record-level problems keep their identity.
fn reclassify_unavailable(e: KeyRingError) -> KeyRingError {
    match e {
        KeyRingError::Io(_) | KeyRingError::Serialization(_) => {
            KeyRingError::RepositoryUnavailable(e.to_string())
        }
        other => other,
    }
}
