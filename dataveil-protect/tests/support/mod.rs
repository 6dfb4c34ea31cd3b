//! Shared fixtures: a manager over an in-memory repository with a manual
//! clock, so key lifecycle and expiry are fully deterministic.

// Each test binary compiles its own view of this module and uses a
// different subset of it.
#![allow(dead_code)]

use chrono::{DateTime, TimeDelta, Utc};
use dataveil_crypto::AeadAlgorithm;
use dataveil_keyring::{
    Key, KeyRepository, KeyRingManager, KeyRingOptions, ManualClock, MemoryKeyRepository,
    PlaintextAtRest,
};
use dataveil_protect::ProtectorFactory;
use std::sync::Arc;
use uuid::Uuid;

pub fn base() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

pub struct TestEnv {
    pub repository: Arc<MemoryKeyRepository>,
    pub clock: Arc<ManualClock>,
    pub manager: Arc<KeyRingManager>,
    pub factory: ProtectorFactory,
}

pub fn env() -> TestEnv {
    env_with(KeyRingOptions::default())
}

pub fn env_with(options: KeyRingOptions) -> TestEnv {
    let repository = Arc::new(MemoryKeyRepository::new());
    let clock = Arc::new(ManualClock::new(base()));
    let manager = Arc::new(KeyRingManager::new(
        Arc::clone(&repository) as _,
        Arc::new(PlaintextAtRest),
        Arc::clone(&clock) as _,
        options,
    ));
    let factory = ProtectorFactory::new(Arc::clone(&manager));
    TestEnv {
        repository,
        clock,
        manager,
        factory,
    }
}

impl TestEnv {
    /// Stores a key activating at `activates`, valid for 90 days, directly
    /// in the repository.
    pub fn seed_key(&self, activates: DateTime<Utc>) -> Uuid {
        let key = Key::generate(
            Uuid::new_v4(),
            activates,
            activates,
            activates + TimeDelta::days(90),
            AeadAlgorithm::XChaCha20Poly1305,
            64,
        )
        .unwrap();
        self.repository
            .insert(&key.to_record(&PlaintextAtRest).unwrap())
            .unwrap();
        key.id()
    }
}
