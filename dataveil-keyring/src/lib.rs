//! Key lifecycle management for Dataveil.
//!
//! Owns everything stateful about data-protection keys:
//!
//! - the [`Key`] model with its activation/expiry/revocation lifecycle
//! - immutable [`KeyRing`] snapshots with deterministic default-key
//!   selection
//! - the [`KeyRingManager`], which loads, rotates, revokes, and atomically
//!   publishes new snapshots without ever blocking readers
//! - the [`KeyRepository`] and [`KeyAtRestProtector`] collaborator traits,
//!   plus in-memory and filesystem repository implementations
//!
//! Raw key material only ever exists unwrapped in memory; it is wrapped by a
//! [`KeyAtRestProtector`] before touching a repository and zeroized when a
//! [`Key`] is dropped.

mod at_rest;
mod clock;
mod config;
mod error;
mod key;
mod manager;
mod repository;
mod ring;

pub use at_rest::{KeyAtRestProtector, PlaintextAtRest, SealedAtRest};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::KeyRingOptions;
pub use error::{KeyRingError, KeyRingResult};
pub use key::{Key, KeyRecord, KeyStatus};
pub use manager::KeyRingManager;
pub use repository::{FileKeyRepository, KeyRepository, MemoryKeyRepository};
pub use ring::KeyRing;
