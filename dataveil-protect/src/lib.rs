//! The Dataveil public façade.
//!
//! Application components obtain a [`Protector`] from a
//! [`ProtectorFactory`] for a purpose chain, then call
//! [`Protector::protect`] and [`Protector::unprotect`] on opaque payloads
//! (tokens, cookies, one-time codes). A payload protected under one purpose
//! chain can never be unprotected under another, and key rotation,
//! revocation, and expiry are handled by the key ring without breaking
//! already-issued payloads whose governing key remains usable.
//!
//! ```no_run
//! use std::sync::Arc;
//! use dataveil_crypto::PurposeChain;
//! use dataveil_keyring::{
//!     KeyRingManager, KeyRingOptions, MemoryKeyRepository, PlaintextAtRest, SystemClock,
//! };
//! use dataveil_protect::ProtectorFactory;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = Arc::new(KeyRingManager::new(
//!     Arc::new(MemoryKeyRepository::new()),
//!     Arc::new(PlaintextAtRest),
//!     Arc::new(SystemClock),
//!     KeyRingOptions::default(),
//! ));
//!
//! let factory = ProtectorFactory::new(manager);
//! let protector = factory.protector(PurposeChain::new(["App", "Email"])?)?;
//!
//! let payload = protector.protect(b"confirmation code 491823")?;
//! let plaintext = protector.unprotect(&payload)?;
//! # Ok(())
//! # }
//! ```

mod error;
mod protector;
mod time_limited;

pub use error::{ProtectError, ProtectResult};
pub use protector::{Protector, ProtectorFactory};
pub use time_limited::TimeLimitedProtector;
