//! Key-ring configuration.

use chrono::TimeDelta;
use dataveil_crypto::AeadAlgorithm;
use serde::{Deserialize, Serialize};

/// Configuration for the key-ring manager.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeyRingOptions {
    /// How long a newly generated key stays valid, in days.
    pub key_lifetime_days: i64,

    /// Rotation margin in days: when the default key's remaining validity
    /// drops to this or below, `rotate_if_needed` creates a successor.
    pub rotation_margin_days: i64,

    /// Propagation window in seconds: a rotated-in key activates this far
    /// in the future so other readers learn about it before it becomes the
    /// default.
    pub propagation_window_secs: i64,

    /// Clock-skew tolerance in seconds when judging default eligibility.
    pub clock_skew_secs: i64,

    /// Synthesize a key synchronously when no default-eligible key exists.
    /// When disabled, a keyless ring is a configuration error.
    pub auto_generate: bool,

    /// AEAD primitive assigned to newly generated keys.
    pub algorithm: AeadAlgorithm,

    /// Master key material length in bytes for newly generated keys.
    pub material_len: usize,
}

impl Default for KeyRingOptions {
    fn default() -> Self {
        Self {
            key_lifetime_days: 90,
            rotation_margin_days: 7,
            propagation_window_secs: 2 * 60 * 60, // 2 hours
            clock_skew_secs: 5 * 60,              // 5 minutes
            auto_generate: true,
            algorithm: AeadAlgorithm::XChaCha20Poly1305,
            material_len: 64, // 512-bit masters; HKDF condenses per purpose
        }
    }
}

impl KeyRingOptions {
    pub fn key_lifetime(&self) -> TimeDelta {
        TimeDelta::days(self.key_lifetime_days)
    }

    pub fn rotation_margin(&self) -> TimeDelta {
        TimeDelta::days(self.rotation_margin_days)
    }

    pub fn propagation_window(&self) -> TimeDelta {
        TimeDelta::seconds(self.propagation_window_secs)
    }

    pub fn clock_skew(&self) -> TimeDelta {
        TimeDelta::seconds(self.clock_skew_secs)
    }
}
