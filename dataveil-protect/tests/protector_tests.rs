mod support;

use chrono::TimeDelta;
use dataveil_crypto::{Envelope, PurposeChain};
use dataveil_keyring::KeyRingOptions;
use dataveil_protect::ProtectError;
use support::{env, env_with};

fn chain(segments: &[&str]) -> PurposeChain {
    PurposeChain::new(segments.iter().copied()).unwrap()
}

// ── Round Trip ──

#[test]
fn protect_unprotect_roundtrip() {
    let env = env();
    let protector = env.factory.protector(chain(&["App", "Email"])).unwrap();

    let payload = protector.protect(b"hello").unwrap();
    assert_eq!(protector.unprotect(&payload).unwrap(), b"hello");
}

#[test]
fn empty_plaintext_roundtrips() {
    let env = env();
    let protector = env.factory.protector(chain(&["App"])).unwrap();

    let payload = protector.protect(b"").unwrap();
    assert!(protector.unprotect(&payload).unwrap().is_empty());
}

#[test]
fn payloads_are_nondeterministic() {
    let env = env();
    let protector = env.factory.protector(chain(&["App"])).unwrap();

    let p1 = protector.protect(b"same plaintext").unwrap();
    let p2 = protector.protect(b"same plaintext").unwrap();
    assert_ne!(p1, p2);
}

// ── Purpose Isolation ──

#[test]
fn different_chain_cannot_unprotect() {
    let env = env();
    let email = env.factory.protector(chain(&["App", "Email"])).unwrap();
    let tokens = env.factory.protector(chain(&["App", "Tokens"])).unwrap();

    let payload = email.protect(b"secret").unwrap();
    let err = tokens.unprotect(&payload).unwrap_err();
    assert!(matches!(err, ProtectError::Tampered));
}

#[test]
fn prefix_chain_cannot_unprotect() {
    let env = env();
    let full = env.factory.protector(chain(&["App", "Email"])).unwrap();
    let parent = env.factory.protector(chain(&["App"])).unwrap();

    let payload = full.protect(b"secret").unwrap();
    assert!(matches!(
        parent.unprotect(&payload),
        Err(ProtectError::Tampered)
    ));
}

#[test]
fn segment_boundaries_do_not_collide() {
    let env = env();
    let a_bc = env.factory.protector(chain(&["A", "BC"])).unwrap();
    let ab_c = env.factory.protector(chain(&["AB", "C"])).unwrap();

    let payload = a_bc.protect(b"secret").unwrap();
    assert!(matches!(
        ab_c.unprotect(&payload),
        Err(ProtectError::Tampered)
    ));
}

// ── Sub-Protectors ──

#[test]
fn sub_protector_equals_full_chain_protector() {
    let env = env();
    let via_sub = env
        .factory
        .protector(chain(&["App"]))
        .unwrap()
        .sub_protector("Email")
        .sub_protector("Confirm");
    let direct = env
        .factory
        .protector(chain(&["App", "Email", "Confirm"]))
        .unwrap();

    let payload = via_sub.protect(b"cross-checked").unwrap();
    assert_eq!(direct.unprotect(&payload).unwrap(), b"cross-checked");

    let payload = direct.protect(b"cross-checked").unwrap();
    assert_eq!(via_sub.unprotect(&payload).unwrap(), b"cross-checked");
}

#[test]
fn sub_protector_extends_the_purpose_chain() {
    let env = env();
    let protector = env.factory.protector(chain(&["App", "Email"])).unwrap();
    let sub = protector.sub_protector("Confirm");

    assert_eq!(sub.purposes().segments(), ["App", "Email", "Confirm"]);
    // Debug output names the chain and nothing else.
    assert_eq!(format!("{sub:?}"), "Protector(App.Email.Confirm)");
}

// ── Tampering ──

#[test]
fn any_single_bit_flip_is_rejected() {
    let env = env();
    let protector = env.factory.protector(chain(&["App"])).unwrap();
    let payload = protector.protect(b"integrity matters").unwrap();

    for i in 0..payload.len() {
        let mut tampered = payload.clone();
        tampered[i] ^= 0x01;
        assert!(
            protector.unprotect(&tampered).is_err(),
            "flip at byte {i} was accepted"
        );
    }
}

#[test]
fn ciphertext_flips_surface_as_tampered() {
    let env = env();
    let protector = env.factory.protector(chain(&["App"])).unwrap();
    let payload = protector.protect(b"integrity matters").unwrap();

    // Past the 18-byte header and 24-byte nonce lies ciphertext+tag; flips
    // there must be indistinguishable authentication failures.
    for i in (18 + 24)..payload.len() {
        let mut tampered = payload.clone();
        tampered[i] ^= 0x01;
        assert!(matches!(
            protector.unprotect(&tampered),
            Err(ProtectError::Tampered)
        ));
    }
}

#[test]
fn truncated_payload_is_a_format_error() {
    let env = env();
    let protector = env.factory.protector(chain(&["App"])).unwrap();
    let payload = protector.protect(b"data").unwrap();

    assert!(matches!(
        protector.unprotect(&payload[..10]),
        Err(ProtectError::Format(_))
    ));
}

// ── Key Lookup ──

#[test]
fn payload_from_a_foreign_ring_is_key_not_found() {
    let env_a = env();
    let env_b = env();
    let a = env_a.factory.protector(chain(&["App"])).unwrap();
    let b = env_b.factory.protector(chain(&["App"])).unwrap();

    let payload = a.protect(b"issued elsewhere").unwrap();
    let err = b.unprotect(&payload).unwrap_err();
    assert!(matches!(err, ProtectError::KeyNotFound { .. }));
}

// ── Revocation ──

#[test]
fn revoked_key_requires_explicit_opt_in() {
    let env = env();
    let protector = env.factory.protector(chain(&["App"])).unwrap();

    let payload = protector.protect(b"still recoverable").unwrap();
    let key_id = Envelope::decode(&payload).unwrap().key_id;

    env.manager.revoke(key_id).unwrap();

    let err = protector.unprotect(&payload).unwrap_err();
    assert!(matches!(err, ProtectError::KeyRevoked { key_id: id } if id == key_id));

    let recovered = protector.unprotect_allowing_revoked(&payload).unwrap();
    assert_eq!(recovered, b"still recoverable");
}

// ── Rotation ──

#[test]
fn old_payloads_survive_rotation_and_new_payloads_use_the_new_key() {
    let env = env();
    let protector = env.factory.protector(chain(&["App", "Email"])).unwrap();

    let old_payload = protector.protect(b"hello").unwrap();
    let k1 = Envelope::decode(&old_payload).unwrap().key_id;

    // A newer key becomes default.
    let k2 = env.seed_key(support::base() + TimeDelta::seconds(10));
    env.clock.advance(TimeDelta::seconds(60));
    env.manager.refresh().unwrap();

    assert_eq!(protector.unprotect(&old_payload).unwrap(), b"hello");

    let new_payload = protector.protect(b"hello").unwrap();
    let used = Envelope::decode(&new_payload).unwrap().key_id;
    assert_eq!(used, k2);
    assert_ne!(used, k1);
}

// ── Configuration ──

#[test]
fn factory_fails_without_a_default_key_when_auto_generate_is_off() {
    let env = env_with(KeyRingOptions {
        auto_generate: false,
        ..KeyRingOptions::default()
    });

    let err = env.factory.protector(chain(&["App"])).unwrap_err();
    assert!(matches!(err, ProtectError::Configuration(_)));
}

// Property-based tests
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn roundtrip_arbitrary_plaintexts(
            plaintext in proptest::collection::vec(any::<u8>(), 0..1024),
        ) {
            let env = env();
            let protector = env.factory.protector(chain(&["App", "Email"])).unwrap();
            let payload = protector.protect(&plaintext).unwrap();
            prop_assert_eq!(protector.unprotect(&payload).unwrap(), plaintext);
        }
    }
}
