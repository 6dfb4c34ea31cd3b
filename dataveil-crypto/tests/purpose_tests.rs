use dataveil_crypto::{CryptoError, PurposeChain, SUBKEY_SIZE};

fn master() -> Vec<u8> {
    (0u8..64).collect()
}

#[test]
fn empty_chain_is_rejected() {
    let err = PurposeChain::new(Vec::<String>::new()).unwrap_err();
    assert!(matches!(err, CryptoError::EmptyPurposeChain));
}

#[test]
fn derivation_is_deterministic() {
    let chain = PurposeChain::new(["App", "Email", "Confirm"]).unwrap();
    let k1 = chain.derive_subkey(&master()).unwrap();
    let k2 = chain.derive_subkey(&master()).unwrap();
    assert_eq!(k1.as_bytes(), k2.as_bytes());
}

#[test]
fn different_chains_produce_different_subkeys() {
    let a = PurposeChain::new(["App", "Email"]).unwrap();
    let b = PurposeChain::new(["App", "Tokens"]).unwrap();
    let ka = a.derive_subkey(&master()).unwrap();
    let kb = b.derive_subkey(&master()).unwrap();
    assert_ne!(ka.as_bytes(), kb.as_bytes());
}

#[test]
fn chain_order_matters() {
    let ab = PurposeChain::new(["A", "B"]).unwrap();
    let ba = PurposeChain::new(["B", "A"]).unwrap();
    assert_ne!(
        ab.derive_subkey(&master()).unwrap().as_bytes(),
        ba.derive_subkey(&master()).unwrap().as_bytes()
    );
}

#[test]
fn chain_case_matters() {
    let lower = PurposeChain::root("email");
    let upper = PurposeChain::root("Email");
    assert_ne!(
        lower.derive_subkey(&master()).unwrap().as_bytes(),
        upper.derive_subkey(&master()).unwrap().as_bytes()
    );
}

#[test]
fn segment_boundaries_do_not_collide() {
    // ["A", "BC"] and ["AB", "C"] concatenate to the same string; the
    // length-prefixed encoding must keep them apart.
    let a_bc = PurposeChain::new(["A", "BC"]).unwrap();
    let ab_c = PurposeChain::new(["AB", "C"]).unwrap();

    assert_ne!(a_bc.canonical_encoding(), ab_c.canonical_encoding());
    assert_ne!(
        a_bc.derive_subkey(&master()).unwrap().as_bytes(),
        ab_c.derive_subkey(&master()).unwrap().as_bytes()
    );
}

#[test]
fn canonical_encoding_is_length_prefixed_big_endian() {
    let chain = PurposeChain::new(["App", "Email"]).unwrap();
    let encoded = chain.canonical_encoding();

    let mut expected = Vec::new();
    expected.extend_from_slice(&3u32.to_be_bytes());
    expected.extend_from_slice(b"App");
    expected.extend_from_slice(&5u32.to_be_bytes());
    expected.extend_from_slice(b"Email");

    assert_eq!(encoded, expected);
}

#[test]
fn chaining_is_associative() {
    // Deriving [A, B] in one call must equal deriving A, then deriving B
    // from the intermediate key.
    let full = PurposeChain::new(["A", "B"]).unwrap();
    let one_shot = full.derive_subkey(&master()).unwrap();

    let intermediate = PurposeChain::root("A").derive_subkey(&master()).unwrap();
    let sequential = PurposeChain::root("B")
        .derive_subkey(intermediate.as_bytes())
        .unwrap();

    assert_eq!(one_shot.as_bytes(), sequential.as_bytes());
}

#[test]
fn child_extends_the_chain() {
    let base = PurposeChain::new(["App", "Email"]).unwrap();
    let extended = base.child("Confirm");

    assert_eq!(extended.segments(), ["App", "Email", "Confirm"]);
    assert_eq!(
        extended.derive_subkey(&master()).unwrap().as_bytes(),
        PurposeChain::new(["App", "Email", "Confirm"])
            .unwrap()
            .derive_subkey(&master())
            .unwrap()
            .as_bytes()
    );
}

#[test]
fn subkey_has_expected_size() {
    let chain = PurposeChain::root("App");
    let key = chain.derive_subkey(&master()).unwrap();
    assert_eq!(key.as_bytes().len(), SUBKEY_SIZE);
}

#[test]
fn display_joins_segments_with_dots() {
    let chain = PurposeChain::new(["App", "Email"]).unwrap();
    assert_eq!(chain.to_string(), "App.Email");
}

// Property-based tests
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn distinct_chains_never_share_subkeys(
            a in proptest::collection::vec("[a-zA-Z0-9]{1,12}", 1..4),
            b in proptest::collection::vec("[a-zA-Z0-9]{1,12}", 1..4),
        ) {
            let ca = PurposeChain::new(a.clone()).unwrap();
            let cb = PurposeChain::new(b.clone()).unwrap();
            let ka = ca.derive_subkey(&master()).unwrap();
            let kb = cb.derive_subkey(&master()).unwrap();
            if a == b {
                prop_assert_eq!(ka.as_bytes(), kb.as_bytes());
            } else {
                prop_assert_ne!(ka.as_bytes(), kb.as_bytes());
            }
        }

        #[test]
        fn sequential_derivation_matches_one_shot(
            segments in proptest::collection::vec("[a-zA-Z0-9]{1,12}", 2..5),
        ) {
            let full = PurposeChain::new(segments.clone()).unwrap();
            let one_shot = full.derive_subkey(&master()).unwrap();

            let mut current = PurposeChain::root(segments[0].clone())
                .derive_subkey(&master())
                .unwrap();
            for segment in &segments[1..] {
                current = PurposeChain::root(segment.clone())
                    .derive_subkey(current.as_bytes())
                    .unwrap();
            }

            prop_assert_eq!(one_shot.as_bytes(), current.as_bytes());
        }
    }
}
