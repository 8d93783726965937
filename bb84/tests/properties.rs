#![allow(clippy::unwrap_used)]

use bb84::prelude::*;
use proptest::prelude::*;

fn basis() -> impl Strategy<Value = MeasurementBasis> {
    prop_oneof![
        Just(MeasurementBasis::Rectilinear),
        Just(MeasurementBasis::Diagonal)
    ]
}

/// Equal-length sender/receiver bases and bits.
fn transcript() -> impl Strategy<Value = (Vec<MeasurementBasis>, Vec<MeasurementBasis>, Vec<bool>, Vec<bool>)> {
    (0usize..300).prop_flat_map(|n| {
        (
            prop::collection::vec(basis(), n),
            prop::collection::vec(basis(), n),
            prop::collection::vec(any::<bool>(), n),
            prop::collection::vec(any::<bool>(), n),
        )
    })
}

// ============================================================================
// Sifting depends on bases only
// ============================================================================

proptest! {
    #[test]
    fn prop_sift_length_is_basis_agreement((a_bases, b_bases, a_bits, b_bits) in transcript()) {
        let keys = sift(&a_bases, &b_bases, &a_bits, &b_bits).unwrap();
        let agree = a_bases.iter().zip(&b_bases).filter(|(a, b)| a == b).count();

        prop_assert_eq!(keys.len(), agree);
        prop_assert_eq!(keys.receiver_key.len(), agree);
        prop_assert_eq!(keys.indices.len(), agree);

        // flipping every bit changes no sifting decision
        let flipped_a: Vec<bool> = a_bits.iter().map(|b| !b).collect();
        let flipped_b: Vec<bool> = b_bits.iter().map(|b| !b).collect();
        let again = sift(&a_bases, &b_bases, &flipped_a, &flipped_b).unwrap();
        prop_assert_eq!(again.indices, keys.indices);
    }

    #[test]
    fn prop_sifted_indices_point_at_agreeing_bases((a_bases, b_bases, a_bits, b_bits) in transcript()) {
        let keys = sift(&a_bases, &b_bases, &a_bits, &b_bits).unwrap();
        for (k, &idx) in keys.indices.iter().enumerate() {
            prop_assert_eq!(a_bases[idx - 1], b_bases[idx - 1]);
            prop_assert_eq!(keys.sender_key[k], a_bits[idx - 1]);
            prop_assert_eq!(keys.receiver_key[k], b_bits[idx - 1]);
        }
        prop_assert!(keys.indices.windows(2).all(|w| w[0] < w[1]));
    }
}

// ============================================================================
// QBER range
// ============================================================================

proptest! {
    #[test]
    fn prop_qber_in_unit_interval(pairs in prop::collection::vec(any::<(bool, bool)>(), 0..500)) {
        let (a, b): (Vec<bool>, Vec<bool>) = pairs.into_iter().unzip();
        let rate = qber(&a, &b).unwrap();

        if a.is_empty() {
            prop_assert_eq!(rate, 1.0);
        } else {
            prop_assert!((0.0..=1.0).contains(&rate));
            let curve = running_qber_curve(&a, &b);
            prop_assert_eq!(curve.len(), a.len());
            prop_assert!(curve.iter().all(|q| (0.0..=1.0).contains(q)));
        }
    }
}

// ============================================================================
// XOR cipher
// ============================================================================

proptest! {
    #[test]
    fn prop_xor_roundtrip(
        message in prop::collection::vec(any::<bool>(), 0..512),
        key in prop::collection::vec(any::<bool>(), 1..600),
    ) {
        let ciphertext = encrypt(&message, &key).unwrap();
        prop_assert_eq!(ciphertext.len(), message.len());
        prop_assert_eq!(decrypt(&ciphertext, &key).unwrap(), message);
    }

    #[test]
    fn prop_short_key_is_tiled(
        key in prop::collection::vec(any::<bool>(), 1..40),
        extra in 1usize..200,
    ) {
        let len = key.len() + extra;
        let stream = tile_key(&key, len).unwrap();

        prop_assert_eq!(stream.len(), len);
        for (i, &bit) in stream.iter().enumerate() {
            prop_assert_eq!(bit, key[i % key.len()]);
        }
    }

    #[test]
    fn prop_text_roundtrip(text in "[ -~]{0,64}") {
        prop_assert_eq!(bits_to_text(&text_to_bits(&text)), text.clone());
        prop_assert_eq!(text_to_bits(&text).len(), text.len() * 8);
    }
}

// ============================================================================
// Security gate is a strict greater-than
// ============================================================================

proptest! {
    #[test]
    fn prop_gate_matches_comparison(q in 0.0f64..=1.0, t in 0.0f64..=1.0) {
        let verdict = decide(q, t);
        prop_assert_eq!(verdict == SecurityVerdict::Insecure, q > t);
    }
}
