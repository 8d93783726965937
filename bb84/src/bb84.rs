//! Qubit transmission and the intercept-resend eavesdropper.
//!
//! A transmission is a batch of independent single-qubit preparations and
//! measurements. The eavesdropper is not a special case of the channel: Eve is
//! a receiver who then becomes a sender, so the attack is two applications of
//! the same measurement rule chained together.

use rand::Rng;

use crate::bb84_states::{generate_bb84_state, measure_bb84_state, random_bases, MeasurementBasis};
use crate::error::{Bb84Error, Result};

/// Source of measurement outcomes for a batch of prepared qubits.
///
/// The default implementation is the classical probabilistic model. A
/// circuit-level simulator can stand in as long as it honours the same
/// contract: matching basis returns the sent bit, mismatched basis returns a
/// uniform random bit.
pub trait MeasurementBackend {
    fn measure<R: Rng + ?Sized>(
        &self,
        sender_bits: &[bool],
        sender_bases: &[MeasurementBasis],
        receiver_bases: &[MeasurementBasis],
        rng: &mut R,
    ) -> Result<Vec<bool>>;
}

/// Classical probabilistic measurement model.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProbabilisticBackend;

impl MeasurementBackend for ProbabilisticBackend {
    fn measure<R: Rng + ?Sized>(
        &self,
        sender_bits: &[bool],
        sender_bases: &[MeasurementBasis],
        receiver_bases: &[MeasurementBasis],
        rng: &mut R,
    ) -> Result<Vec<bool>> {
        Bb84Error::check_len("sender bases", sender_bits.len(), sender_bases.len())?;
        Bb84Error::check_len("receiver bases", sender_bits.len(), receiver_bases.len())?;

        Ok(sender_bits
            .iter()
            .zip(sender_bases)
            .zip(receiver_bases)
            .map(|((&bit, &sent_in), &read_in)| {
                measure_bb84_state(generate_bb84_state(bit, sent_in), read_in, rng)
            })
            .collect())
    }
}

/// Reads every qubit as the opposite of the sent bit, whatever the bases.
#[cfg(test)]
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct FlipBackend;

#[cfg(test)]
impl MeasurementBackend for FlipBackend {
    fn measure<R: Rng + ?Sized>(
        &self,
        sender_bits: &[bool],
        sender_bases: &[MeasurementBasis],
        receiver_bases: &[MeasurementBasis],
        _rng: &mut R,
    ) -> Result<Vec<bool>> {
        Bb84Error::check_len("sender bases", sender_bits.len(), sender_bases.len())?;
        Bb84Error::check_len("receiver bases", sender_bits.len(), receiver_bases.len())?;
        Ok(sender_bits.iter().map(|&bit| !bit).collect())
    }
}

/// Sends `sender_bits` prepared in `sender_bases` and measures them in
/// `receiver_bases`, returning the receiver's bits.
pub fn transmit<R: Rng + ?Sized>(
    sender_bits: &[bool],
    sender_bases: &[MeasurementBasis],
    receiver_bases: &[MeasurementBasis],
    rng: &mut R,
) -> Result<Vec<bool>> {
    ProbabilisticBackend.measure(sender_bits, sender_bases, receiver_bases, rng)
}

/// What Eve forwards after an intercept-resend attack.
#[derive(Debug, Clone, PartialEq)]
pub struct Interception {
    /// Eve's measurement results, re-encoded and sent on.
    pub resend_bits: Vec<bool>,
    /// The bases Eve measured in and re-prepares in.
    pub eve_bases: Vec<MeasurementBasis>,
}

/// Intercept-resend attack using the classical model.
pub fn intercept<R: Rng + ?Sized>(
    sender_bits: &[bool],
    sender_bases: &[MeasurementBasis],
    rng: &mut R,
) -> Result<Interception> {
    intercept_with(&ProbabilisticBackend, sender_bits, sender_bases, rng)
}

/// Intercept-resend attack: Eve picks a uniformly random basis per qubit,
/// measures Alice's qubit in it, and resends the result prepared in that same
/// basis. Eve never learns Alice's basis.
pub fn intercept_with<B, R>(
    backend: &B,
    sender_bits: &[bool],
    sender_bases: &[MeasurementBasis],
    rng: &mut R,
) -> Result<Interception>
where
    B: MeasurementBackend + ?Sized,
    R: Rng + ?Sized,
{
    Bb84Error::check_len("sender bases", sender_bits.len(), sender_bases.len())?;
    let eve_bases = random_bases(sender_bits.len(), rng);
    let resend_bits = backend.measure(sender_bits, sender_bases, &eve_bases, rng)?;
    Ok(Interception {
        resend_bits,
        eve_bases,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bb84_states::random_bits;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use MeasurementBasis::{Diagonal, Rectilinear};

    #[test]
    fn test_matching_bases_deliver_every_bit() {
        let mut rng = StdRng::seed_from_u64(5);
        let bits = random_bits(500, &mut rng);
        let bases = random_bases(500, &mut rng);

        let received = transmit(&bits, &bases, &bases, &mut rng).unwrap();
        assert_eq!(received, bits);
    }

    #[test]
    fn test_output_length_matches_input() {
        let mut rng = StdRng::seed_from_u64(6);
        let bits = vec![true, false, true];
        let sent = vec![Rectilinear, Diagonal, Diagonal];
        let read = vec![Diagonal, Diagonal, Rectilinear];

        let received = transmit(&bits, &sent, &read, &mut rng).unwrap();
        assert_eq!(received.len(), 3);
        assert!(received[1], "Matching basis at index 1 must return the sent bit");
    }

    #[test]
    fn test_length_mismatch_is_invalid_input() {
        let mut rng = StdRng::seed_from_u64(0);
        let err = transmit(&[true, false], &[Rectilinear], &[Rectilinear, Diagonal], &mut rng)
            .unwrap_err();
        assert_eq!(
            err,
            Bb84Error::InvalidInput {
                what: "sender bases",
                expected: 2,
                actual: 1
            }
        );

        let err = transmit(&[true], &[Rectilinear], &[Rectilinear, Diagonal], &mut rng).unwrap_err();
        assert!(matches!(err, Bb84Error::InvalidInput { what: "receiver bases", .. }));

        assert!(intercept(&[true, true], &[Diagonal], &mut rng).is_err());
    }

    #[test]
    fn test_mismatched_bases_decorrelate() {
        let mut rng = StdRng::seed_from_u64(9);
        let n = 20_000;
        let bits = vec![false; n];
        let sent = vec![Rectilinear; n];
        let read = vec![Diagonal; n];

        let received = transmit(&bits, &sent, &read, &mut rng).unwrap();
        let ones = received.iter().filter(|&&b| b).count() as f64 / n as f64;
        assert!(
            (ones - 0.5).abs() < 0.02,
            "Wrong-basis measurement should be uniform, got {} ones",
            ones
        );
    }

    #[test]
    fn test_eve_is_exact_when_her_basis_matches() {
        let mut rng = StdRng::seed_from_u64(21);
        let bits = random_bits(2_000, &mut rng);
        let bases = random_bases(2_000, &mut rng);

        let eve = intercept(&bits, &bases, &mut rng).unwrap();
        assert_eq!(eve.resend_bits.len(), bits.len());
        assert_eq!(eve.eve_bases.len(), bits.len());

        for i in 0..bits.len() {
            if eve.eve_bases[i] == bases[i] {
                assert_eq!(eve.resend_bits[i], bits[i]);
            }
        }
    }

    #[test]
    fn test_intercept_measures_through_backend() {
        let mut rng = StdRng::seed_from_u64(13);
        let bits = random_bits(200, &mut rng);
        let bases = random_bases(200, &mut rng);

        let eve = intercept_with(&FlipBackend, &bits, &bases, &mut rng).unwrap();
        let flipped: Vec<bool> = bits.iter().map(|b| !b).collect();
        assert_eq!(eve.resend_bits, flipped);
        assert_eq!(eve.eve_bases.len(), 200);

        assert!(intercept_with(&FlipBackend, &bits, &bases[..10], &mut rng).is_err());
    }

    #[test]
    fn test_intercept_resend_error_rate_near_quarter() {
        let mut rng = StdRng::seed_from_u64(84);
        let n = 20_000;
        let alice_bits = random_bits(n, &mut rng);
        let alice_bases = random_bases(n, &mut rng);
        let bob_bases = random_bases(n, &mut rng);

        let eve = intercept(&alice_bits, &alice_bases, &mut rng).unwrap();
        let bob_bits = transmit(&eve.resend_bits, &eve.eve_bases, &bob_bases, &mut rng).unwrap();

        let mut sifted = 0;
        let mut errors = 0;
        for i in 0..n {
            if alice_bases[i] == bob_bases[i] {
                sifted += 1;
                if alice_bits[i] != bob_bits[i] {
                    errors += 1;
                }
            }
        }
        let rate = errors as f64 / sifted as f64;
        assert!(
            (rate - 0.25).abs() < 0.03,
            "Intercept-resend should disturb ~25% of sifted bits, got {}",
            rate
        );
    }
}
