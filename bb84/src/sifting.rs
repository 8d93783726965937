//! Sifting and QBER estimation.
//!
//! Sifting keeps exactly the positions where Alice and Bob chose the same
//! basis. Bit values never influence which positions survive. QBER is the
//! fraction of surviving positions where the two keys disagree.

use crate::bb84_states::MeasurementBasis;
use crate::error::{Bb84Error, Result};

/// Both parties' keys after sifting, plus where they came from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SiftedKeys {
    pub sender_key: Vec<bool>,
    pub receiver_key: Vec<bool>,
    /// 1-based positions of the kept qubits in the original transmission.
    pub indices: Vec<usize>,
}

impl SiftedKeys {
    pub fn len(&self) -> usize {
        self.sender_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sender_key.is_empty()
    }

    pub fn errors(&self) -> usize {
        count_errors(&self.sender_key, &self.receiver_key)
    }

    pub fn qber(&self) -> f64 {
        qber_of(&self.sender_key, &self.receiver_key)
    }

    pub fn running_qber(&self) -> Vec<f64> {
        running_qber_curve(&self.sender_key, &self.receiver_key)
    }
}

pub fn sift(
    sender_bases: &[MeasurementBasis],
    receiver_bases: &[MeasurementBasis],
    sender_bits: &[bool],
    receiver_bits: &[bool],
) -> Result<SiftedKeys> {
    let n = sender_bases.len();
    Bb84Error::check_len("receiver bases", n, receiver_bases.len())?;
    Bb84Error::check_len("sender bits", n, sender_bits.len())?;
    Bb84Error::check_len("receiver bits", n, receiver_bits.len())?;

    let mut keys = SiftedKeys::default();
    for i in 0..n {
        if sender_bases[i] == receiver_bases[i] {
            keys.sender_key.push(sender_bits[i]);
            keys.receiver_key.push(receiver_bits[i]);
            keys.indices.push(i + 1);
        }
    }
    Ok(keys)
}

/// Number of positions where the keys differ. Extra trailing bits on either
/// side are ignored.
pub fn count_errors(sender_key: &[bool], receiver_key: &[bool]) -> usize {
    sender_key
        .iter()
        .zip(receiver_key)
        .filter(|(a, b)| a != b)
        .count()
}

/// Quantum bit error rate of two sifted keys.
///
/// An empty key yields exactly `1.0`: no evidence must never read as a clean
/// channel.
pub fn qber(sender_key: &[bool], receiver_key: &[bool]) -> Result<f64> {
    Bb84Error::check_len("receiver key", sender_key.len(), receiver_key.len())?;
    Ok(qber_of(sender_key, receiver_key))
}

fn qber_of(sender_key: &[bool], receiver_key: &[bool]) -> f64 {
    if sender_key.is_empty() {
        return 1.0;
    }
    count_errors(sender_key, receiver_key) as f64 / sender_key.len() as f64
}

/// Cumulative error count over cumulative trials, for each prefix 1..=N of
/// the sifted keys.
pub fn running_qber_curve(sender_key: &[bool], receiver_key: &[bool]) -> Vec<f64> {
    let mut errors = 0usize;
    sender_key
        .iter()
        .zip(receiver_key)
        .enumerate()
        .map(|(i, (a, b))| {
            if a != b {
                errors += 1;
            }
            errors as f64 / (i + 1) as f64
        })
        .collect()
}
