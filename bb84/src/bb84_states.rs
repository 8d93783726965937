//! Qubit states, measurement bases and the single-qubit measurement rule.
//!
//! The simulation never tracks amplitudes. A prepared qubit is one of the four
//! BB84 states, and measuring it follows the textbook rule: in the basis it
//! was prepared in, the encoded bit comes back unchanged; in the other basis
//! the outcome is a fair coin flip.

use rand::Rng;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BB84State {
    QubitZero,  // |0>
    QubitOne,   // |1>
    QubitPlus,  // |+>
    QubitMinus, // |->
}

/// One of the two conjugate measurement bases.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum MeasurementBasis {
    /// Z basis, states |0> and |1>.
    Rectilinear,
    /// X basis, states |+> and |->.
    Diagonal,
}

pub type Basis = MeasurementBasis;
pub type Bit = bool;

impl MeasurementBasis {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.gen::<bool>() {
            MeasurementBasis::Diagonal
        } else {
            MeasurementBasis::Rectilinear
        }
    }

    /// Short label used in sample tables ("Z" / "X").
    pub fn label(self) -> &'static str {
        match self {
            MeasurementBasis::Rectilinear => "Z",
            MeasurementBasis::Diagonal => "X",
        }
    }
}

impl fmt::Display for MeasurementBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl BB84State {
    /// The basis this state was prepared in.
    pub fn basis(self) -> MeasurementBasis {
        match self {
            BB84State::QubitZero | BB84State::QubitOne => MeasurementBasis::Rectilinear,
            BB84State::QubitPlus | BB84State::QubitMinus => MeasurementBasis::Diagonal,
        }
    }

    /// The bit value encoded in this state.
    pub fn bit(self) -> bool {
        matches!(self, BB84State::QubitOne | BB84State::QubitMinus)
    }
}

/// Encodes `bit` in `basis`.
pub fn generate_bb84_state(bit: bool, basis: MeasurementBasis) -> BB84State {
    match (bit, basis) {
        (false, MeasurementBasis::Rectilinear) => BB84State::QubitZero,
        (true, MeasurementBasis::Rectilinear) => BB84State::QubitOne,
        (false, MeasurementBasis::Diagonal) => BB84State::QubitPlus,
        (true, MeasurementBasis::Diagonal) => BB84State::QubitMinus,
    }
}

/// Measures `state` in `basis`.
///
/// Matching basis: deterministic, returns the encoded bit without drawing
/// randomness. Conjugate basis: the state collapses and the outcome is a
/// uniform random bit, independent of what was encoded.
pub fn measure_bb84_state<R: Rng + ?Sized>(
    state: BB84State,
    basis: MeasurementBasis,
    rng: &mut R,
) -> bool {
    if state.basis() == basis {
        state.bit()
    } else {
        rng.gen()
    }
}

pub fn random_bit<R: Rng + ?Sized>(rng: &mut R) -> bool {
    rng.gen()
}

pub fn random_bits<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<bool> {
    (0..n).map(|_| random_bit(rng)).collect()
}

pub fn random_bases<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<MeasurementBasis> {
    (0..n).map(|_| MeasurementBasis::random(rng)).collect()
}
