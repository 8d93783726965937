//! Error taxonomy for the BB84 engine.

use thiserror::Error;

/// Everything that can stop a key exchange or an encryption round-trip.
///
/// The gate failures (`EmptySiftedKey`, `InsecureChannel`, `InsufficientKey`)
/// are expected outcomes of a session and are reported alongside the session
/// statistics rather than aborting the run.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Bb84Error {
    /// Two sequences that must line up index-for-index have different lengths.
    #[error("length mismatch: {what} has {actual} entries, expected {expected}")]
    InvalidInput {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A transmission was requested for a zero-length message.
    #[error("message is empty")]
    EmptyMessage,

    /// No qubit survived sifting, so there is nothing to estimate QBER from.
    #[error("no sifted key bits were produced")]
    EmptySiftedKey,

    /// The round budget ran out before enough sifted bits were collected.
    #[error("insufficient key: collected {collected} of {required} bits after {rounds} rounds")]
    InsufficientKey {
        collected: usize,
        required: usize,
        rounds: usize,
    },

    /// Aggregate QBER is above the threshold; the channel is treated as tapped.
    #[error("insecure channel: QBER {qber:.4} exceeds threshold {threshold:.4}")]
    InsecureChannel { qber: f64, threshold: f64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Bb84Error {
    /// Checks that `actual` matches `expected`, naming the offending sequence.
    pub(crate) fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<(), Self> {
        if expected == actual {
            Ok(())
        } else {
            Err(Bb84Error::InvalidInput {
                what,
                expected,
                actual,
            })
        }
    }
}

pub type Result<T, E = Bb84Error> = std::result::Result<T, E>;
