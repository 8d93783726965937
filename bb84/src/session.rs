//! Key-exchange rounds and multi-round key accumulation.
//!
//! One round is a full BB84 pass: Alice draws bits and bases, the qubits go
//! through the channel (optionally via Eve), Bob measures in his own random
//! bases, and both sides sift. Because only about half the qubits survive
//! sifting, a session keeps running rounds and appending sifted bits until it
//! has enough key for the message or runs out of round budget.

use log::{debug, info};
use rand::Rng;
use serde::Serialize;
use std::fmt;

use crate::bb84::{intercept_with, MeasurementBackend, ProbabilisticBackend};
use crate::bb84_states::{random_bases, random_bits, MeasurementBasis};
use crate::error::{Bb84Error, Result};
use crate::sifting::sift;

/// Default number of leading qubits kept per round for display.
pub const DEFAULT_SAMPLE_ROWS: usize = 20;
/// Smallest round size the multiplier rule will produce.
pub const DEFAULT_MIN_ROUND_SIZE: usize = 64;
pub const DEFAULT_MULTIPLIER: usize = 4;
pub const DEFAULT_MAX_ROUNDS: usize = 8;
/// Largest round a session will attempt.
pub const MAX_ROUND_SIZE: usize = 1 << 24;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum RecordStatus {
    Discarded,
    Match,
    Error,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            RecordStatus::Discarded => "Discarded",
            RecordStatus::Match => "YES",
            RecordStatus::Error => "ERROR",
        })
    }
}

/// Everything that happened to one qubit in one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransmissionRecord {
    /// 1-based position within the round.
    pub index: usize,
    pub sender_bit: bool,
    pub sender_basis: MeasurementBasis,
    pub eavesdropper_basis: Option<MeasurementBasis>,
    pub eavesdropper_bit: Option<bool>,
    pub receiver_basis: MeasurementBasis,
    pub receiver_bit: bool,
    pub sifted: bool,
    pub error: bool,
}

impl TransmissionRecord {
    pub fn status(&self) -> RecordStatus {
        match (self.sifted, self.error) {
            (false, _) => RecordStatus::Discarded,
            (true, false) => RecordStatus::Match,
            (true, true) => RecordStatus::Error,
        }
    }
}

/// Outcome of one round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundResult {
    /// Qubits sent this round.
    pub round_bits: usize,
    /// Alice's bits at the sifted positions, in transmission order.
    pub sifted_key: Vec<bool>,
    /// 1-based transmission positions of the sifted bits.
    pub sifted_indices: Vec<usize>,
    pub sifted_count: usize,
    pub error_count: usize,
    /// The first few qubits of the round.
    pub sample_rows: Vec<TransmissionRecord>,
    pub running_qber_curve: Vec<f64>,
}

impl RoundResult {
    /// QBER of this round alone, 1.0 if nothing was sifted.
    pub fn qber(&self) -> f64 {
        if self.sifted_count == 0 {
            1.0
        } else {
            self.error_count as f64 / self.sifted_count as f64
        }
    }
}

/// Runs one round of `round_bits` qubits using the classical model.
pub fn run_round<R: Rng + ?Sized>(
    round_bits: usize,
    eavesdropper: bool,
    sample_rows: usize,
    rng: &mut R,
) -> Result<RoundResult> {
    run_round_with(&ProbabilisticBackend, round_bits, eavesdropper, sample_rows, rng)
}

pub fn run_round_with<B, R>(
    backend: &B,
    round_bits: usize,
    eavesdropper: bool,
    sample_rows: usize,
    rng: &mut R,
) -> Result<RoundResult>
where
    B: MeasurementBackend + ?Sized,
    R: Rng + ?Sized,
{
    if round_bits > MAX_ROUND_SIZE {
        return Err(Bb84Error::InvalidConfig(format!(
            "round of {} qubits exceeds the limit of {}",
            round_bits, MAX_ROUND_SIZE
        )));
    }
    let alice_bits = random_bits(round_bits, rng);
    let alice_bases = random_bases(round_bits, rng);
    let bob_bases = random_bases(round_bits, rng);

    let (bob_bits, eve) = if eavesdropper {
        let eve = intercept_with(backend, &alice_bits, &alice_bases, rng)?;
        let bob_bits = backend.measure(&eve.resend_bits, &eve.eve_bases, &bob_bases, rng)?;
        (bob_bits, Some(eve))
    } else {
        let bob_bits = backend.measure(&alice_bits, &alice_bases, &bob_bases, rng)?;
        (bob_bits, None)
    };

    let keys = sift(&alice_bases, &bob_bases, &alice_bits, &bob_bits)?;

    let sample_rows = (0..round_bits.min(sample_rows))
        .map(|i| {
            let sifted = alice_bases[i] == bob_bases[i];
            TransmissionRecord {
                index: i + 1,
                sender_bit: alice_bits[i],
                sender_basis: alice_bases[i],
                eavesdropper_basis: eve.as_ref().map(|e| e.eve_bases[i]),
                eavesdropper_bit: eve.as_ref().map(|e| e.resend_bits[i]),
                receiver_basis: bob_bases[i],
                receiver_bit: bob_bits[i],
                sifted,
                error: sifted && alice_bits[i] != bob_bits[i],
            }
        })
        .collect();

    let error_count = keys.errors();
    let running_qber_curve = keys.running_qber();
    let sifted_count = keys.len();

    Ok(RoundResult {
        round_bits,
        sifted_key: keys.sender_key,
        sifted_indices: keys.indices,
        sifted_count,
        error_count,
        sample_rows,
        running_qber_curve,
    })
}

/// Parameters of a multi-round key exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Sifted key bits needed, normally the message length in bits.
    pub target_bits: usize,
    pub eavesdropper: bool,
    /// Each round sends `target_bits * multiplier` qubits (floored at
    /// `min_round_size`).
    pub multiplier: usize,
    pub min_round_size: usize,
    pub max_rounds: usize,
    /// Fixed round size, replacing the multiplier rule when set.
    pub qubits_per_round: Option<usize>,
    pub sample_rows: usize,
}

impl SessionConfig {
    pub fn new(target_bits: usize, eavesdropper: bool) -> Self {
        Self {
            target_bits,
            eavesdropper,
            multiplier: DEFAULT_MULTIPLIER,
            min_round_size: DEFAULT_MIN_ROUND_SIZE,
            max_rounds: DEFAULT_MAX_ROUNDS,
            qubits_per_round: None,
            sample_rows: DEFAULT_SAMPLE_ROWS,
        }
    }

    pub fn round_size(&self) -> usize {
        match self.qubits_per_round {
            Some(n) => n,
            None => self
                .target_bits
                .saturating_mul(self.multiplier)
                .max(self.min_round_size),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_rounds == 0 {
            return Err(Bb84Error::InvalidConfig("max_rounds must be at least 1".into()));
        }
        if self.qubits_per_round == Some(0) {
            return Err(Bb84Error::InvalidConfig("qubits_per_round must be at least 1".into()));
        }
        if self.qubits_per_round.is_none() && self.multiplier == 0 {
            return Err(Bb84Error::InvalidConfig("multiplier must be at least 1".into()));
        }
        if self.round_size() > MAX_ROUND_SIZE {
            return Err(Bb84Error::InvalidConfig(format!(
                "round size {} exceeds the limit of {}",
                self.round_size(),
                MAX_ROUND_SIZE
            )));
        }
        Ok(())
    }
}

/// Running totals of a key exchange plus the latest round's diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccumulatedSession {
    pub target_bits: usize,
    /// Alice's sifted bits from every round, appended in round order.
    pub collected_key: Vec<bool>,
    pub total_sent: usize,
    pub total_sifted: usize,
    pub total_errors: usize,
    pub rounds_run: usize,
    /// Sample rows of the most recent round only.
    pub last_sample_rows: Vec<TransmissionRecord>,
    /// Running QBER of the most recent round only.
    pub last_qber_curve: Vec<f64>,
    pub last_sifted_indices: Vec<usize>,
}

impl AccumulatedSession {
    fn new(target_bits: usize) -> Self {
        Self {
            target_bits,
            collected_key: Vec::with_capacity(target_bits),
            total_sent: 0,
            total_sifted: 0,
            total_errors: 0,
            rounds_run: 0,
            last_sample_rows: Vec::new(),
            last_qber_curve: Vec::new(),
            last_sifted_indices: Vec::new(),
        }
    }

    /// Folds a round into the totals. The previous round's display data is
    /// replaced, not kept.
    fn absorb(&mut self, round: RoundResult) {
        self.total_sent += round.round_bits;
        self.total_sifted += round.sifted_count;
        self.total_errors += round.error_count;
        self.rounds_run += 1;
        self.collected_key.extend(round.sifted_key);
        self.last_sample_rows = round.sample_rows;
        self.last_qber_curve = round.running_qber_curve;
        self.last_sifted_indices = round.sifted_indices;
    }

    /// `total_errors / total_sifted`, or 1.0 when nothing was sifted.
    pub fn aggregate_qber(&self) -> f64 {
        if self.total_sifted == 0 {
            1.0
        } else {
            self.total_errors as f64 / self.total_sifted as f64
        }
    }

    pub fn is_sufficient(&self) -> bool {
        self.collected_key.len() >= self.target_bits
    }

    /// `InsufficientKey` unless enough key was collected.
    pub fn require_sufficient(&self) -> Result<()> {
        if self.is_sufficient() {
            Ok(())
        } else {
            Err(Bb84Error::InsufficientKey {
                collected: self.collected_key.len(),
                required: self.target_bits,
                rounds: self.rounds_run,
            })
        }
    }
}

/// Runs rounds until `target_bits` sifted bits are collected or the round
/// budget is spent. Running out of budget is a normal outcome: check
/// [`AccumulatedSession::is_sufficient`].
pub fn accumulate<R: Rng + ?Sized>(config: &SessionConfig, rng: &mut R) -> Result<AccumulatedSession> {
    accumulate_with(&ProbabilisticBackend, config, rng)
}

pub fn accumulate_with<B, R>(
    backend: &B,
    config: &SessionConfig,
    rng: &mut R,
) -> Result<AccumulatedSession>
where
    B: MeasurementBackend + ?Sized,
    R: Rng + ?Sized,
{
    config.validate()?;
    let round_bits = config.round_size();
    let mut session = AccumulatedSession::new(config.target_bits);

    while !session.is_sufficient() && session.rounds_run < config.max_rounds {
        let round = run_round_with(backend, round_bits, config.eavesdropper, config.sample_rows, rng)?;
        debug!(
            "round {}: sent {}, sifted {}, errors {}, qber {:.4}",
            session.rounds_run + 1,
            round.round_bits,
            round.sifted_count,
            round.error_count,
            round.qber()
        );
        session.absorb(round);
    }

    info!(
        "session finished after {} round(s): {}/{} key bits, {} sent, {} sifted, {} errors",
        session.rounds_run,
        session.collected_key.len(),
        session.target_bits,
        session.total_sent,
        session.total_sifted,
        session.total_errors
    );
    Ok(session)
}
