//! End-to-end secure transmission: key exchange, security gate, encryption.

use log::{info, warn};
use rand::Rng;
use serde::Serialize;

use crate::bb84::{MeasurementBackend, ProbabilisticBackend};
use crate::cipher::{bits_to_text, decrypt, encrypt, key_fingerprint, text_to_bits, tile_key};
use crate::config::Bb84Config;
use crate::error::{Bb84Error, Result};
use crate::security::{decide, SecurityVerdict};
use crate::session::{accumulate_with, run_round_with, AccumulatedSession, RoundResult, DEFAULT_SAMPLE_ROWS};

/// Default size of the standalone intercept-resend simulation.
pub const DEFAULT_SIMULATION_QUBITS: usize = 350;

/// What a successful transmission produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
    pub ciphertext: Vec<bool>,
    /// Plaintext recovered by decrypting `ciphertext` with the shared key.
    pub recovered_message: String,
    /// SHA-256 of the key stream actually used.
    pub key_fingerprint: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransmissionReport {
    pub message_bits: usize,
    pub eavesdropper: bool,
    pub threshold: f64,
    pub session: AccumulatedSession,
    pub aggregate_qber: f64,
    pub verdict: SecurityVerdict,
    /// The ciphertext, or why none was produced.
    pub delivery: std::result::Result<Delivery, Bb84Error>,
}

impl TransmissionReport {
    pub fn is_delivered(&self) -> bool {
        self.delivery.is_ok()
    }

    pub fn ciphertext(&self) -> Option<&[bool]> {
        self.delivery.as_ref().ok().map(|d| d.ciphertext.as_slice())
    }
}

/// Exchanges a key long enough for `message` and, if the channel passes the
/// QBER gate, encrypts and decrypts the message with it.
///
/// Returns `Err` only for unusable input (empty message, bad config). Gate
/// failures come back inside [`TransmissionReport::delivery`] so the session
/// statistics stay available.
pub fn run_transmission<R: Rng + ?Sized>(
    message: &str,
    eavesdropper: bool,
    config: &Bb84Config,
    rng: &mut R,
) -> Result<TransmissionReport> {
    run_transmission_with(&ProbabilisticBackend, message, eavesdropper, config, rng)
}

pub fn run_transmission_with<B, R>(
    backend: &B,
    message: &str,
    eavesdropper: bool,
    config: &Bb84Config,
    rng: &mut R,
) -> Result<TransmissionReport>
where
    B: MeasurementBackend + ?Sized,
    R: Rng + ?Sized,
{
    config.validate()?;
    if message.is_empty() {
        return Err(Bb84Error::EmptyMessage);
    }

    let message_bits = text_to_bits(message);
    let session_config = config.session_config(message_bits.len(), eavesdropper);
    let session = accumulate_with(backend, &session_config, rng)?;

    let aggregate_qber = session.aggregate_qber();
    let verdict = decide(aggregate_qber, config.threshold);
    info!(
        "aggregate QBER {:.4} against threshold {:.4}: {:?}",
        aggregate_qber, config.threshold, verdict
    );

    let delivery = check_gate(&session, aggregate_qber, config.threshold, verdict)
        .and_then(|()| deliver(&message_bits, &session.collected_key));
    if let Err(reason) = &delivery {
        warn!("transmission aborted: {}", reason);
    }

    Ok(TransmissionReport {
        message_bits: message_bits.len(),
        eavesdropper,
        threshold: config.threshold,
        session,
        aggregate_qber,
        verdict,
        delivery,
    })
}

fn check_gate(
    session: &AccumulatedSession,
    qber: f64,
    threshold: f64,
    verdict: SecurityVerdict,
) -> Result<()> {
    if session.total_sifted == 0 {
        return Err(Bb84Error::EmptySiftedKey);
    }
    if !verdict.is_secure() {
        return Err(Bb84Error::InsecureChannel { qber, threshold });
    }
    session.require_sufficient()
}

fn deliver(message_bits: &[bool], key: &[bool]) -> Result<Delivery> {
    let stream = tile_key(key, message_bits.len())?;
    let ciphertext = encrypt(message_bits, &stream)?;
    let recovered = decrypt(&ciphertext, &stream)?;
    Ok(Delivery {
        ciphertext,
        recovered_message: bits_to_text(&recovered),
        key_fingerprint: key_fingerprint(&stream),
    })
}

/// A single round with Eve on every qubit and no message: the textbook
/// demonstration that intercept-resend pushes sifted QBER towards 25%.
pub fn simulate_intercept_resend<R: Rng + ?Sized>(total_qubits: usize, rng: &mut R) -> Result<RoundResult> {
    simulate_intercept_resend_with(&ProbabilisticBackend, total_qubits, DEFAULT_SAMPLE_ROWS, rng)
}

pub fn simulate_intercept_resend_with<B, R>(
    backend: &B,
    total_qubits: usize,
    sample_rows: usize,
    rng: &mut R,
) -> Result<RoundResult>
where
    B: MeasurementBackend + ?Sized,
    R: Rng + ?Sized,
{
    let round = run_round_with(backend, total_qubits, true, sample_rows, rng)?;
    info!(
        "intercept-resend over {} qubits: {} sifted, {} errors, QBER {:.4}",
        total_qubits,
        round.sifted_count,
        round.error_count,
        round.qber()
    );
    Ok(round)
}
