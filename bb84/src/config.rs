//! Tunables for a transmission, loadable from TOML.
//!
//! ```toml
//! threshold = 0.11
//! multiplier = 4
//! min_round_size = 64
//! max_rounds = 8
//! # qubits_per_round = 400
//! sample_rows = 20
//! # seed = 84
//! ```

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Bb84Error, Result};
use crate::security::QBER_THRESHOLD;
use crate::session::{
    SessionConfig, DEFAULT_MAX_ROUNDS, DEFAULT_MIN_ROUND_SIZE, DEFAULT_MULTIPLIER,
    DEFAULT_SAMPLE_ROWS,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Bb84Config {
    /// Highest aggregate QBER still accepted as secure.
    pub threshold: f64,
    pub multiplier: usize,
    pub min_round_size: usize,
    pub max_rounds: usize,
    /// Fixed number of qubits per round; overrides `multiplier`.
    pub qubits_per_round: Option<usize>,
    pub sample_rows: usize,
    /// Seed for reproducible runs; entropy when absent.
    pub seed: Option<u64>,
}

impl Default for Bb84Config {
    fn default() -> Self {
        Self {
            threshold: QBER_THRESHOLD,
            multiplier: DEFAULT_MULTIPLIER,
            min_round_size: DEFAULT_MIN_ROUND_SIZE,
            max_rounds: DEFAULT_MAX_ROUNDS,
            qubits_per_round: None,
            sample_rows: DEFAULT_SAMPLE_ROWS,
            seed: None,
        }
    }
}

impl Bb84Config {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| Bb84Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            Bb84Error::InvalidConfig(format!("reading {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(Bb84Error::InvalidConfig(format!(
                "threshold must lie in [0, 1], got {}",
                self.threshold
            )));
        }
        self.session_config(1, false).validate()
    }

    /// Session parameters for a key of `target_bits` bits.
    pub fn session_config(&self, target_bits: usize, eavesdropper: bool) -> SessionConfig {
        SessionConfig {
            target_bits,
            eavesdropper,
            multiplier: self.multiplier,
            min_round_size: self.min_round_size,
            max_rounds: self.max_rounds,
            qubits_per_round: self.qubits_per_round,
            sample_rows: self.sample_rows,
        }
    }

    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}
