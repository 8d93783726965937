//! # bb84
//!
//! Classical, probabilistic simulation of the BB84 quantum key distribution
//! protocol, with eavesdropping detection and QBER-gated XOR encryption.
//!
//! Qubits are never represented as amplitudes. Each one is a bit prepared in
//! one of two conjugate bases; measuring in the preparation basis returns the
//! bit, measuring in the other basis returns a fair coin flip. That rule alone
//! reproduces the protocol statistics:
//!
//! - **Sifting** keeps ~50% of the qubits (positions where the bases agree).
//! - **Intercept-resend**: Eve measures in a random basis and resends what she
//!   saw, so ~25% of sifted bits disagree.
//! - **Gate**: a session whose aggregate QBER exceeds 11% is aborted before any
//!   ciphertext exists.
//!
//! ## Usage
//!
//! ```
//! use bb84::prelude::*;
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let mut rng = StdRng::seed_from_u64(84);
//! let report = run_transmission("HI", false, &Bb84Config::default(), &mut rng).unwrap();
//! assert_eq!(report.verdict, SecurityVerdict::Secure);
//! assert_eq!(report.delivery.unwrap().recovered_message, "HI");
//! ```

pub mod bb84;
pub mod bb84_protocol;
pub mod bb84_states;
pub mod cipher;
pub mod config;
pub mod error;
pub mod security;
pub mod session;
pub mod sifting;

pub use error::{Bb84Error, Result};

pub mod prelude {
    pub use crate::bb84::*;
    pub use crate::bb84_protocol::*;
    pub use crate::bb84_states::*;
    pub use crate::cipher::*;
    pub use crate::config::*;
    pub use crate::error::{Bb84Error, Result};
    pub use crate::security::*;
    pub use crate::session::*;
    pub use crate::sifting::*;
}
