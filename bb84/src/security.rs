//! QBER threshold gate.

use serde::Serialize;

/// Functional QBER threshold above which a transmission is aborted.
pub const QBER_THRESHOLD: f64 = 0.11;

/// Expected sifted QBER under a full intercept-resend attack. Display reference only.
pub const THEORETICAL_INTERCEPT_QBER: f64 = 0.25;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum SecurityVerdict {
    Secure,
    Insecure,
}

impl SecurityVerdict {
    pub fn is_secure(self) -> bool {
        self == SecurityVerdict::Secure
    }
}

/// `Insecure` iff `qber` is strictly greater than `threshold`.
///
/// NaN compares as insecure.
pub fn decide(qber: f64, threshold: f64) -> SecurityVerdict {
    if qber <= threshold {
        SecurityVerdict::Secure
    } else {
        SecurityVerdict::Insecure
    }
}
