//! Parameter scaling: conversions between native parameter ranges and
//! normalized values.
//!
//! Unsigned normalized values live in `[0, 1]`, signed ones in `[-1, 1]`.
//! None of these functions clamp; out-of-range inputs extrapolate.

use serde::{Deserialize, Serialize};

/// Standard concert pitch for A4 (MIDI note 69).
pub const A4_HZ: f64 = 440.0;

/// Map an unsigned normalized value in `[0, 1]` to `[min, max]`.
pub fn unsigned_norm_to_param(t: f64, min: f64, max: f64) -> f64 {
    min + (max - min) * t
}

/// Map a parameter value in `[min, max]` to `[0, 1]`.
///
/// An empty range maps every value to `0.0`.
pub fn param_to_unsigned_norm(p: f64, min: f64, max: f64) -> f64 {
    let span = max - min;
    if span == 0.0 {
        return 0.0;
    }
    (p - min) / span
}

/// `[0, 1]` → `[-1, 1]`.
pub fn unsigned_to_signed(t: f64) -> f64 {
    t * 2.0 - 1.0
}

/// `[-1, 1]` → `[0, 1]`.
pub fn signed_to_unsigned(t: f64) -> f64 {
    (t + 1.0) / 2.0
}

/// Map a signed normalized value in `[-1, 1]` to `[min, max]`.
pub fn signed_norm_to_param(t: f64, min: f64, max: f64) -> f64 {
    unsigned_norm_to_param(signed_to_unsigned(t), min, max)
}

/// Map a parameter value in `[min, max]` to `[-1, 1]`.
pub fn param_to_signed_norm(p: f64, min: f64, max: f64) -> f64 {
    unsigned_to_signed(param_to_unsigned_norm(p, min, max))
}

/// Logarithmic mapping of `[0, 1]` onto `[min, max]`: equal steps in `t`
/// give equal frequency ratios. Both bounds must be positive.
pub fn log_norm_to_param(t: f64, min: f64, max: f64) -> f64 {
    min * (max / min).powf(t)
}

/// Inverse of [`log_norm_to_param`].
pub fn param_to_log_norm(p: f64, min: f64, max: f64) -> f64 {
    let ratio = (max / min).ln();
    if ratio == 0.0 {
        return 0.0;
    }
    (p / min).ln() / ratio
}

/// Frequency in Hz of a (possibly fractional) MIDI note number.
pub fn midi_to_frequency(note: f64, tuning: f64) -> f64 {
    tuning * (2.0_f64).powf((note - 69.0) / 12.0)
}

/// Fractional MIDI note number for a frequency in Hz.
pub fn frequency_to_midi(frequency: f64, tuning: f64) -> f64 {
    69.0 + 12.0 * (frequency / tuning).log2()
}

// ── Taper ───────────────────────────────────────────────────

/// Response curve used when mapping a control position to a parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Taper {
    #[default]
    Linear,
    #[serde(alias = "log")]
    Logarithmic,
}

impl Taper {
    /// Normalized `[0, 1]` → parameter value.
    pub fn to_param(self, t: f64, min: f64, max: f64) -> f64 {
        match self {
            Taper::Logarithmic if log_capable(min, max) => log_norm_to_param(t, min, max),
            _ => unsigned_norm_to_param(t, min, max),
        }
    }

    /// Parameter value → normalized `[0, 1]`.
    pub fn to_norm(self, p: f64, min: f64, max: f64) -> f64 {
        match self {
            Taper::Logarithmic if log_capable(min, max) && p > 0.0 => {
                param_to_log_norm(p, min, max)
            }
            _ => param_to_unsigned_norm(p, min, max),
        }
    }
}

/// A log taper needs strictly positive bounds.
fn log_capable(min: f64, max: f64) -> bool {
    min > 0.0 && max > 0.0
}
