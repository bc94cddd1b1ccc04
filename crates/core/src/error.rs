//! Typed failures that callers may want to match on.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum WeaveError {
    #[error("no input clips to weave")]
    NoClips,

    #[error("position cycle is empty")]
    EmptyPositions,

    #[error("invalid tempo multiplier {0} (must be finite and > 0)")]
    InvalidTempo(f64),

    #[error("invalid config field {field}: {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: &'static str,
    },

    #[error("high-pass cutoff {cutoff_hz}Hz is at or above Nyquist for {sample_rate}Hz audio")]
    FilterCutoff { cutoff_hz: f64, sample_rate: u32 },
}
