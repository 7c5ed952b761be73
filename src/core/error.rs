//! Error types for the consumer engine.
//!
//! The engine's event entry points never fail: malformed replies, unknown
//! sequences and exhausted retries all degrade to no-ops. Errors only exist
//! at the edges (name parsing and configuration).

use std::time::Duration;

use thiserror::Error;

/// Errors from parsing or interpreting names.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NameError {
    /// A `%` escape was not followed by two hex digits.
    #[error("invalid percent escape in component {0:?}")]
    InvalidEscape(String),

    /// The name has no components.
    #[error("name has no trailing component")]
    MissingComponent,

    /// The component does not carry a sequence number.
    #[error("component is not a sequence number")]
    NotSequenceNumber,
}

/// Errors from validating consumer configuration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// The retransmission sweep period must be non-zero.
    #[error("retransmission timer period must be non-zero")]
    ZeroRetxTimer,

    /// Interest frequency must be positive and finite.
    #[error("invalid interest frequency: {0}")]
    InvalidFrequency(f64),

    /// Back-to-back sending needs a bound on the sequence range.
    #[error("immediate sending requires a maximum sequence")]
    UnboundedImmediate,

    /// Unknown send-interval randomization mode.
    #[error("unknown randomization {0:?} (expected none, uniform or exponential)")]
    UnknownRandomize(String),

    /// RTO bounds are inverted.
    #[error("minimum RTO {min:?} exceeds maximum RTO {max:?}")]
    InvertedRtoBounds {
        /// Configured minimum.
        min: Duration,
        /// Configured maximum.
        max: Duration,
    },

    /// Backoff multiplier cap must be at least one.
    #[error("maximum RTO multiplier must be at least 1")]
    ZeroMaxMultiplier,

    /// The sequence range is empty.
    #[error("maximum sequence {max} does not exceed start sequence {start}")]
    EmptySequenceRange {
        /// First fresh sequence.
        start: u32,
        /// Exclusive upper bound.
        max: u32,
    },
}

/// Top-level consumer errors.
#[derive(Debug, Error)]
pub enum ConsumerError {
    /// Name error.
    #[error("name error: {0}")]
    Name(#[from] NameError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A setting could not be parsed.
    #[error("invalid setting {key}={value:?}: {reason}")]
    InvalidSetting {
        /// Setting name.
        key: String,
        /// Raw value.
        value: String,
        /// Parser message.
        reason: String,
    },
}
