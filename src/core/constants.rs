//! Default parameters for the consumer engine.
//!
//! Every value here can be overridden through [`ConsumerBuilder`](crate::consumer::ConsumerBuilder)
//! or [`RtoConfig`](crate::transport::RtoConfig).

use std::time::Duration;

// =============================================================================
// REQUEST NAMING
// =============================================================================

/// Default first fresh sequence number.
pub const DEFAULT_START_SEQUENCE: u32 = 0;

/// Marker byte opening a sequence-number name component.
pub const SEQUENCE_NUMBER_MARKER: u8 = 0x00;

/// Default Interest lifetime carried on every request.
pub const DEFAULT_INTEREST_LIFETIME: Duration = Duration::from_secs(2);

// =============================================================================
// RETRANSMISSION
// =============================================================================

/// Default period of the retransmission sweep timer.
pub const DEFAULT_RETX_TIMER: Duration = Duration::from_millis(50);

/// Default number of retransmissions after the first transmission.
///
/// Two retransmissions give three transmissions in total.
pub const DEFAULT_MAX_RETRANSMISSIONS: u32 = 2;

// =============================================================================
// RTO ESTIMATION
// =============================================================================

/// RTT estimate used before the first sample.
pub const INITIAL_RTT_ESTIMATE: Duration = Duration::from_secs(1);

/// Minimum retransmission timeout.
pub const MIN_RTO: Duration = Duration::from_millis(200);

/// Maximum retransmission timeout.
pub const MAX_RTO: Duration = Duration::from_secs(200);

/// Upper bound on the exponential backoff multiplier.
pub const MAX_RTO_MULTIPLIER: u32 = 64;

/// Gain for SRTT smoothing (1/8).
pub const SRTT_GAIN: f64 = 0.125;

/// Gain for RTTVAR smoothing (1/4).
pub const RTTVAR_GAIN: f64 = 0.25;

/// Weight of RTTVAR in the RTO.
pub const RTTVAR_WEIGHT: f64 = 4.0;

// =============================================================================
// SEND PACING
// =============================================================================

/// Default Interest frequency (Hz).
pub const DEFAULT_FREQUENCY: f64 = 1.0;

/// Longest accepted mean interval between Interests (one year).
pub const MAX_SEND_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Exponential pacing delays are bounded at this many mean intervals.
pub const EXPONENTIAL_PACING_BOUND: f64 = 50.0;
