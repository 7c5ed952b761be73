//! Timing layer: RTO estimation and Interest pacing.
//!
//! - **RTO estimation**: [`RtoEstimator`] with SRTT/RTTVAR smoothing, Karn's
//!   rule and exponential backoff
//! - **Pacing**: [`InterestPacer`] for constant-rate and randomized sending

mod pacing;
mod timing;

pub use pacing::{InterestPacer, Randomize};
pub use timing::{RtoConfig, RtoEstimator};
