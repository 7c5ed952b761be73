//! RTT estimation and retransmission timeout.
//!
//! Mean/deviation estimator in the style of RFC 6298 with Karn's rule:
//! a reply to a retransmitted Interest is ambiguous, so it clears in-flight
//! state without contributing a sample.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::core::ConfigError;
use crate::core::constants;

/// Estimator parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RtoConfig {
    /// RTT estimate used until the first sample arrives.
    pub initial_estimate: Duration,
    /// Lower bound on the unscaled RTO.
    pub min_rto: Duration,
    /// Upper bound on the scaled RTO.
    pub max_rto: Duration,
    /// Cap on the backoff multiplier.
    pub max_multiplier: u32,
}

impl Default for RtoConfig {
    fn default() -> Self {
        Self {
            initial_estimate: constants::INITIAL_RTT_ESTIMATE,
            min_rto: constants::MIN_RTO,
            max_rto: constants::MAX_RTO,
            max_multiplier: constants::MAX_RTO_MULTIPLIER,
        }
    }
}

impl RtoConfig {
    /// Check the bounds are consistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_rto > self.max_rto {
            return Err(ConfigError::InvertedRtoBounds {
                min: self.min_rto,
                max: self.max_rto,
            });
        }
        if self.max_multiplier == 0 {
            return Err(ConfigError::ZeroMaxMultiplier);
        }
        Ok(())
    }
}

/// Send record for one in-flight sequence.
#[derive(Debug, Clone, Copy)]
struct InFlight {
    sent_at: Instant,
    sampling_disabled: bool,
}

/// RTO estimator.
///
/// Maintains smoothed RTT (SRTT) and RTT variation (RTTVAR) and derives
///
/// ```text
/// RTO = min(max_rto, multiplier * max(min_rto, SRTT + 4 * RTTVAR))
/// ```
///
/// The multiplier doubles on every timeout and returns to 1 after the next
/// sample taken from a request that was transmitted only once.
#[derive(Debug, Clone)]
pub struct RtoEstimator {
    config: RtoConfig,
    /// Smoothed RTT in milliseconds.
    srtt: f64,
    /// RTT variation in milliseconds.
    rttvar: f64,
    /// Whether we've received the first RTT sample.
    initialized: bool,
    /// Backoff multiplier applied to the RTO.
    multiplier: u32,
    /// Send records keyed by sequence.
    in_flight: HashMap<u32, InFlight>,
}

impl Default for RtoEstimator {
    fn default() -> Self {
        Self::new(RtoConfig::default())
    }
}

impl RtoEstimator {
    /// Create an estimator seeded with the configured initial estimate.
    pub fn new(config: RtoConfig) -> Self {
        Self {
            config,
            srtt: duration_to_ms(config.initial_estimate),
            rttvar: 0.0,
            initialized: false,
            multiplier: 1,
            in_flight: HashMap::new(),
        }
    }

    /// Register a transmission of `sequence`.
    ///
    /// A second transmission of a sequence that still has a record is a
    /// retransmission and always disables sampling. Once disabled, sampling
    /// stays disabled until the record is cleared.
    pub fn record_send(&mut self, sequence: u32, now: Instant, disable_sampling: bool) {
        match self.in_flight.get_mut(&sequence) {
            Some(record) => {
                record.sent_at = now;
                record.sampling_disabled = true;
            }
            None => {
                self.in_flight.insert(
                    sequence,
                    InFlight {
                        sent_at: now,
                        sampling_disabled: disable_sampling,
                    },
                );
            }
        }
    }

    /// Register the reply for `sequence`.
    ///
    /// Returns the time elapsed since the last recorded send, or `None` if
    /// the sequence is unknown. The elapsed time feeds the estimate only when
    /// sampling was not disabled.
    pub fn record_ack(&mut self, sequence: u32, now: Instant) -> Option<Duration> {
        let record = self.in_flight.remove(&sequence)?;
        let elapsed = now.saturating_duration_since(record.sent_at);

        if record.sampling_disabled {
            tracing::trace!(sequence, "rto: ambiguous sample ignored");
        } else {
            self.update(elapsed);
            self.multiplier = 1;
        }
        Some(elapsed)
    }

    /// Forget the send record for `sequence` without sampling.
    pub fn discard(&mut self, sequence: u32) {
        self.in_flight.remove(&sequence);
    }

    /// Double the backoff multiplier, up to the configured cap.
    pub fn increase_multiplier(&mut self) {
        self.multiplier = self
            .multiplier
            .saturating_mul(2)
            .min(self.config.max_multiplier);
        tracing::debug!(
            multiplier = self.multiplier,
            rto_ms = self.current_timeout().as_millis() as u64,
            "rto: backoff"
        );
    }

    /// Feed one RTT sample into SRTT and RTTVAR.
    ///
    /// - First sample: SRTT = sample, RTTVAR = sample / 2
    /// - Subsequent: RTTVAR += h * (|sample - SRTT| - RTTVAR), SRTT += g * (sample - SRTT)
    pub fn update(&mut self, sample: Duration) {
        let sample_ms = duration_to_ms(sample);

        if !self.initialized {
            self.srtt = sample_ms;
            self.rttvar = sample_ms / 2.0;
            self.initialized = true;
        } else {
            let err = sample_ms - self.srtt;
            self.rttvar += constants::RTTVAR_GAIN * (err.abs() - self.rttvar);
            self.srtt += constants::SRTT_GAIN * err;
        }

        tracing::trace!(
            sample_ms,
            srtt_ms = self.srtt,
            rttvar_ms = self.rttvar,
            "rto: sample"
        );
    }

    /// Current retransmission timeout.
    pub fn current_timeout(&self) -> Duration {
        let min_ms = duration_to_ms(self.config.min_rto);
        let max_ms = duration_to_ms(self.config.max_rto);
        let base_ms = f64::max(min_ms, self.srtt + constants::RTTVAR_WEIGHT * self.rttvar);
        let rto_ms = (base_ms * self.multiplier as f64).min(max_ms);
        ms_to_duration(rto_ms)
    }

    /// Smoothed RTT.
    pub fn srtt(&self) -> Duration {
        ms_to_duration(self.srtt)
    }

    /// RTT variation.
    pub fn rttvar(&self) -> Duration {
        ms_to_duration(self.rttvar)
    }

    /// Current backoff multiplier.
    pub fn multiplier(&self) -> u32 {
        self.multiplier
    }

    /// Whether at least one sample has been taken.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether a send record exists for `sequence`.
    pub fn is_tracking(&self, sequence: u32) -> bool {
        self.in_flight.contains_key(&sequence)
    }

    /// Whether the reply to `sequence` will be ignored for sampling.
    pub fn is_sampling_disabled(&self, sequence: u32) -> Option<bool> {
        self.in_flight.get(&sequence).map(|r| r.sampling_disabled)
    }

    /// Number of sequences with a send record.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Estimator parameters.
    pub fn config(&self) -> &RtoConfig {
        &self.config
    }
}

fn duration_to_ms(d: Duration) -> f64 {
    d.as_nanos() as f64 / 1_000_000.0
}

fn ms_to_duration(ms: f64) -> Duration {
    Duration::from_nanos((ms * 1_000_000.0).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_ms(initial: u64, min: u64, max: u64) -> RtoConfig {
        RtoConfig {
            initial_estimate: Duration::from_millis(initial),
            min_rto: Duration::from_millis(min),
            max_rto: Duration::from_millis(max),
            max_multiplier: constants::MAX_RTO_MULTIPLIER,
        }
    }

    #[test]
    fn test_initial_timeout() {
        let estimator = RtoEstimator::default();
        assert!(!estimator.is_initialized());
        assert_eq!(estimator.current_timeout(), constants::INITIAL_RTT_ESTIMATE);

        // Initial estimate below the floor is raised to min_rto
        let estimator = RtoEstimator::new(config_ms(50, 200, 1000));
        assert_eq!(estimator.current_timeout(), Duration::from_millis(200));
    }

    #[test]
    fn test_first_sample() {
        let mut estimator = RtoEstimator::new(config_ms(1000, 10, 60_000));
        estimator.update(Duration::from_millis(100));

        assert!(estimator.is_initialized());
        assert_eq!(estimator.srtt(), Duration::from_millis(100));
        assert_eq!(estimator.rttvar(), Duration::from_millis(50));
        // 100 + 4 * 50
        assert_eq!(estimator.current_timeout(), Duration::from_millis(300));
    }

    #[test]
    fn test_smoothing_gains() {
        let mut estimator = RtoEstimator::new(config_ms(1000, 10, 60_000));
        estimator.update(Duration::from_millis(100));
        estimator.update(Duration::from_millis(180));

        // RTTVAR = 50 + 0.25 * (80 - 50) = 57.5, SRTT = 100 + 0.125 * 80 = 110
        assert_eq!(estimator.srtt(), Duration::from_millis(110));
        assert_eq!(estimator.rttvar(), Duration::from_micros(57_500));
    }

    #[test]
    fn test_ack_samples_and_clears() {
        let start = Instant::now();
        let mut estimator = RtoEstimator::new(config_ms(1000, 10, 60_000));

        estimator.record_send(1, start, false);
        assert!(estimator.is_tracking(1));

        let elapsed = estimator.record_ack(1, start + Duration::from_millis(40));
        assert_eq!(elapsed, Some(Duration::from_millis(40)));
        assert!(!estimator.is_tracking(1));
        assert_eq!(estimator.srtt(), Duration::from_millis(40));
    }

    #[test]
    fn test_unknown_ack_is_noop() {
        let mut estimator = RtoEstimator::default();
        let before = estimator.current_timeout();
        assert_eq!(estimator.record_ack(99, Instant::now()), None);
        assert!(!estimator.is_initialized());
        assert_eq!(estimator.current_timeout(), before);
    }

    #[test]
    fn test_karn_retransmission_not_sampled() {
        let start = Instant::now();
        let mut estimator = RtoEstimator::new(config_ms(1000, 10, 60_000));
        estimator.update(Duration::from_millis(100));
        let (srtt, rttvar) = (estimator.srtt(), estimator.rttvar());

        estimator.record_send(7, start, false);
        // Second send of the same sequence disables sampling
        estimator.record_send(7, start + Duration::from_millis(300), false);
        assert_eq!(estimator.is_sampling_disabled(7), Some(true));

        let elapsed = estimator.record_ack(7, start + Duration::from_millis(380));
        assert_eq!(elapsed, Some(Duration::from_millis(80)));
        assert_eq!(estimator.srtt(), srtt);
        assert_eq!(estimator.rttvar(), rttvar);
        assert!(!estimator.is_tracking(7));
    }

    #[test]
    fn test_discard_without_sample() {
        let start = Instant::now();
        let mut estimator = RtoEstimator::default();
        estimator.record_send(3, start, false);
        estimator.discard(3);
        assert!(!estimator.is_tracking(3));
        assert_eq!(estimator.record_ack(3, start + Duration::from_millis(5)), None);
        assert!(!estimator.is_initialized());
    }

    #[test]
    fn test_backoff_never_decreases() {
        let mut estimator = RtoEstimator::new(config_ms(100, 10, 60_000));
        let mut previous = estimator.current_timeout();
        for _ in 0..10 {
            estimator.increase_multiplier();
            let rto = estimator.current_timeout();
            assert!(rto >= previous);
            previous = rto;
        }
        assert_eq!(estimator.multiplier(), constants::MAX_RTO_MULTIPLIER);
    }

    #[test]
    fn test_backoff_capped_at_max_rto() {
        let mut estimator = RtoEstimator::new(config_ms(1000, 10, 5000));
        for _ in 0..5 {
            estimator.increase_multiplier();
        }
        assert_eq!(estimator.current_timeout(), Duration::from_millis(5000));
    }

    #[test]
    fn test_multiplier_resets_on_eligible_ack_only() {
        let start = Instant::now();
        let mut estimator = RtoEstimator::new(config_ms(100, 10, 60_000));
        estimator.increase_multiplier();
        estimator.increase_multiplier();
        assert_eq!(estimator.multiplier(), 4);

        // Ambiguous ack keeps the backoff
        estimator.record_send(1, start, true);
        estimator.record_ack(1, start + Duration::from_millis(50));
        assert_eq!(estimator.multiplier(), 4);

        // Clean ack resets it
        estimator.record_send(2, start, false);
        estimator.record_ack(2, start + Duration::from_millis(50));
        assert_eq!(estimator.multiplier(), 1);
        // 50 + 4 * 25
        assert_eq!(estimator.current_timeout(), Duration::from_millis(150));
    }

    #[test]
    fn test_config_validation() {
        assert!(RtoConfig::default().validate().is_ok());
        assert!(matches!(
            config_ms(100, 500, 100).validate(),
            Err(ConfigError::InvertedRtoBounds { .. })
        ));
        let zero = RtoConfig {
            max_multiplier: 0,
            ..RtoConfig::default()
        };
        assert_eq!(zero.validate(), Err(ConfigError::ZeroMaxMultiplier));
    }
}
