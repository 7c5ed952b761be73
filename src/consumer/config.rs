//! Consumer configuration.

use std::time::Duration;

use crate::core::ConfigError;
use crate::core::constants;
use crate::packet::Name;
use crate::transport::{InterestPacer, Randomize, RtoConfig};

/// Consumer configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumerConfig {
    /// Name prefix; the sequence number is appended to it.
    pub prefix: Name,

    /// First fresh sequence number.
    pub start_sequence: u32,

    /// Exclusive bound on fresh sequence numbers (`None` = unbounded).
    pub max_sequence: Option<u32>,

    /// Lifetime carried on every Interest.
    pub interest_lifetime: Duration,

    /// Period of the retransmission sweep.
    pub retx_timer: Duration,

    /// Retransmissions allowed after the first transmission.
    pub max_retransmissions: u32,

    /// Interests per second (`None` = back to back).
    pub frequency: Option<f64>,

    /// Randomization of the send interval.
    pub randomize: Randomize,

    /// RTO estimator parameters.
    pub rto: RtoConfig,

    /// Seed for nonces and randomized pacing (`None` = from entropy).
    pub seed: Option<u64>,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            prefix: Name::new(),
            start_sequence: constants::DEFAULT_START_SEQUENCE,
            max_sequence: None,
            interest_lifetime: constants::DEFAULT_INTEREST_LIFETIME,
            retx_timer: constants::DEFAULT_RETX_TIMER,
            max_retransmissions: constants::DEFAULT_MAX_RETRANSMISSIONS,
            frequency: Some(constants::DEFAULT_FREQUENCY),
            randomize: Randomize::None,
            rto: RtoConfig::default(),
            seed: None,
        }
    }
}

impl ConsumerConfig {
    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retx_timer.is_zero() {
            return Err(ConfigError::ZeroRetxTimer);
        }
        if let Some(max) = self.max_sequence
            && max <= self.start_sequence
        {
            return Err(ConfigError::EmptySequenceRange {
                start: self.start_sequence,
                max,
            });
        }
        if self.frequency.is_none() && self.max_sequence.is_none() {
            return Err(ConfigError::UnboundedImmediate);
        }
        self.rto.validate()?;
        self.pacer().map(|_| ())
    }

    /// Build the pacer described by `frequency` and `randomize`.
    pub fn pacer(&self) -> Result<InterestPacer, ConfigError> {
        match self.frequency {
            Some(frequency) => InterestPacer::from_frequency(frequency, self.randomize),
            None => Ok(InterestPacer::immediate()),
        }
    }
}

/// Builder for [`ConsumerConfig`].
#[derive(Debug, Default)]
pub struct ConsumerBuilder {
    config: ConsumerConfig,
}

impl ConsumerBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name prefix.
    pub fn prefix(mut self, prefix: Name) -> Self {
        self.config.prefix = prefix;
        self
    }

    /// Set the first fresh sequence number.
    pub fn start_sequence(mut self, start: u32) -> Self {
        self.config.start_sequence = start;
        self
    }

    /// Set the exclusive bound on fresh sequence numbers.
    pub fn max_sequence(mut self, max: u32) -> Self {
        self.config.max_sequence = Some(max);
        self
    }

    /// Remove the bound on fresh sequence numbers.
    pub fn unbounded(mut self) -> Self {
        self.config.max_sequence = None;
        self
    }

    /// Set the Interest lifetime.
    pub fn interest_lifetime(mut self, lifetime: Duration) -> Self {
        self.config.interest_lifetime = lifetime;
        self
    }

    /// Set the retransmission sweep period.
    pub fn retx_timer(mut self, period: Duration) -> Self {
        self.config.retx_timer = period;
        self
    }

    /// Set the number of retransmissions after the first transmission.
    pub fn max_retransmissions(mut self, max: u32) -> Self {
        self.config.max_retransmissions = max;
        self
    }

    /// Send at `frequency` Interests per second.
    pub fn frequency(mut self, frequency: f64) -> Self {
        self.config.frequency = Some(frequency);
        self
    }

    /// Send back to back. Requires a maximum sequence.
    pub fn immediate(mut self) -> Self {
        self.config.frequency = None;
        self
    }

    /// Set the send-interval randomization.
    pub fn randomize(mut self, randomize: Randomize) -> Self {
        self.config.randomize = randomize;
        self
    }

    /// Set the RTO estimator parameters.
    pub fn rto(mut self, rto: RtoConfig) -> Self {
        self.config.rto = rto;
        self
    }

    /// Seed the random source.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> Result<ConsumerConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
