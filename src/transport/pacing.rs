//! Interest pacing.
//!
//! Decides how long to wait before the next send event. The first send after
//! start is immediate; afterwards Interests go out at a constant mean rate,
//! optionally randomized.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use rand::Rng;

use crate::core::ConfigError;
use crate::core::constants;

/// How the interval between Interests is randomized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Randomize {
    /// Constant interval of `1 / frequency`.
    #[default]
    None,
    /// Uniform in `[0, 2 / frequency)`.
    Uniform,
    /// Exponential with mean `1 / frequency` (Poisson arrivals).
    Exponential,
}

impl FromStr for Randomize {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Randomize::None),
            "uniform" => Ok(Randomize::Uniform),
            "exponential" => Ok(Randomize::Exponential),
            other => Err(ConfigError::UnknownRandomize(other.to_string())),
        }
    }
}

impl fmt::Display for Randomize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Randomize::None => "none",
            Randomize::Uniform => "uniform",
            Randomize::Exponential => "exponential",
        })
    }
}

/// Pacer for outgoing Interests.
#[derive(Debug, Clone)]
pub struct InterestPacer {
    /// Mean time between Interests.
    interval: Duration,
    randomize: Randomize,
    /// Whether the next send is the first since start.
    first_send: bool,
}

impl Default for InterestPacer {
    fn default() -> Self {
        Self::with_interval(
            Duration::from_secs_f64(1.0 / constants::DEFAULT_FREQUENCY),
            Randomize::None,
        )
    }
}

impl InterestPacer {
    /// Pace at `frequency` Interests per second.
    pub fn from_frequency(frequency: f64, randomize: Randomize) -> Result<Self, ConfigError> {
        if !frequency.is_finite() || frequency <= 0.0 {
            return Err(ConfigError::InvalidFrequency(frequency));
        }
        let interval = Duration::try_from_secs_f64(1.0 / frequency)
            .map_err(|_| ConfigError::InvalidFrequency(frequency))?;
        if interval > constants::MAX_SEND_INTERVAL {
            return Err(ConfigError::InvalidFrequency(frequency));
        }
        Ok(Self::with_interval(interval, randomize))
    }

    /// Pace with an explicit mean interval.
    pub fn with_interval(interval: Duration, randomize: Randomize) -> Self {
        Self {
            interval,
            randomize,
            first_send: true,
        }
    }

    /// Send back to back.
    pub fn immediate() -> Self {
        Self::with_interval(Duration::ZERO, Randomize::None)
    }

    /// Mean interval between Interests.
    pub fn mean_interval(&self) -> Duration {
        self.interval
    }

    /// Randomization mode.
    pub fn randomize(&self) -> Randomize {
        self.randomize
    }

    /// Make the next send immediate again (called on start).
    pub fn reset(&mut self) {
        self.first_send = true;
    }

    /// Delay before the next send event.
    pub fn next_delay<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Duration {
        if self.first_send {
            self.first_send = false;
            return Duration::ZERO;
        }
        if self.interval.is_zero() {
            return Duration::ZERO;
        }

        let mean = self.interval.as_secs_f64();
        match self.randomize {
            Randomize::None => self.interval,
            Randomize::Uniform => seconds(rng.gen_range(0.0..2.0 * mean)),
            Randomize::Exponential => {
                // Inverse transform; 1 - u is in (0, 1] so ln() is finite
                let u: f64 = rng.r#gen();
                let sample = -mean * (1.0 - u).ln();
                seconds(sample.min(constants::EXPONENTIAL_PACING_BOUND * mean))
            }
        }
    }
}

/// Convert non-negative seconds, saturating instead of panicking.
fn seconds(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}
