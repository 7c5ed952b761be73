//! Loopback link model
//!
//! Answers every Interest with a Data packet of the same name after a fixed
//! round trip, unless the Interest is lost on the way.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::packet::{Data, Interest};

/// Why an Interest was not answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loss {
    /// Sequence is never answered
    Blackholed,
    /// One of the first N attempts for this sequence
    Scripted,
    /// Random loss
    Random,
}

/// Link model between the consumer and a producer
#[derive(Debug, Clone)]
pub struct Link {
    rtt: Duration,
    loss_rate: f64,
    hop_count: u32,
    blackholed: HashSet<u32>,
    /// Sequence -> attempts still to drop
    drop_first: HashMap<u32, u32>,
    /// Sequences answered twice
    duplicated: HashSet<u32>,
    content: Vec<u8>,
    rng: StdRng,
}

impl Link {
    /// Lossless link with a fixed round trip time
    pub fn new(rtt: Duration) -> Self {
        Self {
            rtt,
            loss_rate: 0.0,
            hop_count: 0,
            blackholed: HashSet::new(),
            drop_first: HashMap::new(),
            duplicated: HashSet::new(),
            content: Vec::new(),
            rng: StdRng::seed_from_u64(0),
        }
    }

    /// Drop each Interest independently with probability `rate`
    pub fn with_loss(mut self, rate: f64, seed: u64) -> Self {
        self.loss_rate = rate.clamp(0.0, 1.0);
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Hop count stamped on every reply
    pub fn with_hop_count(mut self, hop_count: u32) -> Self {
        self.hop_count = hop_count;
        self
    }

    /// Payload carried by every reply
    pub fn with_content(mut self, content: impl Into<Vec<u8>>) -> Self {
        self.content = content.into();
        self
    }

    /// Never answer `sequence`
    pub fn blackhole(mut self, sequence: u32) -> Self {
        self.blackholed.insert(sequence);
        self
    }

    /// Drop the first `attempts` Interests for `sequence`
    pub fn drop_first(mut self, sequence: u32, attempts: u32) -> Self {
        self.drop_first.insert(sequence, attempts);
        self
    }

    /// Answer `sequence` twice
    pub fn duplicate(mut self, sequence: u32) -> Self {
        self.duplicated.insert(sequence);
        self
    }

    /// Round trip time
    pub fn rtt(&self) -> Duration {
        self.rtt
    }

    /// Carry one Interest, returning the replies and their delays
    pub fn carry(&mut self, interest: &Interest) -> Result<Vec<(Duration, Data)>, Loss> {
        let sequence = interest.name().sequence_number().ok();

        if let Some(sequence) = sequence {
            if self.blackholed.contains(&sequence) {
                return Err(Loss::Blackholed);
            }
            if let Some(remaining) = self.drop_first.get_mut(&sequence)
                && *remaining > 0
            {
                *remaining -= 1;
                return Err(Loss::Scripted);
            }
        }
        if self.loss_rate > 0.0 && self.rng.r#gen::<f64>() < self.loss_rate {
            return Err(Loss::Random);
        }

        let data = Data::new(interest.name().clone(), self.content.clone())
            .with_hop_count(self.hop_count);
        let copies = match sequence {
            Some(sequence) if self.duplicated.contains(&sequence) => 2,
            _ => 1,
        };
        Ok(std::iter::repeat_n((self.rtt, data), copies).collect())
    }
}
