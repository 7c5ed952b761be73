//! Collaborator interfaces consumed by the engine.
//!
//! The engine never owns a clock, a network or a metrics backend. It talks
//! to them through these traits so the same code runs under the
//! deterministic [`Simulation`](crate::sim::Simulation) and the tokio
//! [`ConsumerClient`](crate::client::ConsumerClient).

use std::time::{Duration, Instant};

use crate::packet::Interest;

/// Timers the engine can request from its scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timer {
    /// Send the next Interest (fresh or retransmission).
    SendNext,
    /// Sweep outstanding requests for expired deadlines.
    RetxSweep,
}

/// Handle identifying one scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    /// Wrap a raw handle value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw handle value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Event scheduler with a monotonic clock.
///
/// Scheduled timers are delivered back to the engine through
/// [`Consumer::on_timer`](crate::consumer::Consumer::on_timer) in deadline
/// order. Cancelling a handle that already fired is a no-op.
pub trait Scheduler {
    /// Current time on the scheduler's clock.
    fn now(&self) -> Instant;

    /// Schedule `timer` to fire after `delay`.
    fn schedule(&mut self, delay: Duration, timer: Timer) -> TimerHandle;

    /// Cancel a pending timer.
    fn cancel(&mut self, handle: TimerHandle);
}

/// Outbound side of the network face.
pub trait Face {
    /// Hand a fully formed Interest to the network. Fire-and-forget.
    fn send_interest(&mut self, interest: Interest);
}

impl Face for Vec<Interest> {
    fn send_interest(&mut self, interest: Interest) {
        self.push(interest);
    }
}

/// Delay measurement emitted when a reply is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayEvent {
    /// Delay between the last (re)transmission and the reply.
    LastRetransmitted {
        /// Sequence number of the request.
        sequence: u32,
        /// Elapsed time since the last transmission.
        delay: Duration,
        /// Hops the reply travelled.
        hop_count: u32,
    },
    /// Delay between the first transmission and the reply.
    FirstSent {
        /// Sequence number of the request.
        sequence: u32,
        /// Elapsed time since the first transmission.
        delay: Duration,
        /// Transmissions made, including the first.
        transmissions: u32,
        /// Hops the reply travelled.
        hop_count: u32,
    },
}

impl DelayEvent {
    /// Sequence number the event refers to.
    pub fn sequence(&self) -> u32 {
        match self {
            DelayEvent::LastRetransmitted { sequence, .. }
            | DelayEvent::FirstSent { sequence, .. } => *sequence,
        }
    }

    /// Measured delay.
    pub fn delay(&self) -> Duration {
        match self {
            DelayEvent::LastRetransmitted { delay, .. } | DelayEvent::FirstSent { delay, .. } => {
                *delay
            }
        }
    }
}

/// Observability sink for delay measurements.
pub trait DelaySink {
    /// Record one delay event.
    fn record(&mut self, event: DelayEvent);
}

impl DelaySink for () {
    fn record(&mut self, _event: DelayEvent) {}
}

impl DelaySink for Vec<DelayEvent> {
    fn record(&mut self, event: DelayEvent) {
        self.push(event);
    }
}

/// Sink that emits delay events as `tracing` records.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DelaySink for TracingSink {
    fn record(&mut self, event: DelayEvent) {
        match event {
            DelayEvent::LastRetransmitted {
                sequence,
                delay,
                hop_count,
            } => tracing::info!(
                target: "ndn_consumer::delay",
                kind = "last",
                sequence,
                delay_us = delay.as_micros() as u64,
                hop_count,
                "last-retransmission-to-data delay"
            ),
            DelayEvent::FirstSent {
                sequence,
                delay,
                transmissions,
                hop_count,
            } => tracing::info!(
                target: "ndn_consumer::delay",
                kind = "full",
                sequence,
                delay_us = delay.as_micros() as u64,
                transmissions,
                hop_count,
                "first-interest-to-data delay"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_event_accessors() {
        let last = DelayEvent::LastRetransmitted {
            sequence: 4,
            delay: Duration::from_millis(30),
            hop_count: 2,
        };
        let full = DelayEvent::FirstSent {
            sequence: 4,
            delay: Duration::from_millis(90),
            transmissions: 2,
            hop_count: 2,
        };

        assert_eq!(last.sequence(), 4);
        assert_eq!(full.sequence(), 4);
        assert_eq!(last.delay(), Duration::from_millis(30));
        assert_eq!(full.delay(), Duration::from_millis(90));
    }

    #[test]
    fn test_vec_sink_records_in_order() {
        let mut sink: Vec<DelayEvent> = Vec::new();
        for sequence in 0..3 {
            sink.record(DelayEvent::LastRetransmitted {
                sequence,
                delay: Duration::ZERO,
                hop_count: 0,
            });
        }
        let seqs: Vec<u32> = sink.iter().map(DelayEvent::sequence).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
    }
}
