//! Reply reconciliation
//!
//! Matches an incoming Data packet to its outstanding request, emits the
//! two delay measurements, feeds the RTO estimator and retires the request.

use std::time::{Duration, Instant};

use super::sequencer::RequestSequencer;
use super::tracker::RequestTracker;
use crate::core::{DelayEvent, DelaySink};
use crate::packet::Data;
use crate::transport::RtoEstimator;

/// Measurements for a matched reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciled {
    /// Sequence number of the request
    pub sequence: u32,
    /// Time since the last (re)transmission
    pub last_delay: Duration,
    /// Time since the first transmission
    pub first_delay: Duration,
    /// Transmissions made, including the first
    pub transmissions: u32,
    /// Hops the reply travelled
    pub hop_count: u32,
}

/// Result of processing one reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// Reply matched an outstanding request
    Matched(Reconciled),
    /// No outstanding request for this sequence (late duplicate or foreign)
    Unknown(u32),
    /// Name has no usable sequence-number suffix
    Malformed,
    /// Consumer is stopped; reply ignored
    Inactive,
}

/// Reply reconciler owning the delay sink
#[derive(Debug, Clone, Default)]
pub struct DataReconciler<S> {
    sink: S,
}

impl<S: DelaySink> DataReconciler<S> {
    /// Process a reply received at `now`
    ///
    /// Never fails: malformed and unknown replies leave the request state
    /// untouched apart from idempotent cleanup.
    pub fn reconcile(
        &mut self,
        data: &Data,
        now: Instant,
        tracker: &mut RequestTracker,
        sequencer: &mut RequestSequencer,
        rto: &mut RtoEstimator,
    ) -> ReplyOutcome {
        let sequence = match data.name().sequence_number() {
            Ok(sequence) => sequence,
            Err(err) => {
                tracing::debug!(name = %data.name(), %err, "dropping malformed data");
                return ReplyOutcome::Malformed;
            }
        };
        tracing::debug!("< Data for {}", sequence);

        let outcome = match tracker.remove(sequence) {
            Some(entry) => {
                let reconciled = Reconciled {
                    sequence,
                    last_delay: now.saturating_duration_since(entry.last_send_time()),
                    first_delay: now.saturating_duration_since(entry.first_send_time()),
                    transmissions: entry.transmissions(),
                    hop_count: data.hop_count(),
                };
                self.sink.record(DelayEvent::LastRetransmitted {
                    sequence,
                    delay: reconciled.last_delay,
                    hop_count: reconciled.hop_count,
                });
                self.sink.record(DelayEvent::FirstSent {
                    sequence,
                    delay: reconciled.first_delay,
                    transmissions: reconciled.transmissions,
                    hop_count: reconciled.hop_count,
                });
                ReplyOutcome::Matched(reconciled)
            }
            None => ReplyOutcome::Unknown(sequence),
        };

        sequencer.cancel_retransmit(sequence);
        rto.record_ack(sequence, now);
        outcome
    }
}

impl<S> DataReconciler<S> {
    /// Create a reconciler reporting to `sink`
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Delay sink
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutable delay sink
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Consume the reconciler, returning the sink
    pub fn into_sink(self) -> S {
        self.sink
    }
}
