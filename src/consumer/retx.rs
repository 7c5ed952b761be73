//! Retransmission sweep
//!
//! A single recurring timer scans the tracker in deadline order and hands
//! every expired request to the timeout handler, which either queues a
//! retransmission or abandons the request once its budget is spent.

use std::time::{Duration, Instant};

use super::sequencer::RequestSequencer;
use super::tracker::RequestTracker;
use crate::core::{Scheduler, Timer, TimerHandle};
use crate::transport::RtoEstimator;

/// What the timeout handler decided for one sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutAction {
    /// Queued for retransmission
    Retransmit,
    /// Retry budget exhausted; all state dropped
    Abandon,
}

/// Sequences affected by one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Queued for retransmission
    pub retransmit: Vec<u32>,
    /// Permanently dropped
    pub abandoned: Vec<u32>,
}

impl SweepReport {
    /// Check if nothing expired
    pub fn is_empty(&self) -> bool {
        self.retransmit.is_empty() && self.abandoned.is_empty()
    }
}

/// Recurring retransmission sweep timer
#[derive(Debug, Clone)]
pub struct RetransmissionScheduler {
    /// Sweep period
    period: Duration,
    /// Retransmissions allowed after the first transmission
    max_retransmissions: u32,
    /// Pending sweep timer
    timer: Option<TimerHandle>,
}

impl RetransmissionScheduler {
    /// Create a disarmed scheduler
    pub fn new(period: Duration, max_retransmissions: u32) -> Self {
        Self {
            period,
            max_retransmissions,
            timer: None,
        }
    }

    /// Sweep period
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Retransmissions allowed after the first transmission
    pub fn max_retransmissions(&self) -> u32 {
        self.max_retransmissions
    }

    /// Check if a sweep timer is pending
    pub fn is_armed(&self) -> bool {
        self.timer.is_some()
    }

    /// Arm the sweep timer one period from now
    ///
    /// Any pending sweep timer is cancelled first, so at most one is live.
    pub fn arm<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) {
        if let Some(handle) = self.timer.take() {
            scheduler.cancel(handle);
        }
        self.timer = Some(scheduler.schedule(self.period, Timer::RetxSweep));
    }

    /// Cancel the pending sweep timer
    pub fn disarm<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) {
        if let Some(handle) = self.timer.take() {
            scheduler.cancel(handle);
        }
    }

    /// Change the sweep period, re-arming if a timer is pending
    pub fn set_period<S: Scheduler + ?Sized>(&mut self, period: Duration, scheduler: &mut S) {
        self.period = period;
        if self.timer.is_some() {
            self.arm(scheduler);
        }
    }

    /// Claim a fired sweep timer
    ///
    /// Returns `false` for a stale handle, which must be ignored.
    pub fn on_fire(&mut self, handle: TimerHandle) -> bool {
        if self.timer == Some(handle) {
            self.timer = None;
            true
        } else {
            false
        }
    }

    /// Escalate every request whose deadline has passed
    ///
    /// Stops at the first entry that has not expired; later entries were
    /// sent later and cannot have expired either.
    pub fn sweep(
        &self,
        now: Instant,
        tracker: &mut RequestTracker,
        rto: &mut RtoEstimator,
        sequencer: &mut RequestSequencer,
    ) -> SweepReport {
        let timeout = rto.current_timeout();
        let mut report = SweepReport::default();

        while let Some(sequence) = tracker.pop_expired(now, timeout) {
            match self.on_timeout(sequence, now, tracker, rto, sequencer) {
                TimeoutAction::Retransmit => report.retransmit.push(sequence),
                TimeoutAction::Abandon => report.abandoned.push(sequence),
            }
        }
        report
    }

    /// Handle the timeout of one request
    pub fn on_timeout(
        &self,
        sequence: u32,
        now: Instant,
        tracker: &mut RequestTracker,
        rto: &mut RtoEstimator,
        sequencer: &mut RequestSequencer,
    ) -> TimeoutAction {
        rto.increase_multiplier();

        let transmissions = tracker.retransmit_count_of(sequence);
        if transmissions <= self.max_retransmissions {
            tracing::debug!(sequence, transmissions, "timeout, queued for retransmission");
            rto.record_send(sequence, now, true);
            sequencer.enqueue_retransmit(sequence);
            TimeoutAction::Retransmit
        } else {
            tracing::debug!(sequence, transmissions, "timeout, retries exhausted");
            tracker.remove(sequence);
            sequencer.cancel_retransmit(sequence);
            rto.discard(sequence);
            TimeoutAction::Abandon
        }
    }
}
