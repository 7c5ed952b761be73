//! Consumer engine
//!
//! Wires the sequencer, tracker, RTO estimator, retransmission sweep and
//! reconciler to a face, a scheduler and a delay sink.
//!
//! The engine is single-threaded and event-driven: every entry point runs to
//! completion on `&mut self`. Timers come back through [`Consumer::on_timer`]
//! and replies through [`Consumer::on_data`].

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::config::ConsumerConfig;
use super::reconciler::{DataReconciler, ReplyOutcome};
use super::retx::RetransmissionScheduler;
use super::sequencer::RequestSequencer;
use super::tracker::RequestTracker;
use crate::core::{ConfigError, DelaySink, Face, Scheduler, Timer, TimerHandle};
use crate::packet::{Data, Interest};
use crate::transport::{InterestPacer, RtoEstimator};

/// Counters kept by the consumer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    /// Interests handed to the face, retransmissions included
    pub interests_sent: u64,
    /// Interests that were retransmissions
    pub retransmissions: u64,
    /// Deadline expiries detected by the sweep
    pub timeouts: u64,
    /// Requests abandoned after exhausting retries
    pub abandoned: u64,
    /// Replies matched to an outstanding request
    pub data_received: u64,
    /// Replies for sequences that were not outstanding
    pub unmatched_data: u64,
    /// Replies without a usable sequence number
    pub malformed_data: u64,
}

/// Sequenced Interest consumer
pub struct Consumer<F, S> {
    config: ConsumerConfig,
    face: F,
    tracker: RequestTracker,
    sequencer: RequestSequencer,
    rto: RtoEstimator,
    retx: RetransmissionScheduler,
    reconciler: DataReconciler<S>,
    pacer: InterestPacer,
    rng: StdRng,
    /// Pending send event
    send_timer: Option<TimerHandle>,
    active: bool,
    stats: ConsumerStats,
}

impl<F: Face, S: DelaySink> Consumer<F, S> {
    /// Create a stopped consumer
    pub fn new(config: ConsumerConfig, face: F, sink: S) -> Result<Self, ConfigError> {
        config.validate()?;
        let pacer = config.pacer()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            tracker: RequestTracker::new(),
            sequencer: RequestSequencer::new(config.start_sequence, config.max_sequence),
            rto: RtoEstimator::new(config.rto),
            retx: RetransmissionScheduler::new(config.retx_timer, config.max_retransmissions),
            reconciler: DataReconciler::new(sink),
            pacer,
            rng,
            send_timer: None,
            active: false,
            stats: ConsumerStats::default(),
            config,
            face,
        })
    }

    /// Start sending: arms the sweep and schedules an immediate first send
    pub fn start<Sch: Scheduler + ?Sized>(&mut self, scheduler: &mut Sch) {
        if self.active {
            return;
        }
        tracing::debug!(prefix = %self.config.prefix, "consumer started");
        self.active = true;
        self.pacer.reset();
        self.retx.arm(scheduler);
        self.schedule_next_send(scheduler);
    }

    /// Stop sending and cancel both timers
    ///
    /// Outstanding state is kept; replies arriving while stopped are ignored.
    pub fn stop<Sch: Scheduler + ?Sized>(&mut self, scheduler: &mut Sch) {
        if !self.active {
            return;
        }
        tracing::debug!(prefix = %self.config.prefix, "consumer stopped");
        self.active = false;
        if let Some(handle) = self.send_timer.take() {
            scheduler.cancel(handle);
        }
        self.retx.disarm(scheduler);
    }

    /// Dispatch a fired timer
    pub fn on_timer<Sch: Scheduler + ?Sized>(
        &mut self,
        handle: TimerHandle,
        timer: Timer,
        scheduler: &mut Sch,
    ) {
        match timer {
            Timer::SendNext => {
                if self.send_timer != Some(handle) {
                    return;
                }
                self.send_timer = None;
                if self.active {
                    self.send_packet(scheduler);
                }
            }
            Timer::RetxSweep => {
                if self.retx.on_fire(handle) && self.active {
                    self.check_retx_timeout(scheduler);
                }
            }
        }
    }

    /// Process a reply from the face
    pub fn on_data<Sch: Scheduler + ?Sized>(
        &mut self,
        data: &Data,
        scheduler: &mut Sch,
    ) -> ReplyOutcome {
        if !self.active {
            return ReplyOutcome::Inactive;
        }
        let outcome = self.reconciler.reconcile(
            data,
            scheduler.now(),
            &mut self.tracker,
            &mut self.sequencer,
            &mut self.rto,
        );
        match outcome {
            ReplyOutcome::Matched(_) => self.stats.data_received += 1,
            ReplyOutcome::Unknown(_) => self.stats.unmatched_data += 1,
            ReplyOutcome::Malformed => self.stats.malformed_data += 1,
            ReplyOutcome::Inactive => {}
        }
        outcome
    }

    /// Change the sweep period
    ///
    /// The pending sweep timer, if any, is cancelled before the new one is
    /// armed.
    pub fn set_retx_timer<Sch: Scheduler + ?Sized>(
        &mut self,
        period: Duration,
        scheduler: &mut Sch,
    ) -> Result<(), ConfigError> {
        if period.is_zero() {
            return Err(ConfigError::ZeroRetxTimer);
        }
        self.config.retx_timer = period;
        self.retx.set_period(period, scheduler);
        Ok(())
    }

    fn send_packet<Sch: Scheduler + ?Sized>(&mut self, scheduler: &mut Sch) {
        let Some(sequence) = self.sequencer.next() else {
            tracing::debug!("no sequence to send");
            return;
        };
        let now = scheduler.now();

        let name = self.config.prefix.with_sequence_number(sequence);
        let interest = Interest::new(name.clone(), self.rng.r#gen(), self.config.interest_lifetime);

        let transmissions = self.tracker.record(sequence, name, now);
        self.rto.record_send(sequence, now, transmissions > 1);

        self.stats.interests_sent += 1;
        if transmissions > 1 {
            self.stats.retransmissions += 1;
        }
        tracing::debug!(transmissions, "> Interest for {}", sequence);

        self.face.send_interest(interest);
        self.schedule_next_send(scheduler);
    }

    fn check_retx_timeout<Sch: Scheduler + ?Sized>(&mut self, scheduler: &mut Sch) {
        let report = self.retx.sweep(
            scheduler.now(),
            &mut self.tracker,
            &mut self.rto,
            &mut self.sequencer,
        );
        self.stats.timeouts += (report.retransmit.len() + report.abandoned.len()) as u64;
        self.stats.abandoned += report.abandoned.len() as u64;

        if !report.retransmit.is_empty() {
            self.schedule_next_send(scheduler);
        }
        self.retx.arm(scheduler);
    }

    fn schedule_next_send<Sch: Scheduler + ?Sized>(&mut self, scheduler: &mut Sch) {
        if self.send_timer.is_some() || !self.sequencer.has_pending() {
            return;
        }
        let delay = self.pacer.next_delay(&mut self.rng);
        self.send_timer = Some(scheduler.schedule(delay, Timer::SendNext));
    }
}

impl<F, S> Consumer<F, S> {
    /// Check if the consumer is running
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Check if every request is settled and nothing is left to send
    pub fn is_finished(&self) -> bool {
        self.tracker.is_empty() && !self.sequencer.has_pending()
    }

    /// Number of outstanding requests
    pub fn outstanding(&self) -> usize {
        self.tracker.len()
    }

    /// Counters
    pub fn stats(&self) -> ConsumerStats {
        self.stats
    }

    /// Configuration in effect
    pub fn config(&self) -> &ConsumerConfig {
        &self.config
    }

    /// Outstanding request tracker
    pub fn tracker(&self) -> &RequestTracker {
        &self.tracker
    }

    /// Sequence selector
    pub fn sequencer(&self) -> &RequestSequencer {
        &self.sequencer
    }

    /// RTO estimator
    pub fn rto(&self) -> &RtoEstimator {
        &self.rto
    }

    /// Retransmission sweep timer
    pub fn retx(&self) -> &RetransmissionScheduler {
        &self.retx
    }

    /// Face
    pub fn face(&self) -> &F {
        &self.face
    }

    /// Mutable face
    pub fn face_mut(&mut self) -> &mut F {
        &mut self.face
    }

    /// Delay sink
    pub fn sink(&self) -> &S {
        self.reconciler.sink()
    }

    /// Mutable delay sink
    pub fn sink_mut(&mut self) -> &mut S {
        self.reconciler.sink_mut()
    }
}
