//! Discrete-event simulation of a consumer over a [`Link`]
//!
//! Time is virtual: the clock jumps from one event to the next, so a run
//! covering minutes of protocol time completes instantly and the same
//! configuration always produces the same trace.

use std::time::{Duration, Instant};

use super::link::Link;
use crate::consumer::{Consumer, ConsumerConfig, ReplyOutcome};
use crate::core::{ConfigError, DelaySink, Timer};
use crate::event::EventQueue;
use crate::packet::{Data, Interest};

/// Event in the simulation queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimEvent {
    /// Engine timer
    Timer(Timer),
    /// Reply reaching the consumer
    Deliver(Data),
}

impl From<Timer> for SimEvent {
    fn from(timer: Timer) -> Self {
        SimEvent::Timer(timer)
    }
}

/// One Interest leaving the consumer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transmission {
    /// Time since the start of the simulation
    pub at: Duration,
    /// Sequence number, if the name carries one
    pub sequence: Option<u32>,
    /// Whether the link dropped it
    pub lost: bool,
}

/// Simulated consumer, link and clock
pub struct Simulation<S> {
    consumer: Consumer<Vec<Interest>, S>,
    link: Link,
    queue: EventQueue<SimEvent>,
    origin: Instant,
    transmissions: Vec<Transmission>,
    replies: Vec<(Duration, ReplyOutcome)>,
}

impl<S: DelaySink> Simulation<S> {
    /// Create a simulation at time zero; the consumer is not started
    pub fn new(config: ConsumerConfig, link: Link, sink: S) -> Result<Self, ConfigError> {
        let origin = Instant::now();
        Ok(Self {
            consumer: Consumer::new(config, Vec::new(), sink)?,
            link,
            queue: EventQueue::new(origin),
            origin,
            transmissions: Vec::new(),
            replies: Vec::new(),
        })
    }

    /// Start the consumer at the current virtual time
    pub fn start(&mut self) {
        self.consumer.start(&mut self.queue);
        self.flush();
    }

    /// Stop the consumer at the current virtual time
    pub fn stop(&mut self) {
        self.consumer.stop(&mut self.queue);
    }

    /// Change the sweep period at the current virtual time
    pub fn set_retx_timer(&mut self, period: Duration) -> Result<(), ConfigError> {
        self.consumer.set_retx_timer(period, &mut self.queue)
    }

    /// Schedule an arbitrary reply `delay` from now
    pub fn inject(&mut self, delay: Duration, data: Data) {
        self.queue.push(delay, SimEvent::Deliver(data));
    }

    /// Dispatch the next event. Returns `false` when the queue is empty.
    pub fn step(&mut self) -> bool {
        let Some((handle, event)) = self.queue.pop() else {
            return false;
        };
        match event {
            SimEvent::Timer(timer) => self.consumer.on_timer(handle, timer, &mut self.queue),
            SimEvent::Deliver(data) => {
                let outcome = self.consumer.on_data(&data, &mut self.queue);
                let at = self.elapsed();
                self.replies.push((at, outcome));
            }
        }
        self.flush();
        true
    }

    /// Run every event due up to `offset` from the start, then move the clock
    /// to `offset`
    pub fn run_until(&mut self, offset: Duration) {
        let target = self.origin + offset;
        while let Some(deadline) = self.queue.next_deadline() {
            if deadline > target {
                break;
            }
            self.step();
        }
        self.queue.advance_to(target);
    }

    /// Run until every request is settled or `limit` is reached
    ///
    /// Returns `true` if the consumer finished.
    pub fn run_to_completion(&mut self, limit: Duration) -> bool {
        let target = self.origin + limit;
        while !self.consumer.is_finished() {
            match self.queue.next_deadline() {
                Some(deadline) if deadline <= target => {
                    self.step();
                }
                _ => return false,
            }
        }
        true
    }

    fn flush(&mut self) {
        let at = self.elapsed();
        for interest in self.consumer.face_mut().drain(..) {
            let sequence = interest.name().sequence_number().ok();
            let lost = match self.link.carry(&interest) {
                Ok(replies) => {
                    for (delay, data) in replies {
                        self.queue.push(delay, SimEvent::Deliver(data));
                    }
                    false
                }
                Err(loss) => {
                    tracing::trace!(?sequence, ?loss, "interest lost");
                    true
                }
            };
            self.transmissions.push(Transmission { at, sequence, lost });
        }
    }
}

impl<S> Simulation<S> {
    /// Current virtual time
    pub fn now(&self) -> Instant {
        self.queue.now()
    }

    /// Virtual time elapsed since the start
    pub fn elapsed(&self) -> Duration {
        self.queue.now().saturating_duration_since(self.origin)
    }

    /// Simulated consumer
    pub fn consumer(&self) -> &Consumer<Vec<Interest>, S> {
        &self.consumer
    }

    /// Link model
    pub fn link(&self) -> &Link {
        &self.link
    }

    /// Every Interest sent so far, in order
    pub fn transmissions(&self) -> &[Transmission] {
        &self.transmissions
    }

    /// Send times of `sequence`
    pub fn transmissions_of(&self, sequence: u32) -> Vec<Duration> {
        self.transmissions
            .iter()
            .filter(|t| t.sequence == Some(sequence))
            .map(|t| t.at)
            .collect()
    }

    /// Every reply processed so far with its arrival time
    pub fn replies(&self) -> &[(Duration, ReplyOutcome)] {
        &self.replies
    }

    /// Delay sink
    pub fn sink(&self) -> &S {
        self.consumer.sink()
    }
}
