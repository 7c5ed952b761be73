//! Reliable-delivery consumer
//!
//! - [`RequestSequencer`]: picks the next sequence, retransmissions first
//! - [`RequestTracker`]: outstanding requests in deadline order
//! - [`RetransmissionScheduler`]: periodic sweep for expired deadlines
//! - [`DataReconciler`]: matches replies and reports delays
//! - [`Consumer`]: the engine tying them together

mod config;
mod engine;
mod reconciler;
mod retx;
mod sequencer;
mod tracker;

pub use config::{ConsumerBuilder, ConsumerConfig};
pub use engine::{Consumer, ConsumerStats};
pub use reconciler::{DataReconciler, Reconciled, ReplyOutcome};
pub use retx::{RetransmissionScheduler, SweepReport, TimeoutAction};
pub use sequencer::RequestSequencer;
pub use tracker::{PendingRequest, RequestTracker};
