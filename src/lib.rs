//! # ndn-consumer
//!
//! Reliable-delivery engine for a pull-based named-data consumer.
//!
//! The consumer requests Data by name, one Interest per sequence number, and
//! makes delivery reliable on its own:
//!
//! - **Sequencing**: fresh sequence numbers in order, retransmissions first
//! - **Tracking**: outstanding requests ordered by send time
//! - **Adaptive timeout**: SRTT/RTTVAR estimation with Karn's rule and
//!   exponential backoff
//! - **Bounded retries**: a periodic sweep retransmits expired requests and
//!   abandons them once the retry budget is spent
//! - **Delay reporting**: last-attempt and first-attempt delays per reply
//!
//! ## Feature Flags
//!
//! - `sim` (default): deterministic discrete-event harness
//! - `client` (default): tokio task driving the engine over channels
//! - `cli`: the `ndn-consumer-sim` demo binary
//!
//! ## Modules
//!
//! - [`core`]: constants, errors, and collaborator traits
//! - [`packet`]: names, Interests, and Data
//! - [`transport`]: RTO estimation and send pacing
//! - [`consumer`]: the engine and its components
//! - [`event`]: deadline-ordered event queue
//! - [`sim`]: simulation harness (requires `sim` feature)
//! - [`client`]: async client (requires `client` feature)
//!
//! ## Example Usage
//!
//! ```rust
//! use std::time::Duration;
//! use ndn_consumer::prelude::*;
//!
//! let config = ConsumerBuilder::new()
//!     .prefix("/video/frames".parse()?)
//!     .max_sequence(10)
//!     .frequency(50.0)
//!     .seed(7)
//!     .build()?;
//!
//! // 40 ms round trip; the first Interest for sequence 3 is lost
//! let link = Link::new(Duration::from_millis(40)).drop_first(3, 1);
//! let mut sim = Simulation::new(config, link, Vec::<DelayEvent>::new())?;
//!
//! sim.start();
//! assert!(sim.run_to_completion(Duration::from_secs(10)));
//! assert_eq!(sim.consumer().stats().data_received, 10);
//! assert_eq!(sim.consumer().stats().retransmissions, 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core module (always included)
pub mod core;

pub mod consumer;
pub mod event;
pub mod packet;
pub mod transport;

// Simulation harness (feature-gated)
#[cfg(feature = "sim")]
#[cfg_attr(docsrs, doc(cfg(feature = "sim")))]
pub mod sim;

// Async client (feature-gated)
#[cfg(feature = "client")]
#[cfg_attr(docsrs, doc(cfg(feature = "client")))]
pub mod client;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::core::*;

    pub use crate::consumer::{
        Consumer, ConsumerBuilder, ConsumerConfig, ConsumerStats, Reconciled, ReplyOutcome,
    };
    pub use crate::event::EventQueue;
    pub use crate::packet::{Component, Data, Interest, Name};
    pub use crate::transport::{InterestPacer, Randomize, RtoConfig, RtoEstimator};

    #[cfg(feature = "sim")]
    pub use crate::sim::{Link, Simulation};

    #[cfg(feature = "client")]
    pub use crate::client::{ClientError, ConsumerClient, DataSender, InterestReceiver};
}

// Re-export commonly used items at crate root
pub use consumer::{Consumer, ConsumerBuilder, ConsumerConfig, ConsumerStats};
pub use core::{ConfigError, ConsumerError, DelayEvent, DelaySink, NameError};
pub use packet::{Data, Interest, Name};
