//! Deterministic simulation harness
//!
//! Runs a [`Consumer`](crate::consumer::Consumer) against a [`Link`] on a
//! virtual clock.

mod link;
mod simulation;

pub use link::{Link, Loss};
pub use simulation::{SimEvent, Simulation, Transmission};
