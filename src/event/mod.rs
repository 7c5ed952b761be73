//! Event scheduling shared by the simulation and the async client.

mod queue;

pub use queue::EventQueue;
