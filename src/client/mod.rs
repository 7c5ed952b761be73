//! Async client
//!
//! Drives the consumer engine on a tokio task.

#[allow(clippy::module_inception)]
mod client;

pub use client::*;
