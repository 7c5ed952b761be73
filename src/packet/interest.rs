//! Interest (request) and Data (reply) packets.

use std::time::Duration;

use super::name::Name;

/// A named request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interest {
    name: Name,
    nonce: u32,
    lifetime: Duration,
}

impl Interest {
    /// Create an Interest.
    pub fn new(name: Name, nonce: u32, lifetime: Duration) -> Self {
        Self {
            name,
            nonce,
            lifetime,
        }
    }

    /// Full request name, sequence suffix included.
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Random nonce for loop detection.
    pub fn nonce(&self) -> u32 {
        self.nonce
    }

    /// How long forwarders keep the request pending.
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }
}

/// A reply satisfying an Interest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Data {
    name: Name,
    content: Vec<u8>,
    hop_count: u32,
}

impl Data {
    /// Create a Data packet that travelled zero hops.
    pub fn new(name: Name, content: Vec<u8>) -> Self {
        Self {
            name,
            content,
            hop_count: 0,
        }
    }

    /// Set the number of hops the reply travelled.
    pub fn with_hop_count(mut self, hop_count: u32) -> Self {
        self.hop_count = hop_count;
        self
    }

    /// Name of the reply.
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Payload.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Hops the reply travelled (0 when served locally).
    pub fn hop_count(&self) -> u32 {
        self.hop_count
    }
}
