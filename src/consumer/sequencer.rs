//! Sequence selection
//!
//! Pending retransmissions always go before fresh sequence numbers; fresh
//! numbers increase monotonically up to an optional exclusive bound.

use std::collections::BTreeSet;

/// Chooses the next sequence number to transmit
#[derive(Debug, Clone)]
pub struct RequestSequencer {
    /// Next fresh sequence number
    next_fresh: u32,
    /// Exclusive upper bound on fresh sequence numbers
    max_sequence: Option<u32>,
    /// Sequences waiting for retransmission
    retransmit: BTreeSet<u32>,
}

impl RequestSequencer {
    /// Create a sequencer starting at `start` with an optional exclusive bound
    pub fn new(start: u32, max_sequence: Option<u32>) -> Self {
        Self {
            next_fresh: start,
            max_sequence,
            retransmit: BTreeSet::new(),
        }
    }

    /// Take the next sequence to send
    ///
    /// Returns `None` when there is nothing to retransmit and fresh sequence
    /// numbers are exhausted.
    pub fn next(&mut self) -> Option<u32> {
        if let Some(sequence) = self.retransmit.pop_first() {
            return Some(sequence);
        }
        if self.is_exhausted() {
            return None;
        }
        let sequence = self.next_fresh;
        self.next_fresh += 1;
        Some(sequence)
    }

    /// Queue `sequence` for retransmission
    pub fn enqueue_retransmit(&mut self, sequence: u32) {
        self.retransmit.insert(sequence);
    }

    /// Drop `sequence` from the retransmission queue
    ///
    /// Returns `true` if it was queued.
    pub fn cancel_retransmit(&mut self, sequence: u32) -> bool {
        self.retransmit.remove(&sequence)
    }

    /// Check if `sequence` is queued for retransmission
    pub fn is_retransmit_pending(&self, sequence: u32) -> bool {
        self.retransmit.contains(&sequence)
    }

    /// Number of queued retransmissions
    pub fn pending_retransmits(&self) -> usize {
        self.retransmit.len()
    }

    /// Check if there is anything to send
    pub fn has_pending(&self) -> bool {
        !self.retransmit.is_empty() || !self.is_exhausted()
    }

    /// Next fresh sequence number that would be issued
    pub fn next_fresh(&self) -> u32 {
        self.next_fresh
    }

    /// Check if no fresh sequence numbers remain
    ///
    /// `u32::MAX` itself is never issued so the counter cannot wrap.
    pub fn is_exhausted(&self) -> bool {
        self.next_fresh == u32::MAX || self.max_sequence.is_some_and(|max| self.next_fresh >= max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_sequences_increase() {
        let mut sequencer = RequestSequencer::new(10, None);
        let issued: Vec<u32> = (0..5).filter_map(|_| sequencer.next()).collect();
        assert_eq!(issued, vec![10, 11, 12, 13, 14]);
        assert_eq!(sequencer.next_fresh(), 15);
    }

    #[test]
    fn test_max_sequence_is_exclusive() {
        let mut sequencer = RequestSequencer::new(0, Some(3));
        assert_eq!(sequencer.next(), Some(0));
        assert_eq!(sequencer.next(), Some(1));
        assert_eq!(sequencer.next(), Some(2));
        assert_eq!(sequencer.next(), None);
        assert!(sequencer.is_exhausted());
        assert!(!sequencer.has_pending());
    }

    #[test]
    fn test_retransmissions_take_priority() {
        let mut sequencer = RequestSequencer::new(0, None);
        for _ in 0..5 {
            sequencer.next();
        }

        sequencer.enqueue_retransmit(3);
        sequencer.enqueue_retransmit(1);
        assert_eq!(sequencer.pending_retransmits(), 2);

        // Smallest pending first, then fresh
        assert_eq!(sequencer.next(), Some(1));
        assert_eq!(sequencer.next(), Some(3));
        assert_eq!(sequencer.next(), Some(5));
    }

    #[test]
    fn test_retransmission_after_exhaustion() {
        let mut sequencer = RequestSequencer::new(0, Some(1));
        assert_eq!(sequencer.next(), Some(0));
        assert_eq!(sequencer.next(), None);

        sequencer.enqueue_retransmit(0);
        assert!(sequencer.has_pending());
        assert_eq!(sequencer.next(), Some(0));
        assert_eq!(sequencer.next(), None);
    }

    #[test]
    fn test_duplicate_enqueue_and_cancel() {
        let mut sequencer = RequestSequencer::new(0, None);
        sequencer.enqueue_retransmit(7);
        sequencer.enqueue_retransmit(7);
        assert_eq!(sequencer.pending_retransmits(), 1);

        assert!(sequencer.is_retransmit_pending(7));
        assert!(sequencer.cancel_retransmit(7));
        assert!(!sequencer.cancel_retransmit(7));
        assert_eq!(sequencer.next(), Some(0));
    }

    #[test]
    fn test_counter_never_wraps() {
        let mut sequencer = RequestSequencer::new(u32::MAX - 1, None);
        assert_eq!(sequencer.next(), Some(u32::MAX - 1));
        assert_eq!(sequencer.next(), None);
    }
}
