//! Outstanding request tracker
//!
//! Keeps one [`PendingRequest`] per outstanding sequence, indexed two ways:
//! - by sequence number, for direct lookup and removal
//! - by last send time, for earliest-deadline-first sweeps
//!
//! An entry whose deadline fired is disarmed (dropped from the time index)
//! but keeps its record until it is retransmitted, answered or abandoned.

use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};

use crate::packet::Name;

/// Bookkeeping for one outstanding request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    sequence: u32,
    name: Name,
    last_send_time: Instant,
    first_send_time: Instant,
    transmissions: u32,
}

impl PendingRequest {
    /// Sequence number.
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Full request name.
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Time of the most recent transmission.
    pub fn last_send_time(&self) -> Instant {
        self.last_send_time
    }

    /// Time of the first transmission.
    pub fn first_send_time(&self) -> Instant {
        self.first_send_time
    }

    /// Transmissions so far, including the first.
    pub fn transmissions(&self) -> u32 {
        self.transmissions
    }
}

/// Tracker for outstanding requests
#[derive(Debug, Clone, Default)]
pub struct RequestTracker {
    /// Records keyed by sequence
    entries: HashMap<u32, PendingRequest>,
    /// Armed deadlines as (last send time, sequence)
    deadlines: BTreeSet<(Instant, u32)>,
}

impl RequestTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a transmission of `sequence` at `now`
    ///
    /// Creates the entry on first transmission, otherwise moves its deadline
    /// to `now` and bumps the transmission count. Returns the new count.
    pub fn record(&mut self, sequence: u32, name: Name, now: Instant) -> u32 {
        let transmissions = match self.entries.get_mut(&sequence) {
            Some(entry) => {
                self.deadlines.remove(&(entry.last_send_time, sequence));
                debug_assert!(now >= entry.first_send_time);
                entry.last_send_time = now;
                entry.transmissions = entry.transmissions.saturating_add(1);
                entry.name = name;
                entry.transmissions
            }
            None => {
                self.entries.insert(
                    sequence,
                    PendingRequest {
                        sequence,
                        name,
                        last_send_time: now,
                        first_send_time: now,
                        transmissions: 1,
                    },
                );
                1
            }
        };
        self.deadlines.insert((now, sequence));
        transmissions
    }

    /// Armed entry with the smallest last send time
    pub fn earliest(&self) -> Option<&PendingRequest> {
        let &(_, sequence) = self.deadlines.first()?;
        self.entries.get(&sequence)
    }

    /// Disarm and return the earliest entry whose deadline has passed
    ///
    /// An entry is expired when `last_send_time + rto <= now`.
    pub fn pop_expired(&mut self, now: Instant, rto: Duration) -> Option<u32> {
        let &(sent, sequence) = self.deadlines.first()?;
        let deadline = sent.checked_add(rto)?;
        if deadline <= now {
            self.deadlines.pop_first();
            Some(sequence)
        } else {
            None
        }
    }

    /// Remove `sequence` from both indices
    pub fn remove(&mut self, sequence: u32) -> Option<PendingRequest> {
        let entry = self.entries.remove(&sequence)?;
        self.deadlines.remove(&(entry.last_send_time, sequence));
        Some(entry)
    }

    /// Transmissions of `sequence` so far, 0 if untracked
    pub fn retransmit_count_of(&self, sequence: u32) -> u32 {
        self.entries
            .get(&sequence)
            .map_or(0, PendingRequest::transmissions)
    }

    /// Look up an entry
    pub fn get(&self, sequence: u32) -> Option<&PendingRequest> {
        self.entries.get(&sequence)
    }

    /// Check if `sequence` is tracked
    pub fn contains(&self, sequence: u32) -> bool {
        self.entries.contains_key(&sequence)
    }

    /// Check if `sequence` has an armed deadline
    pub fn is_armed(&self, sequence: u32) -> bool {
        self.entries
            .get(&sequence)
            .is_some_and(|e| self.deadlines.contains(&(e.last_send_time, sequence)))
    }

    /// Armed entries in deadline order
    pub fn iter(&self) -> impl Iterator<Item = &PendingRequest> + '_ {
        self.deadlines
            .iter()
            .filter_map(|(_, sequence)| self.entries.get(sequence))
    }

    /// Number of tracked entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is tracked
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(seq: u32) -> Name {
        "/test".parse::<Name>().unwrap().with_sequence_number(seq)
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_new_tracker() {
        let tracker = RequestTracker::new();
        assert!(tracker.is_empty());
        assert!(tracker.earliest().is_none());
        assert_eq!(tracker.retransmit_count_of(0), 0);
    }

    #[test]
    fn test_record_first_send() {
        let t0 = Instant::now();
        let mut tracker = RequestTracker::new();

        assert_eq!(tracker.record(3, name(3), t0), 1);

        let entry = tracker.get(3).unwrap();
        assert_eq!(entry.first_send_time(), t0);
        assert_eq!(entry.last_send_time(), t0);
        assert_eq!(entry.transmissions(), 1);
        assert_eq!(entry.name(), &name(3));
        assert!(tracker.is_armed(3));
    }

    #[test]
    fn test_record_retransmission_keeps_first_send() {
        let t0 = Instant::now();
        let mut tracker = RequestTracker::new();
        tracker.record(3, name(3), t0);
        assert_eq!(tracker.record(3, name(3), t0 + ms(100)), 2);

        let entry = tracker.get(3).unwrap();
        assert_eq!(entry.first_send_time(), t0);
        assert_eq!(entry.last_send_time(), t0 + ms(100));
        assert!(entry.first_send_time() <= entry.last_send_time());
        assert_eq!(tracker.retransmit_count_of(3), 2);
        // Only one deadline for the sequence
        assert_eq!(tracker.iter().count(), 1);
    }

    #[test]
    fn test_earliest_follows_last_send_time() {
        let t0 = Instant::now();
        let mut tracker = RequestTracker::new();
        tracker.record(1, name(1), t0);
        tracker.record(2, name(2), t0 + ms(10));
        tracker.record(3, name(3), t0 + ms(20));
        assert_eq!(tracker.earliest().unwrap().sequence(), 1);

        // Resending 1 moves it to the back
        tracker.record(1, name(1), t0 + ms(30));
        assert_eq!(tracker.earliest().unwrap().sequence(), 2);

        let order: Vec<u32> = tracker.iter().map(|e| e.sequence()).collect();
        assert_eq!(order, vec![2, 3, 1]);
    }

    #[test]
    fn test_pop_expired_stops_at_first_live_deadline() {
        let t0 = Instant::now();
        let mut tracker = RequestTracker::new();
        tracker.record(1, name(1), t0);
        tracker.record(2, name(2), t0 + ms(10));
        tracker.record(3, name(3), t0 + ms(50));

        let now = t0 + ms(110);
        assert_eq!(tracker.pop_expired(now, ms(100)), Some(1));
        assert_eq!(tracker.pop_expired(now, ms(100)), Some(2));
        assert_eq!(tracker.pop_expired(now, ms(100)), None);

        // Disarmed entries keep their records
        assert!(tracker.contains(1));
        assert!(!tracker.is_armed(1));
        assert_eq!(tracker.retransmit_count_of(2), 1);
        assert_eq!(tracker.earliest().unwrap().sequence(), 3);
    }

    #[test]
    fn test_deadline_boundary_is_inclusive() {
        let t0 = Instant::now();
        let mut tracker = RequestTracker::new();
        tracker.record(5, name(5), t0);

        assert_eq!(tracker.pop_expired(t0 + ms(99), ms(100)), None);
        assert_eq!(tracker.pop_expired(t0 + ms(100), ms(100)), Some(5));
    }

    #[test]
    fn test_same_timestamp_orders_by_sequence() {
        let t0 = Instant::now();
        let mut tracker = RequestTracker::new();
        tracker.record(9, name(9), t0);
        tracker.record(4, name(4), t0);

        assert_eq!(tracker.pop_expired(t0, Duration::ZERO), Some(4));
        assert_eq!(tracker.pop_expired(t0, Duration::ZERO), Some(9));
    }

    #[test]
    fn test_rearm_after_expiry() {
        let t0 = Instant::now();
        let mut tracker = RequestTracker::new();
        tracker.record(1, name(1), t0);
        assert_eq!(tracker.pop_expired(t0 + ms(100), ms(100)), Some(1));

        tracker.record(1, name(1), t0 + ms(100));
        assert!(tracker.is_armed(1));
        assert_eq!(tracker.retransmit_count_of(1), 2);
        assert_eq!(tracker.pop_expired(t0 + ms(150), ms(100)), None);
    }

    #[test]
    fn test_remove() {
        let t0 = Instant::now();
        let mut tracker = RequestTracker::new();
        tracker.record(1, name(1), t0);
        tracker.record(2, name(2), t0);

        let removed = tracker.remove(1).unwrap();
        assert_eq!(removed.sequence(), 1);
        assert!(!tracker.contains(1));
        assert_eq!(tracker.retransmit_count_of(1), 0);
        assert_eq!(tracker.iter().count(), 1);

        // Absent sequences are a no-op
        assert!(tracker.remove(1).is_none());
        assert!(tracker.remove(42).is_none());
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_remove_disarmed_entry() {
        let t0 = Instant::now();
        let mut tracker = RequestTracker::new();
        tracker.record(1, name(1), t0);
        tracker.pop_expired(t0 + ms(1), Duration::ZERO);

        assert!(tracker.remove(1).is_some());
        assert!(tracker.is_empty());
        assert!(tracker.earliest().is_none());
    }
}
