//! Deadline-ordered event queue with cancellable handles.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::{Duration, Instant};

use crate::core::{Scheduler, Timer, TimerHandle};

/// Min-heap of scheduled events.
///
/// Events fire in deadline order; events with the same deadline fire in the
/// order they were scheduled. Cancellation is lazy: the heap slot stays until
/// it reaches the top and is skipped.
#[derive(Debug)]
pub struct EventQueue<E> {
    /// Current time on the queue's clock.
    now: Instant,
    /// Next handle value; doubles as the FIFO tie-breaker.
    next_id: u64,
    heap: BinaryHeap<Reverse<(Instant, u64)>>,
    /// Events not yet fired or cancelled.
    live: HashMap<u64, E>,
}

impl<E> EventQueue<E> {
    /// Create an empty queue whose clock starts at `start`.
    pub fn new(start: Instant) -> Self {
        Self {
            now: start,
            next_id: 0,
            heap: BinaryHeap::new(),
            live: HashMap::new(),
        }
    }

    /// Current time.
    pub fn now(&self) -> Instant {
        self.now
    }

    /// Move the clock forward. Moving backwards is ignored.
    pub fn advance_to(&mut self, now: Instant) {
        if now > self.now {
            self.now = now;
        }
    }

    /// Schedule `event` after `delay`.
    pub fn push(&mut self, delay: Duration, event: E) -> TimerHandle {
        let deadline = self.now + delay;
        self.push_at(deadline, event)
    }

    /// Schedule `event` at `deadline`.
    pub fn push_at(&mut self, deadline: Instant, event: E) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.heap.push(Reverse((deadline, id)));
        self.live.insert(id, event);
        TimerHandle::new(id)
    }

    /// Cancel a pending event, returning it if it had not fired.
    pub fn remove(&mut self, handle: TimerHandle) -> Option<E> {
        self.live.remove(&handle.value())
    }

    /// Deadline of the next live event.
    pub fn next_deadline(&mut self) -> Option<Instant> {
        self.purge_cancelled();
        self.heap.peek().map(|Reverse((deadline, _))| *deadline)
    }

    /// Pop the next live event, advancing the clock to its deadline.
    pub fn pop(&mut self) -> Option<(TimerHandle, E)> {
        self.purge_cancelled();
        let Reverse((deadline, id)) = self.heap.pop()?;
        self.advance_to(deadline);
        let event = self.live.remove(&id)?;
        Some((TimerHandle::new(id), event))
    }

    /// Pop the next live event if it is due at `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<(TimerHandle, E)> {
        self.advance_to(now);
        match self.next_deadline() {
            Some(deadline) if deadline <= self.now => self.pop(),
            _ => None,
        }
    }

    /// Number of live events.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Check if no live events remain.
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    fn purge_cancelled(&mut self) {
        while let Some(Reverse((_, id))) = self.heap.peek() {
            if self.live.contains_key(id) {
                break;
            }
            self.heap.pop();
        }
    }
}

impl<E: From<Timer>> Scheduler for EventQueue<E> {
    fn now(&self) -> Instant {
        self.now
    }

    fn schedule(&mut self, delay: Duration, timer: Timer) -> TimerHandle {
        self.push(delay, E::from(timer))
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.remove(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_deadline_ordering() {
        let t0 = Instant::now();
        let mut queue = EventQueue::new(t0);
        queue.push(ms(30), "c");
        queue.push(ms(10), "a");
        queue.push(ms(20), "b");

        let order: Vec<&str> = std::iter::from_fn(|| queue.pop().map(|(_, e)| e)).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
        assert_eq!(queue.now(), t0 + ms(30));
    }

    #[test]
    fn test_same_deadline_fifo() {
        let mut queue = EventQueue::new(Instant::now());
        queue.push(ms(5), 1);
        queue.push(ms(5), 2);
        queue.push(ms(5), 3);

        let order: Vec<i32> = std::iter::from_fn(|| queue.pop().map(|(_, e)| e)).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn test_cancel_skips_event() {
        let mut queue = EventQueue::new(Instant::now());
        let a = queue.push(ms(10), "a");
        queue.push(ms(20), "b");

        assert_eq!(queue.remove(a), Some("a"));
        assert_eq!(queue.remove(a), None);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pop().map(|(_, e)| e), Some("b"));
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_pop_due_respects_clock() {
        let t0 = Instant::now();
        let mut queue = EventQueue::new(t0);
        queue.push(ms(10), "a");

        assert!(queue.pop_due(t0 + ms(9)).is_none());
        assert_eq!(queue.pop_due(t0 + ms(10)).map(|(_, e)| e), Some("a"));
        assert_eq!(queue.now(), t0 + ms(10));
    }

    #[test]
    fn test_clock_never_goes_back() {
        let t0 = Instant::now();
        let mut queue: EventQueue<()> = EventQueue::new(t0 + ms(50));
        queue.advance_to(t0);
        assert_eq!(queue.now(), t0 + ms(50));
    }

    #[test]
    fn test_scheduler_impl() {
        let t0 = Instant::now();
        let mut queue: EventQueue<Timer> = EventQueue::new(t0);
        let sweep = Scheduler::schedule(&mut queue, ms(50), Timer::RetxSweep);
        Scheduler::schedule(&mut queue, ms(0), Timer::SendNext);
        Scheduler::cancel(&mut queue, sweep);

        assert_eq!(queue.pop().map(|(_, t)| t), Some(Timer::SendNext));
        assert!(queue.pop().is_none());
    }
}
