//! Fixed-capacity, blocking, ordered transport of [`Item`] values between a
//! stage's upstream producer(s) and its single worker.

use std::sync::Mutex;

use crate::error::QueueError;
use crate::invariants::{
    debug_assert_bounded_count, debug_assert_finished_monotonic, debug_assert_index_in_range,
};
use crate::item::Item;
use crate::monitor::Monitor;

struct State {
    /// Ring buffer storage; `None` slots are unoccupied.
    items: Vec<Option<Item>>,
    capacity: usize,
    head: usize,
    tail: usize,
    count: usize,
    finished: bool,
}

impl State {
    fn push(&mut self, item: Item) {
        debug_assert_index_in_range!("tail", self.tail, self.capacity);
        self.items[self.tail] = Some(item);
        self.tail = (self.tail + 1) % self.capacity;
        self.count += 1;
        debug_assert_bounded_count!(self.count, self.capacity);
    }

    fn pop(&mut self) -> Item {
        debug_assert_index_in_range!("head", self.head, self.capacity);
        let item = self.items[self.head]
            .take()
            .expect("pop called on an empty slot");
        self.head = (self.head + 1) % self.capacity;
        self.count -= 1;
        item
    }
}

/// A bounded FIFO queue of [`Item`] values, shared between exactly one
/// producer-side caller and exactly one consumer-side worker per the stage
/// contract. Concurrent producers are tolerated (every transition happens
/// under `state`'s mutex) but not required.
pub struct BoundedQueue {
    state: Mutex<State>,
    not_full: Monitor,
    not_empty: Monitor,
    finished_event: Monitor,
}

impl BoundedQueue {
    /// Creates a queue with room for `capacity` items. `capacity` must be at
    /// least 1.
    pub fn new(capacity: usize) -> Result<Self, QueueError> {
        if capacity == 0 {
            return Err(QueueError::InvalidArgument(
                "capacity must be at least 1".into(),
            ));
        }

        Ok(Self {
            state: Mutex::new(State {
                items: (0..capacity).map(|_| None).collect(),
                capacity,
                head: 0,
                tail: 0,
                count: 0,
                finished: false,
            }),
            not_full: Monitor::new(),
            not_empty: Monitor::new(),
            finished_event: Monitor::new(),
        })
    }

    /// Blocks while the queue is full, then enqueues `item` at the tail and
    /// wakes one blocked taker.
    pub fn insert(&self, item: Item) -> Result<(), QueueError> {
        let mut guard = self.state.lock().map_err(|_| QueueError::Uninitialized)?;
        while guard.count == guard.capacity {
            guard = self.not_full.wait(guard)?;
        }
        guard.push(item);
        self.not_empty.signal();
        Ok(())
    }

    /// Blocks while the queue is empty and not finished. Returns `Some(item)`
    /// if one was available, or `None` if the queue is empty and finished
    /// (the empty-and-done marker).
    pub fn take(&self) -> Result<Option<Item>, QueueError> {
        let mut guard = self.state.lock().map_err(|_| QueueError::Uninitialized)?;
        while guard.count == 0 && !guard.finished {
            guard = self.not_empty.wait(guard)?;
        }
        if guard.count > 0 {
            let item = guard.pop();
            self.not_full.signal();
            Ok(Some(item))
        } else {
            Ok(None)
        }
    }

    /// Marks the queue finished. Idempotent. Broadcasts `not_empty` (not a
    /// single signal) so every taker blocked on an empty queue can re-check
    /// the finished flag, and signals `finished_event` for waiters parked in
    /// [`BoundedQueue::wait_finished`].
    pub fn mark_finished(&self) -> Result<(), QueueError> {
        let mut guard = self.state.lock().map_err(|_| QueueError::Uninitialized)?;
        let was_finished = guard.finished;
        guard.finished = true;
        debug_assert_finished_monotonic!(was_finished, guard.finished);
        drop(guard);
        self.finished_event.signal();
        self.not_empty.broadcast();
        Ok(())
    }

    /// Blocks until [`BoundedQueue::mark_finished`] has been observed.
    /// Multiple waiters are permitted.
    pub fn wait_finished(&self) -> Result<(), QueueError> {
        let mut guard = self.state.lock().map_err(|_| QueueError::Uninitialized)?;
        while !guard.finished {
            guard = self.finished_event.wait(guard)?;
        }
        Ok(())
    }

    /// Current occupancy, for diagnostics and tests.
    pub fn len(&self) -> usize {
        self.state.lock().expect("queue mutex poisoned").count
    }

    /// Queue capacity.
    pub fn capacity(&self) -> usize {
        self.state.lock().expect("queue mutex poisoned").capacity
    }

    /// Whether [`BoundedQueue::mark_finished`] has been called.
    pub fn is_finished(&self) -> bool {
        self.state.lock().expect("queue mutex poisoned").finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn rejects_zero_capacity() {
        assert!(matches!(
            BoundedQueue::new(0),
            Err(QueueError::InvalidArgument(_))
        ));
    }

    #[test]
    fn fifo_single_producer() {
        let queue = BoundedQueue::new(4).unwrap();
        queue.insert(Item::Payload("a".into())).unwrap();
        queue.insert(Item::Payload("b".into())).unwrap();
        assert_eq!(queue.take().unwrap(), Some(Item::Payload("a".into())));
        assert_eq!(queue.take().unwrap(), Some(Item::Payload("b".into())));
    }

    #[test]
    fn capacity_one_alternating() {
        let queue = BoundedQueue::new(1).unwrap();
        for i in 0..5 {
            queue.insert(Item::Payload(i.to_string())).unwrap();
            assert_eq!(queue.take().unwrap(), Some(Item::Payload(i.to_string())));
        }
    }

    #[test]
    fn finished_drains_before_reporting_done() {
        let queue = BoundedQueue::new(4).unwrap();
        queue.insert(Item::Payload("a".into())).unwrap();
        queue.mark_finished().unwrap();
        // Queued item still comes out even though finished is set.
        assert_eq!(queue.take().unwrap(), Some(Item::Payload("a".into())));
        assert_eq!(queue.take().unwrap(), None);
    }

    #[test]
    fn insert_blocks_while_full_and_unblocks_on_take() {
        let queue = Arc::new(BoundedQueue::new(1).unwrap());
        queue.insert(Item::Payload("first".into())).unwrap();

        let queue2 = Arc::clone(&queue);
        let handle = thread::spawn(move || {
            queue2.insert(Item::Payload("second".into())).unwrap();
        });

        thread::sleep(Duration::from_millis(30));
        assert_eq!(queue.len(), 1, "producer should still be blocked");

        assert_eq!(queue.take().unwrap(), Some(Item::Payload("first".into())));
        handle.join().unwrap();
        assert_eq!(queue.take().unwrap(), Some(Item::Payload("second".into())));
    }

    #[test]
    fn multiple_takers_all_wake_on_mark_finished() {
        let queue = Arc::new(BoundedQueue::new(4).unwrap());
        let mut handles = Vec::new();
        for _ in 0..4 {
            let queue2 = Arc::clone(&queue);
            handles.push(thread::spawn(move || queue2.take().unwrap()));
        }
        thread::sleep(Duration::from_millis(30));
        queue.mark_finished().unwrap();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), None);
        }
    }
}
