//! A small fixed-capacity FIFO.
//!
//! The original's `SimpleQueue<T>` is a capacity-bounded ring buffer
//! whose `push` returns `false` once full rather than growing or
//! blocking. Runner input/message queues are always accessed from
//! behind the runner's own `sync_lock`, so there is no need for the
//! lock-free machinery a `concurrent_queue::ConcurrentQueue` would add;
//! a plain `VecDeque` gives the same bounded-FIFO semantics with one
//! less moving part, mirroring how the teacher codebase keeps purely
//! single-writer-at-a-time collections (e.g. `ExecutorState::processing`)
//! as plain `VecDeque`s rather than lock-free queues.

use std::collections::VecDeque;

pub struct BoundedQueue<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    /// Pushes `item` onto the back of the queue. Returns `false` (and
    /// hands the item back) if the queue is at capacity.
    pub fn push(&mut self, item: T) -> Result<(), T> {
        if self.is_full() {
            return Err(item);
        }
        self.items.push_back(item);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    pub fn drain(&mut self) -> std::collections::vec_deque::Drain<'_, T> {
        self.items.drain(..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_push_past_capacity() {
        let mut q = BoundedQueue::with_capacity(2);
        assert!(q.push(1).is_ok());
        assert!(q.push(2).is_ok());
        assert_eq!(q.push(3), Err(3));
        assert!(q.is_full());
    }

    #[test]
    fn fifo_order() {
        let mut q = BoundedQueue::with_capacity(4);
        q.push(1).unwrap();
        q.push(2).unwrap();
        assert_eq!(q.pop(), Some(1));
        assert_eq!(q.pop(), Some(2));
        assert_eq!(q.pop(), None);
    }
}
