/*
 * Bounded Channel FIFO
 *
 * One ChannelQueue backs each (source, destination) channel. It is a plain
 * bounded FIFO with no locking of its own: the owning inbox lock serializes
 * every access, which is what keeps readiness and contents consistent.
 *
 * Design:
 * - Fixed capacity chosen at construction (the configured depth D)
 * - push fails instead of growing when full (backpressure)
 * - pop returns the oldest message first
 */

use alloc::collections::VecDeque;

use crate::types::Message;

/// Returned by `ChannelQueue::push` when the queue is at capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Full(pub Message);

pub struct ChannelQueue {
    messages: VecDeque<Message>,
    capacity: usize,
}

impl ChannelQueue {
    /// Create an empty queue; storage is reserved up front and never grows
    pub fn new(capacity: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a message, handing it back if the queue is full
    pub fn push(&mut self, message: Message) -> Result<(), Full> {
        if self.messages.len() >= self.capacity {
            return Err(Full(message));
        }
        self.messages.push_back(message);
        Ok(())
    }

    /// Remove the oldest message
    pub fn pop(&mut self) -> Option<Message> {
        self.messages.pop_front()
    }

    /// Oldest message, left in place
    pub fn front(&self) -> Option<Message> {
        self.messages.front().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.messages.len() >= self.capacity
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut queue = ChannelQueue::new(4);
        for value in [7, 8, 9] {
            queue.push(value).unwrap();
        }
        assert_eq!(queue.front(), Some(7));
        assert_eq!(queue.pop(), Some(7));
        assert_eq!(queue.pop(), Some(8));
        assert_eq!(queue.pop(), Some(9));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_full_hands_message_back() {
        let mut queue = ChannelQueue::new(2);
        queue.push(1).unwrap();
        queue.push(2).unwrap();
        assert!(queue.is_full());
        assert_eq!(queue.push(3), Err(Full(3)));
        assert_eq!(queue.len(), 2);

        // Draining one slot makes room again
        assert_eq!(queue.pop(), Some(1));
        queue.push(3).unwrap();
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), Some(3));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_depth_one() {
        let mut queue = ChannelQueue::new(1);
        assert_eq!(queue.capacity(), 1);
        queue.push(42).unwrap();
        assert_eq!(queue.push(43), Err(Full(43)));
        assert_eq!(queue.front(), Some(42));
        assert_eq!(queue.len(), 1);
    }
}
