//! Actions postponed to later ticks.
//!
//! Some transitions should not happen in the same tick that triggers them,
//! e.g. the help screen that opens on top of a freshly started game. They
//! are queued here and released one per tick. While anything is pending
//! the game holds its simulation still.

use std::collections::VecDeque;

/// FIFO of actions delivered one per tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredQueue<A> {
    pending: VecDeque<A>,
}

impl<A> Default for DeferredQueue<A> {
    fn default() -> Self {
        Self {
            pending: VecDeque::new(),
        }
    }
}

impl<A> DeferredQueue<A> {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an action behind anything already pending.
    pub fn defer(&mut self, action: A) {
        self.pending.push_back(action);
    }

    /// Release the oldest pending action.
    pub fn next_due(&mut self) -> Option<A> {
        self.pending.pop_front()
    }

    /// Whether the game is held for deferred delivery.
    #[must_use]
    pub fn is_holding(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Number of pending actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop everything pending.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_releases_in_fifo_order() {
        let mut queue = DeferredQueue::new();
        queue.defer("help");
        queue.defer("banner");
        assert!(queue.is_holding());
        assert_eq!(queue.next_due(), Some("help"));
        assert_eq!(queue.next_due(), Some("banner"));
        assert_eq!(queue.next_due(), None);
        assert!(!queue.is_holding());
    }

    #[test]
    fn test_clear() {
        let mut queue = DeferredQueue::new();
        queue.defer(1);
        queue.defer(2);
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
    }
}
