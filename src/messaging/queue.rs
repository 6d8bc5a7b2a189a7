/*!
 * FIFO Queue
 * First-in-first-out queue backing the posted-message loop
 */

use super::handler::{handler_identity, HandlerRef};
use super::message::MessageRef;
use std::collections::VecDeque;

/// Unbounded FIFO queue
///
/// Entries are never reordered; scans go front to back (or back to front via
/// `iter().rev()`) without removing anything.
pub struct FifoQueue<T> {
    items: VecDeque<T>,
}

impl<T> FifoQueue<T> {
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    pub fn push_back(&mut self, item: T) {
        self.items.push_back(item);
    }

    pub fn pop_front(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    pub fn peek_front(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut T> {
        self.items.iter_mut()
    }
}

impl<T> Default for FifoQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Posted message awaiting the next flush
///
/// A `None` handler marks a tombstone left by `clear_message_data`.
pub(crate) struct PostedEntry {
    pub handler: Option<HandlerRef>,
    pub message: MessageRef,
}

impl PostedEntry {
    pub fn new(handler: &HandlerRef, message: MessageRef) -> Self {
        Self {
            handler: Some(handler.clone()),
            message,
        }
    }

    /// Check if the entry is still addressed to `handler`
    pub fn targets(&self, handler: &HandlerRef) -> bool {
        self.handler
            .as_ref()
            .is_some_and(|h| handler_identity(h) == handler_identity(handler))
    }
}
