//! Per-level queue of variable-length payloads.
//!
//! Within one nesting level the file holds every fixed region first, then the
//! variable-length payloads those regions announced, in the order they were
//! announced. Readers and writers push one entry per placeholder while
//! walking the fixed region and drain the queue once it is fully consumed.

use std::collections::VecDeque;

/// Where a queued payload lands: an element of the current level, then a
/// field index path through inline structs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub element: usize,
    pub path: Vec<usize>,
}

#[derive(Debug)]
pub struct Deferred<P> {
    /// Position in the queue; payloads are resolved in this order.
    pub order: usize,
    /// Offset of the placeholder that announced the payload.
    pub placeholder: usize,
    pub slot: Slot,
    pub payload: P,
}

#[derive(Debug)]
pub struct DeferredQueue<P> {
    entries: VecDeque<Deferred<P>>,
    pushed: usize,
}

impl<P> DeferredQueue<P> {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            pushed: 0,
        }
    }

    pub fn push(&mut self, placeholder: usize, slot: Slot, payload: P) {
        self.entries.push_back(Deferred {
            order: self.pushed,
            placeholder,
            slot,
            payload,
        });
        self.pushed += 1;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Next payload in announcement order.
    pub fn pop(&mut self) -> Option<Deferred<P>> {
        self.entries.pop_front()
    }
}

impl<P> Default for DeferredQueue<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Iterator for DeferredQueue<P> {
    type Item = Deferred<P>;

    fn next(&mut self) -> Option<Self::Item> {
        self.pop()
    }
}
