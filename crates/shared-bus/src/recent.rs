//! # Recent Events Ring
//!
//! Fixed-capacity ring of the latest events, newest first. Older entries are
//! dropped, never archived.

use crate::events::DomainEvent;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct RecentEvents {
    entries: VecDeque<DomainEvent>,
    capacity: usize,
}

impl RecentEvents {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record an event, evicting the oldest entry when full.
    pub fn push(&mut self, event: DomainEvent) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_back();
        }
        self.entries.push_front(event);
    }

    /// Copy of the ring, newest first.
    pub fn snapshot(&self) -> Vec<DomainEvent> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
