// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::VecDeque;

/// Rendered chat history with an optional cap.
///
/// Strict FIFO: once `capacity` items are held, each push evicts the oldest
/// item first. A capacity of zero or less means unbounded. Tracks the total
/// number of items ever pushed so callers can reason about which item is the
/// oldest survivor.
#[derive(Debug)]
pub struct MessageRing {
    items: VecDeque<String>,
    capacity: Option<usize>,
    total_pushed: u64,
}

impl MessageRing {
    /// Create a ring holding at most `max` items (`max <= 0` → unbounded).
    pub fn new(max: i64) -> Self {
        let capacity = usize::try_from(max).ok().filter(|&n| n > 0);
        Self {
            items: VecDeque::with_capacity(capacity.unwrap_or(0)),
            capacity,
            total_pushed: 0,
        }
    }

    /// Append a rendered item, returning the evicted oldest item if any.
    pub fn push(&mut self, item: String) -> Option<String> {
        let evicted = match self.capacity {
            Some(cap) if self.items.len() >= cap => self.items.pop_front(),
            _ => None,
        };
        self.items.push_back(item);
        self.total_pushed += 1;
        evicted
    }

    /// Drop every item. The pushed counter keeps counting.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    /// Total items ever pushed through this ring.
    pub fn total_pushed(&self) -> u64 {
        self.total_pushed
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}

#[cfg(test)]
#[path = "ring_tests.rs"]
mod tests;
