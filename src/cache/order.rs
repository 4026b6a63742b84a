//! Insertion Order Module
//!
//! Tracks key insertion order for FIFO eviction.

use std::collections::VecDeque;

// == Insertion Order ==
/// Keys in the order they were (re)inserted.
///
/// Keys are stored in a VecDeque where:
/// - Front = Oldest insertion
/// - Back = Newest insertion
///
/// Reads never reorder keys; only inserts do.
#[derive(Debug, Default)]
pub struct InsertionOrder {
    order: VecDeque<String>,
}

impl InsertionOrder {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Push Newest ==
    /// Places a key at the newest position.
    ///
    /// If the key is already tracked it is moved, not duplicated.
    pub fn push_newest(&mut self, key: &str) {
        self.remove(key);
        self.order.push_back(key.to_string());
    }

    // == Remove ==
    pub fn remove(&mut self, key: &str) {
        self.order.retain(|k| k != key);
    }

    // == Pop Oldest ==
    /// Returns and removes the oldest inserted key.
    ///
    /// Returns None if nothing is tracked.
    pub fn pop_oldest(&mut self) -> Option<String> {
        self.order.pop_front()
    }

    // == Peek Oldest ==
    pub fn peek_oldest(&self) -> Option<&String> {
        self.order.front()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterates keys from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.order.iter()
    }
}
