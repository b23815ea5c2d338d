//! Per-frame input event queue

use super::Event;

/// Append-only FIFO of events for the current frame
///
/// The backing storage is reused between frames: [`EventQueue::clear`]
/// resets the length but keeps the allocation.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<Event>,
}

impl EventQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty queue with room for `capacity` events
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
        }
    }

    /// Append an event
    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Events in the order they were pushed
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    /// Remove and yield every event in FIFO order, keeping the allocation
    pub fn drain(&mut self) -> std::vec::Drain<'_, Event> {
        self.events.drain(..)
    }

    /// Forget all queued events without releasing memory
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Number of queued events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no events are queued
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Allocated capacity in events
    pub fn capacity(&self) -> usize {
        self.events.capacity()
    }
}

impl Extend<Event> for EventQueue {
    fn extend<I: IntoIterator<Item = Event>>(&mut self, iter: I) {
        self.events.extend(iter);
    }
}
