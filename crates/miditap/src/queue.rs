use std::collections::VecDeque;

use crate::message::MidiMessage;

/// Unbounded FIFO of decoded messages.
///
/// Deliberately has no capacity bound and no peek: a slow consumer
/// accumulates memory rather than dropping events, because the consumer
/// protocol is "poll until empty" and a dropped event would break it.
/// Not internally synchronized; lives behind the session lock together
/// with the registry.
#[derive(Debug, Default)]
pub struct IngestQueue {
    messages: VecDeque<MidiMessage>,
}

impl IngestQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message at the tail. Always succeeds.
    pub fn enqueue(&mut self, message: MidiMessage) {
        self.messages.push_back(message);
    }

    /// Remove and return the head, or `None` when empty.
    pub fn dequeue(&mut self) -> Option<MidiMessage> {
        self.messages.pop_front()
    }

    /// Number of queued messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the queue holds no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
