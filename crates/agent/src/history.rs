//! Bounded conversation history.

use std::collections::VecDeque;

use folio_core::message::Message;

use crate::prompt::{FALLBACK_MARKER, OFF_TOPIC_MARKER};

pub const DEFAULT_HISTORY_CAPACITY: usize = 8;

/// Replies containing any of these are never recorded.
pub const REFUSAL_MARKERS: [&str; 2] = [FALLBACK_MARKER, OFF_TOPIC_MARKER];

/// The user/assistant turns of one conversation.
///
/// Turns are stored as (user, assistant) pairs. Once the history holds
/// `capacity` messages the oldest pair is evicted first. Replies that are
/// fallback or off-topic refusals are dropped so they never shape later
/// prompts.
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    messages: VecDeque<Message>,
    capacity: usize,
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// `capacity` is rounded down to a whole number of turns, minimum one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = (capacity / 2).max(1) * 2;
        Self {
            messages: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record a completed turn. Returns `false` if the reply was a refusal
    /// and the turn was skipped.
    pub fn append_turn(&mut self, query: &str, response: &str) -> bool {
        if is_refusal(response) {
            return false;
        }

        self.messages.push_back(Message::user(query));
        self.messages.push_back(Message::assistant(response));
        while self.messages.len() > self.capacity {
            self.messages.pop_front();
        }
        true
    }

    /// The last `n` messages (all of them if fewer), oldest first.
    pub fn recent(&self, n: usize) -> Vec<Message> {
        let skip = self.messages.len().saturating_sub(n);
        self.messages.iter().skip(skip).cloned().collect()
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

/// Whether `response` is one of the canned refusal replies.
pub fn is_refusal(response: &str) -> bool {
    REFUSAL_MARKERS.iter().any(|m| response.contains(m))
}
