//! Bounded in-memory conversation buffer
//!
//! Feeds the routing `context` and the `{context}` template variable.
//! Persistence of conversation memory is deliberately out of scope; this
//! buffer lives and dies with the process.

use std::collections::VecDeque;

/// Default number of query/response exchanges retained.
pub const DEFAULT_MEMORY_CAPACITY: usize = 20;

#[derive(Debug, Clone)]
pub struct ConversationBuffer {
    exchanges: VecDeque<(String, String)>,
    capacity: usize,
}

impl ConversationBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            exchanges: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, query: impl Into<String>, response: impl Into<String>) {
        if self.exchanges.len() == self.capacity {
            self.exchanges.pop_front();
        }
        self.exchanges.push_back((query.into(), response.into()));
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    /// Render the buffer as alternating Human/AI lines.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (query, response) in &self.exchanges {
            out.push_str("Human: ");
            out.push_str(query);
            out.push_str("\nAI: ");
            out.push_str(response);
            out.push('\n');
        }
        out
    }
}

impl Default for ConversationBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_CAPACITY)
    }
}
