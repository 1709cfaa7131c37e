use serde::{Deserialize, Serialize};

/// Search-derived text for one topic, already framed for the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextBlock {
    pub topic: String,
    pub text: String,
}

impl ContextBlock {
    /// Placeholder used when a topic's search failed.
    pub fn empty(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            text: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}
