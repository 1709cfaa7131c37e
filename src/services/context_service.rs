use crate::models::context::ContextBlock;
use crate::models::topic::TopicSpec;
use crate::services::search_service::{SearchHit, SearchProvider};
use crate::utils::text::{squash_whitespace, truncate_chars};
use std::sync::Arc;

/// Results kept per topic; bounds the prompt size.
pub const MAX_SEARCH_RESULTS: usize = 3;
const MAX_SNIPPET_CHARS: usize = 800;

#[derive(Clone)]
pub struct ContextAggregator {
    provider: Arc<dyn SearchProvider>,
}

impl ContextAggregator {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self { provider }
    }

    /// Builds one block per `recent` topic, in input order. Topics are searched
    /// one at a time; a failed search yields an empty block for that topic.
    pub async fn aggregate(&self, topics: &[TopicSpec]) -> Vec<ContextBlock> {
        let mut blocks = Vec::new();

        for spec in topics.iter().filter(|t| t.recent) {
            let topic = spec.topic.trim();
            match self.provider.search(topic, MAX_SEARCH_RESULTS).await {
                Ok(hits) => {
                    tracing::debug!(topic, hits = hits.len(), "Search context fetched");
                    blocks.push(ContextBlock {
                        topic: topic.to_string(),
                        text: format_block(topic, &hits),
                    });
                }
                Err(e) => {
                    tracing::warn!(topic, error = %e, "Search failed, continuing without context for topic");
                    blocks.push(ContextBlock::empty(topic));
                }
            }
        }

        blocks
    }
}

fn format_block(topic: &str, hits: &[SearchHit]) -> String {
    let mut text = format!("Topic: {}\nSearch Results:", topic);
    for (i, hit) in hits.iter().take(MAX_SEARCH_RESULTS).enumerate() {
        let title = squash_whitespace(&hit.title);
        text.push_str(&format!("\n{}. {}", i + 1, title));
        if !hit.url.trim().is_empty() {
            text.push_str(&format!(" ({})", hit.url.trim()));
        }
        let snippet = truncate_chars(&squash_whitespace(&hit.content), MAX_SNIPPET_CHARS);
        if !snippet.is_empty() {
            text.push_str("\n   ");
            text.push_str(&snippet);
        }
    }
    text
}
