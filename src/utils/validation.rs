use crate::models::topic::TopicSpec;

/// Rejects an empty batch and reports the first malformed row with its 1-based position.
pub fn validate_topics(topics: &[TopicSpec], max_count: u32) -> Result<(), String> {
    if topics.is_empty() {
        return Err("At least one topic is required".to_string());
    }
    for (idx, spec) in topics.iter().enumerate() {
        spec.check(max_count)
            .map_err(|e| format!("Topic #{}: {}", idx + 1, e))?;
    }
    Ok(())
}
