use crate::models::context::ContextBlock;
use crate::models::topic::TopicSpec;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Substituted for the context section when no topic asked for recent information.
pub const NO_CONTEXT_MARKER: &str = "No external context required";

const PROMPT_TEMPLATE: &str = r#"You are an experienced teacher and quiz author. Write multiple choice questions (MCQs) for the topics listed below.

Topics, difficulty levels and question counts:
{topics_difficulty_counts}

Context (may include recent information gathered from a web search; use it where relevant):
{context}

Rules:
1. Generate the requested number of questions for every topic, at the requested difficulty levels.
2. Every question has exactly four options keyed "a", "b", "c" and "d", and exactly one of them is correct.
3. "Answer" holds only the key of the correct option.
4. "Topic" and "Difficulty" repeat the topic and difficulty the question was written for.
5. Keep explanations short and factual. Do not repeat questions.

Return ONLY a JSON object with no surrounding text, shaped exactly like the example below. Number the questions "1", "2", "3" and so on across all topics:
{response_json}
"#;

/// Fully rendered text handed to the completion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPayload(String);

impl PromptPayload {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PromptPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaRecord {
    pub mcq: String,
    pub options: IndexMap<String, String>,
    #[serde(rename = "Answer")]
    pub answer: String,
    #[serde(rename = "Explanation")]
    pub explanation: String,
    #[serde(rename = "Topic")]
    pub topic: String,
    #[serde(rename = "Difficulty")]
    pub difficulty: String,
}

/// Example of the expected completion output. The response parser validates
/// against the same field names, so the two change together.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SchemaDescription {
    example: IndexMap<String, SchemaRecord>,
}

impl SchemaDescription {
    pub fn new(example: IndexMap<String, SchemaRecord>) -> Self {
        Self { example }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.example).unwrap_or_default()
    }
}

impl Default for SchemaDescription {
    fn default() -> Self {
        let record = |n: usize| SchemaRecord {
            mcq: format!("multiple choice question {}", n),
            options: ["a", "b", "c", "d"]
                .iter()
                .map(|k| (k.to_string(), "choice here".to_string()))
                .collect(),
            answer: "correct option key, e.g. \"b\"".to_string(),
            explanation: "why the answer is correct".to_string(),
            topic: "topic of the question".to_string(),
            difficulty: "difficulty of the question".to_string(),
        };

        Self::new((1..=2).map(|n| (n.to_string(), record(n))).collect())
    }
}

pub struct PromptRenderer;

impl PromptRenderer {
    /// Pure: identical inputs always give an identical payload.
    pub fn render(
        topics: &[TopicSpec],
        context: &[ContextBlock],
        schema: &SchemaDescription,
    ) -> PromptPayload {
        let topic_lines = Self::topic_lines(topics);
        let context_section = Self::context_section(context);
        let schema_json = schema.to_json();

        PromptPayload(fill_template(
            PROMPT_TEMPLATE,
            &[
                ("topics_difficulty_counts", topic_lines.as_str()),
                ("context", context_section.as_str()),
                ("response_json", schema_json.as_str()),
            ],
        ))
    }

    pub fn topic_lines(topics: &[TopicSpec]) -> String {
        topics
            .iter()
            .map(|t| {
                format!(
                    "{} - {} - generate {} questions",
                    t.topic.trim(),
                    t.difficulty_label(),
                    t.count
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Blocks whose search failed carry no text and are left out of the join.
    pub fn context_section(context: &[ContextBlock]) -> String {
        if context.is_empty() {
            return NO_CONTEXT_MARKER.to_string();
        }
        context
            .iter()
            .filter(|b| !b.is_empty())
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

// Single pass over the template so substituted text is never re-scanned for placeholders.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let extra: usize = values.iter().map(|(_, v)| v.len()).sum();
    let mut out = String::with_capacity(template.len() + extra);
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        let replaced = tail.find('}').and_then(|end| {
            let name = &tail[..end];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, end))
        });
        match replaced {
            Some((value, end)) => {
                out.push_str(value);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}
