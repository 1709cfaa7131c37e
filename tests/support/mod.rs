#![allow(dead_code)]

use async_trait::async_trait;
use mcq_generator::services::ai_service::{CompletionError, CompletionProvider};
use mcq_generator::services::prompt_service::PromptPayload;
use mcq_generator::services::search_service::{SearchError, SearchHit, SearchProvider};
use serde_json::{json, Value as JsonValue};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Completion stub that replays a fixed answer and remembers every prompt it saw.
pub struct StubCompletion {
    reply: Result<String, u16>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl StubCompletion {
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            reply: Ok(text.into()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_with_status(status: u16) -> Self {
        Self {
            reply: Err(status),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CompletionProvider for StubCompletion {
    async fn complete(
        &self,
        prompt: &PromptPayload,
        _temperature: f32,
        _model_id: &str,
    ) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.as_str().to_string());
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(status) => Err(CompletionError::Status {
                status: *status,
                body: "stubbed failure".to_string(),
            }),
        }
    }
}

/// Search stub: topics listed in `failing` error out, everything else gets one hit.
#[derive(Default)]
pub struct StubSearch {
    pub failing: Vec<String>,
    queries: Mutex<Vec<String>>,
}

impl StubSearch {
    pub fn failing_for(topics: &[&str]) -> Self {
        Self {
            failing: topics.iter().map(|t| t.to_string()).collect(),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for StubSearch {
    async fn search(
        &self,
        query: &str,
        _max_results: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        self.queries.lock().unwrap().push(query.to_string());
        if self.failing.iter().any(|t| t == query) {
            return Err(SearchError::Status {
                status: 500,
                body: "search down".to_string(),
            });
        }
        Ok(vec![SearchHit {
            title: format!("Latest on {}", query),
            url: "https://news.example/latest".to_string(),
            content: format!("Fresh facts about {}.", query),
        }])
    }
}

pub fn question(topic: &str, answer: &str) -> JsonValue {
    json!({
        "mcq": format!("Which statement about {} is true?", topic),
        "options": {
            "a": "It is billed on demand",
            "b": "It requires owning hardware",
            "c": "It cannot scale",
            "d": "It only runs offline"
        },
        "Answer": answer,
        "Explanation": "On-demand billing is the defining trait.",
        "Topic": topic,
        "Difficulty": "Easy"
    })
}

/// Object-shaped completion keyed "1".."n".
pub fn completion_json(records: Vec<JsonValue>) -> String {
    let body = records
        .iter()
        .enumerate()
        .map(|(idx, r)| format!("\"{}\": {}", idx + 1, r))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{}}}", body)
}
