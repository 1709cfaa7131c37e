use crate::error::{FailureKind, GenerationFailure};
use crate::models::question::QuestionSet;
use crate::models::topic::TopicSpec;
use crate::services::ai_service::{CompletionProvider, DEFAULT_TEMPERATURE};
use crate::services::context_service::ContextAggregator;
use crate::services::parser_service::ResponseParser;
use crate::services::prompt_service::{PromptRenderer, SchemaDescription};
use crate::services::search_service::SearchProvider;
use crate::utils::text::truncate_chars;
use crate::utils::validation::validate_topics;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::Instrument;

/// Upper bound on how much of a rejected completion goes into the failure log.
const MAX_LOGGED_RAW_CHARS: usize = 2_000;

pub type GenerationResult = std::result::Result<QuestionSet, GenerationFailure>;

/// Steps of one generation run, in the order they execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GenerationStage {
    Idle,
    AggregatingContext,
    Rendering,
    Completing,
    Parsing,
    Done,
    Failed,
}

impl fmt::Display for GenerationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GenerationStage::Idle => "idle",
            GenerationStage::AggregatingContext => "aggregating context",
            GenerationStage::Rendering => "rendering",
            GenerationStage::Completing => "completing",
            GenerationStage::Parsing => "parsing",
            GenerationStage::Done => "done",
            GenerationStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub model_id: String,
    pub temperature: f32,
    pub max_questions_per_topic: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model_id: "gpt-4o-mini".to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_questions_per_topic: 50,
        }
    }
}

/// Runs context aggregation, prompt rendering, completion and parsing for one
/// batch of topics. Holds only read-only collaborators; every call is independent.
#[derive(Clone)]
pub struct GenerationService {
    aggregator: ContextAggregator,
    completion: Arc<dyn CompletionProvider>,
    schema: SchemaDescription,
    settings: GenerationSettings,
}

impl GenerationService {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        completion: Arc<dyn CompletionProvider>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            aggregator: ContextAggregator::new(search),
            completion,
            schema: SchemaDescription::default(),
            settings,
        }
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// Never returns an untyped fault: every step error becomes a `GenerationFailure`,
    /// and a panicking step is reported as `FailureKind::Internal`.
    pub async fn generate(&self, topics: &[TopicSpec]) -> GenerationResult {
        let span = tracing::info_span!(
            "generation",
            topics = topics.len(),
            model = %self.settings.model_id
        );

        async {
            let result = self.run_isolated(topics).await;
            match &result {
                Ok(questions) => {
                    tracing::info!(
                        stage = %GenerationStage::Done,
                        questions = questions.len(),
                        "Generation finished"
                    );
                }
                Err(failure) => {
                    let raw = failure
                        .raw
                        .as_deref()
                        .map(|raw| truncate_chars(raw, MAX_LOGGED_RAW_CHARS))
                        .unwrap_or_default();
                    tracing::error!(
                        stage = %GenerationStage::Failed,
                        failed_during = %failure.stage,
                        kind = %failure.kind,
                        error = %failure.message,
                        raw = %raw,
                        "Generation failed"
                    );
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run_isolated(&self, topics: &[TopicSpec]) -> GenerationResult {
        let service = self.clone();
        let topics = topics.to_vec();
        let mut task = AbortOnDrop(tokio::spawn(
            async move { service.run(&topics).await }.in_current_span(),
        ));

        match (&mut task.0).await {
            Ok(result) => result,
            Err(e) => {
                let message = if e.is_panic() {
                    panic_message(e.into_panic())
                } else {
                    e.to_string()
                };
                Err(GenerationFailure::new(
                    FailureKind::Internal,
                    GenerationStage::Failed,
                    format!("Generation aborted: {}", message),
                ))
            }
        }
    }

    async fn run(&self, topics: &[TopicSpec]) -> GenerationResult {
        validate_topics(topics, self.settings.max_questions_per_topic).map_err(|message| {
            GenerationFailure::new(FailureKind::InvalidInput, GenerationStage::Idle, message)
        })?;

        enter(GenerationStage::AggregatingContext);
        let context = self.aggregator.aggregate(topics).await;

        enter(GenerationStage::Rendering);
        let prompt = PromptRenderer::render(topics, &context, &self.schema);

        enter(GenerationStage::Completing);
        let raw = self
            .completion
            .complete(&prompt, self.settings.temperature, &self.settings.model_id)
            .await
            .map_err(|e| {
                GenerationFailure::new(
                    FailureKind::CompletionServiceFailure,
                    GenerationStage::Completing,
                    e.to_string(),
                )
            })?;

        enter(GenerationStage::Parsing);
        ResponseParser::parse(&raw)
    }
}

/// Cancels the pipeline task when the caller stops waiting, e.g. on timeout.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "step panicked".to_string()
    }
}

fn enter(stage: GenerationStage) {
    tracing::info!(stage = %stage, "Generation stage");
}
