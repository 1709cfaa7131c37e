use crate::services::prompt_service::PromptPayload;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Completion temperature used unless the caller overrides it.
pub const DEFAULT_TEMPERATURE: f32 = 0.8;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("completion API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("completion response has no message content")]
    EmptyChoice,

    #[error("completion envelope could not be decoded: {0}")]
    Envelope(String),
}

/// Token counts and estimated spend for one completion call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageRecord {
    pub model: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
    pub estimated_cost_usd: Option<f64>,
}

/// Side channel for invocation cost. Receives one record per successful call.
pub trait UsageObserver: Send + Sync {
    fn record(&self, usage: &UsageRecord);
}

/// Default observer: writes usage to the log.
#[derive(Debug, Default, Clone)]
pub struct TracingUsageObserver;

impl UsageObserver for TracingUsageObserver {
    fn record(&self, usage: &UsageRecord) {
        tracing::info!(
            model = %usage.model,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            total_tokens = usage.total_tokens,
            estimated_cost_usd = usage.estimated_cost_usd,
            "Completion usage"
        );
    }
}

/// Text-completion capability the generation pipeline talks to.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(
        &self,
        prompt: &PromptPayload,
        temperature: f32,
        model_id: &str,
    ) -> Result<String, CompletionError>;
}

/// USD per 1K prompt tokens and per 1K completion tokens.
fn price_per_1k(model: &str) -> Option<(f64, f64)> {
    let prices = [
        ("gpt-4o-mini", (0.000_15, 0.000_6)),
        ("gpt-4o", (0.002_5, 0.01)),
        ("gpt-4-turbo", (0.01, 0.03)),
        ("gpt-4", (0.03, 0.06)),
        ("gpt-3.5-turbo", (0.000_5, 0.001_5)),
    ];
    // First match in list order wins; each longer prefix sits above its shorter one.
    prices
        .iter()
        .find(|(prefix, _)| model.starts_with(prefix))
        .map(|(_, p)| *p)
}

pub fn estimate_cost(model: &str, prompt_tokens: u32, completion_tokens: u32) -> Option<f64> {
    price_per_1k(model).map(|(input, output)| {
        (prompt_tokens as f64 / 1000.0) * input + (completion_tokens as f64 / 1000.0) * output
    })
}

/// OpenAI-compatible chat completions client.
#[derive(Clone)]
pub struct AIService {
    client: Client,
    api_key: String,
    base_url: String,
    usage: Arc<dyn UsageObserver>,
}

impl AIService {
    pub fn new(api_key: String, base_url: String, client: Client) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            usage: Arc::new(TracingUsageObserver),
        }
    }

    pub fn with_usage_observer(mut self, usage: Arc<dyn UsageObserver>) -> Self {
        self.usage = usage;
        self
    }

    async fn chat_openai(
        &self,
        prompt: &str,
        temperature: f32,
        model: &str,
    ) -> Result<String, CompletionError> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct ResponseFormat<'a> {
            #[serde(rename = "type")]
            r#type: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            temperature: f32,
            response_format: ResponseFormat<'a>,
            messages: Vec<Msg<'a>>,
        }
        #[derive(Deserialize)]
        struct RespChoiceMsg {
            content: Option<String>,
        }
        #[derive(Deserialize)]
        struct RespChoice {
            message: RespChoiceMsg,
        }
        #[derive(Deserialize)]
        struct RespUsage {
            #[serde(default)]
            prompt_tokens: u32,
            #[serde(default)]
            completion_tokens: u32,
            #[serde(default)]
            total_tokens: u32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<RespChoice>,
            usage: Option<RespUsage>,
        }

        let req = Req {
            model,
            temperature,
            response_format: ResponseFormat {
                r#type: "json_object",
            },
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
        };

        let res = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&req)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let body: Resp = res
            .json()
            .await
            .map_err(|e| CompletionError::Envelope(e.to_string()))?;

        if let Some(u) = &body.usage {
            let total = if u.total_tokens > 0 {
                u.total_tokens
            } else {
                u.prompt_tokens + u.completion_tokens
            };
            self.usage.record(&UsageRecord {
                model: model.to_string(),
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: total,
                estimated_cost_usd: estimate_cost(model, u.prompt_tokens, u.completion_tokens),
            });
        }

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(CompletionError::EmptyChoice)
    }
}

#[async_trait]
impl CompletionProvider for AIService {
    async fn complete(
        &self,
        prompt: &PromptPayload,
        temperature: f32,
        model_id: &str,
    ) -> Result<String, CompletionError> {
        tracing::info!(
            model = model_id,
            temperature,
            prompt_chars = prompt.as_str().len(),
            "Sending request to completion service"
        );
        self.chat_openai(prompt.as_str(), temperature, model_id).await
    }
}
