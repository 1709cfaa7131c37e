pub mod config;
pub mod dto;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::error::{Error, Result};
use crate::services::{
    ai_service::AIService,
    generation_service::{GenerationService, GenerationSettings},
    pagination_service::DEFAULT_PAGE_SIZE,
    search_service::{DisabledSearch, SearchProvider, TavilySearch},
};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub generation_service: GenerationService,
    pub page_size: usize,
    pub generation_timeout: Duration,
    pub search_enabled: bool,
}

impl AppState {
    pub fn new() -> Result<Self> {
        let config = crate::config::get_config();
        let http_client = Client::builder()
            .timeout(Duration::from_secs(180))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        let search: Arc<dyn SearchProvider> = match &config.tavily_api_key {
            Some(key) => Arc::new(TavilySearch::new(key.clone(), http_client.clone())),
            None => {
                tracing::warn!("TAVILY_API_KEY is not set; topics flagged as recent will get no search context");
                Arc::new(DisabledSearch)
            }
        };
        let ai_service = AIService::new(
            config.openai_api_key.clone(),
            config.openai_base_url.clone(),
            http_client,
        );
        let generation_service = GenerationService::new(
            search,
            Arc::new(ai_service),
            GenerationSettings {
                model_id: config.model_name.clone(),
                temperature: config.temperature,
                max_questions_per_topic: config.max_questions_per_topic,
            },
        );

        Ok(Self {
            generation_service,
            page_size: config.page_size,
            generation_timeout: Duration::from_secs(config.generation_timeout_secs),
            search_enabled: config.tavily_api_key.is_some(),
        })
    }

    /// State around an already-built pipeline, with default paging and timeout.
    pub fn with_service(generation_service: GenerationService) -> Self {
        Self {
            generation_service,
            page_size: DEFAULT_PAGE_SIZE,
            generation_timeout: Duration::from_secs(300),
            search_enabled: false,
        }
    }
}
