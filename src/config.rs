use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub model_name: String,
    pub temperature: f32,
    pub tavily_api_key: Option<String>,
    pub max_questions_per_topic: u32,
    pub generation_timeout_secs: u64,
    pub page_size: usize,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let log_format = match get_env_or("LOG_FORMAT", "text").to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "text" => LogFormat::Text,
            other => {
                return Err(Error::Config(format!(
                    "Invalid value for LOG_FORMAT: {}",
                    other
                )))
            }
        };

        let page_size: usize = get_env_parse_or("PAGE_SIZE", 5)?;
        if page_size == 0 {
            return Err(Error::Config("PAGE_SIZE must be at least 1".to_string()));
        }

        Ok(Self {
            server_address: get_env_or("SERVER_ADDRESS", "127.0.0.1:8000"),
            openai_api_key: get_env("OPENAI_API_KEY")?,
            openai_base_url: get_env_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            model_name: get_env_or("MCQ_MODEL", "gpt-4o-mini"),
            temperature: get_env_parse_or("MCQ_TEMPERATURE", 0.8)?,
            tavily_api_key: env::var("TAVILY_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            max_questions_per_topic: get_env_parse_or("MAX_QUESTIONS_PER_TOPIC", 50)?,
            generation_timeout_secs: get_env_parse_or("GENERATION_TIMEOUT_SECS", 300)?,
            page_size,
            log_format,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
