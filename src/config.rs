//! Process-level configuration
//!
//! Resolved once at start-up from the environment (after `.env` is loaded).
//! API keys are not part of this struct; see `ai::credentials`.

use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_GEMINI_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-pro:generateContent";
pub const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: '{value}'")]
    InvalidValue { var: String, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub gemini_endpoint: String,
    pub openai_endpoint: String,
    pub openai_model: String,
    pub openai_temperature: f32,
    /// Attempts against the chat-completion provider
    pub max_retries: u32,
    /// Backoff base; the n-th retry waits `base * 2^n`
    pub backoff_base: Duration,
    pub http_timeout: Duration,
    pub fallback_to_local: bool,
    pub tesseract_bin: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            gemini_endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            openai_endpoint: DEFAULT_OPENAI_ENDPOINT.to_string(),
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            openai_temperature: 0.7,
            max_retries: 3,
            backoff_base: Duration::from_millis(1000),
            http_timeout: Duration::from_secs(120),
            fallback_to_local: true,
            tesseract_bin: "tesseract".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Read overrides from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("REQFLOW_GEMINI_ENDPOINT") {
            config.gemini_endpoint = v;
        }
        if let Some(v) = lookup("REQFLOW_OPENAI_ENDPOINT") {
            config.openai_endpoint = v;
        }
        if let Some(v) = lookup("REQFLOW_OPENAI_MODEL") {
            config.openai_model = v;
        }
        if let Some(v) = parse_var(&lookup, "REQFLOW_OPENAI_TEMPERATURE")? {
            config.openai_temperature = v;
        }
        if let Some(v) = parse_var::<u32, _>(&lookup, "REQFLOW_MAX_RETRIES")? {
            if v == 0 {
                return Err(ConfigError::InvalidValue {
                    var: "REQFLOW_MAX_RETRIES".to_string(),
                    value: v.to_string(),
                });
            }
            config.max_retries = v;
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "REQFLOW_BACKOFF_BASE_MS")? {
            config.backoff_base = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "REQFLOW_HTTP_TIMEOUT_SECS")? {
            config.http_timeout = Duration::from_secs(secs);
        }
        if let Some(v) = lookup("REQFLOW_FALLBACK_TO_LOCAL") {
            config.fallback_to_local = parse_bool("REQFLOW_FALLBACK_TO_LOCAL", &v)?;
        }
        if let Some(v) = lookup("REQFLOW_TESSERACT_BIN") {
            config.tesseract_bin = v;
        }

        Ok(config)
    }
}

/// Load `.env` from the current directory, falling back to the parent
pub fn load_dotenv() {
    if dotenvy::dotenv().is_err() {
        let _ = dotenvy::from_path("../.env");
    }
}

fn parse_var<T, F>(lookup: &F, var: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                var: var.to_string(),
                value: raw,
            }),
    }
}

fn parse_bool(var: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var: var.to_string(),
            value: raw.to_string(),
        }),
    }
}
