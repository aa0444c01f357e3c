//! OpenAI LLM client implementation.
//!
//! Uses `async-openai` for API calls, `moka` for response caching, and
//! `backoff` for exponential-backoff retry on rate limits and 5xx errors.

use std::time::Duration;

use backoff::ExponentialBackoffBuilder;
use moka::future::Cache;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};

use crate::errors::{DebtGraphError, LlmError, Result};
use crate::types::DebtGraphConfig;
use crate::utils::{extract_json_from_response, truncate_with_ellipsis};

use super::{LlmClient, Message, Role};

// ── Configuration ─────────────────────────────────────────────────────────────

/// Configuration for the in-process response cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub max_capacity: u64,
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 1_000,
            ttl: Duration::from_secs(3_600),
        }
    }
}

/// Exponential backoff applied to retryable API failures.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    /// Give up once this much time has passed since the first attempt.
    pub max_elapsed: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(60),
            max_elapsed: Duration::from_secs(300),
        }
    }
}

// ── Client struct ─────────────────────────────────────────────────────────────

/// OpenAI LLM client implementing [`LlmClient`].
pub struct OpenAiClient {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    retry: RetryConfig,
    /// Keyed by `md5(prefix + model + messages)` → response text.
    cache: Cache<String, String>,
}

impl OpenAiClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        cache_config: CacheConfig,
    ) -> Self {
        let config = async_openai::config::OpenAIConfig::new().with_api_key(api_key);
        Self::with_openai_config(config, model, cache_config)
    }

    /// Build from the library configuration. Fails when no API key is set.
    pub fn from_config(config: &DebtGraphConfig) -> Result<Self> {
        let api_key = config.openai_api_key.as_deref().ok_or_else(|| {
            DebtGraphError::Validation("OPENAI_API_KEY is required for auto-extraction".into())
        })?;
        Ok(Self::new(api_key, config.model_name.clone(), CacheConfig::default()))
    }

    fn with_openai_config(
        config: async_openai::config::OpenAIConfig,
        model: impl Into<String>,
        cache_config: CacheConfig,
    ) -> Self {
        let cache = Cache::builder()
            .max_capacity(cache_config.max_capacity)
            .time_to_live(cache_config.ttl)
            .build();

        Self {
            client: async_openai::Client::with_config(config),
            model: model.into(),
            temperature: 0.0,
            max_tokens: 8_192,
            retry: RetryConfig::default(),
            cache,
        }
    }

    /// Override the sampling temperature (default `0.0`).
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Override the max output token limit (default `8192`).
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn cache_key(&self, prefix: &str, messages: &[Message]) -> String {
        use md5::{Digest, Md5};
        let mut h = Md5::new();
        h.update(prefix.as_bytes());
        h.update(self.model.as_bytes());
        for m in messages {
            h.update(role_str(&m.role).as_bytes());
            h.update(m.content.as_bytes());
        }
        format!("{:x}", h.finalize())
    }

    fn messages_to_json(messages: &[Message]) -> Vec<serde_json::Value> {
        messages
            .iter()
            .map(|m| {
                json!({
                    "role": role_str(&m.role),
                    "content": m.content,
                })
            })
            .collect()
    }

    /// Call the chat completions endpoint, retrying rate limits and 5xx errors.
    async fn call_with_retry(&self, request: serde_json::Value) -> Result<serde_json::Value> {
        let backoff = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.retry.initial_interval)
            .with_max_interval(self.retry.max_interval)
            .with_max_elapsed_time(Some(self.retry.max_elapsed))
            .build();

        backoff::future::retry(backoff, || async {
            let outcome: std::result::Result<serde_json::Value, async_openai::error::OpenAIError> =
                self.client.chat().create_byot(request.clone()).await;

            outcome.map_err(|e| {
                let llm_err = map_openai_error(e);
                match &llm_err {
                    LlmError::RateLimit => {
                        warn!("OpenAI rate limit hit, retrying with backoff");
                        backoff::Error::transient(llm_err)
                    }
                    LlmError::Api { status, .. } if *status >= 500 => {
                        warn!(status, "OpenAI server error, retrying");
                        backoff::Error::transient(llm_err)
                    }
                    _ => backoff::Error::permanent(llm_err),
                }
            })
        })
        .await
        .map_err(DebtGraphError::Llm)
    }

    fn extract_content(response: &serde_json::Value) -> Result<String> {
        let message = &response["choices"][0]["message"];
        if let Some(refusal) = message["refusal"].as_str() {
            warn!(refusal, "model refused the request");
            return Err(LlmError::Refusal.into());
        }
        message["content"]
            .as_str()
            .filter(|content| !content.trim().is_empty())
            .map(ToOwned::to_owned)
            .ok_or(DebtGraphError::Llm(LlmError::EmptyResponse))
    }
}

// ── LlmClient implementation ──────────────────────────────────────────────────

impl LlmClient for OpenAiClient {
    async fn generate(&self, messages: &[Message]) -> Result<String> {
        let key = self.cache_key("text", messages);

        if let Some(cached) = self.cache.get(&key).await {
            debug!("LLM cache hit (text)");
            return Ok(cached);
        }

        let request = json!({
            "model": self.model,
            "messages": Self::messages_to_json(messages),
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });

        let response = self.call_with_retry(request).await?;
        let content = Self::extract_content(&response)?;

        self.cache.insert(key, content.clone()).await;

        Ok(content)
    }

    async fn generate_structured<T>(&self, messages: &[Message]) -> Result<T>
    where
        T: DeserializeOwned + schemars::JsonSchema,
    {
        // Different target types for the same messages must not share an entry.
        let prefix = std::any::type_name::<T>();
        let key = self.cache_key(prefix, messages);

        if let Some(cached) = self.cache.get(&key).await {
            debug!(target_type = prefix, "LLM cache hit (structured)");
            return parse_structured(&cached);
        }

        let schema = schemars::schema_for!(T);
        let schema_value = serde_json::to_value(&schema)?;

        let request = json!({
            "model": self.model,
            "messages": Self::messages_to_json(messages),
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "response",
                    "schema": schema_value,
                }
            }
        });

        let response = self.call_with_retry(request).await?;
        let content = Self::extract_content(&response)?;
        let parsed = parse_structured(&content)?;

        self.cache.insert(key, content).await;

        Ok(parsed)
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn role_str(role: &Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

/// Parse model output that may be fenced or wrapped in prose.
fn parse_structured<T: DeserializeOwned>(content: &str) -> Result<T> {
    let body = extract_json_from_response(content).unwrap_or(content);
    serde_json::from_str(body).map_err(|e| {
        DebtGraphError::Extraction(format!(
            "model output is not valid JSON for the schema: {e} (got: {})",
            truncate_with_ellipsis(body, 120)
        ))
    })
}

/// Map an [`async_openai::error::OpenAIError`] to [`LlmError`].
///
/// `ApiError` carries no HTTP status, so classification goes by the error
/// `code` and `type` OpenAI returns in the body.
fn map_openai_error(err: async_openai::error::OpenAIError) -> LlmError {
    use async_openai::error::OpenAIError;

    match err {
        OpenAIError::ApiError(api_err) => {
            let code = api_err.code.as_deref().unwrap_or_default();
            let kind = api_err.r#type.as_deref().unwrap_or_default();
            match (code, kind) {
                ("invalid_api_key", _) | (_, "authentication_error") => LlmError::Authentication,
                ("rate_limit_exceeded", _) | (_, "requests") | (_, "tokens") => {
                    LlmError::RateLimit
                }
                (_, "server_error") => LlmError::Api {
                    status: 500,
                    message: api_err.message,
                },
                _ => LlmError::Api {
                    status: 400,
                    message: api_err.message,
                },
            }
        }
        other => LlmError::Api {
            status: 0,
            message: other.to_string(),
        },
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
