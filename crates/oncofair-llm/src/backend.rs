//! LLM backend trait and concrete implementations.
//!
//! Backends:
//!   OpenAiCompatibleBackend — any OpenAI-style /chat/completions endpoint
//!                             (xAI Grok by default, OpenAI, Groq, vLLM, …)
//!   OllamaBackend           — local Ollama (OpenAI-compatible)
//!   AnthropicBackend        — Anthropic Messages API (claude-*)

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use oncofair_config::{InsightsConfig, Provider};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const XAI_BASE_URL: &str = "https://api.x.ai/v1";
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
    #[error("API error [{status}]: {message}")]
    ApiError { status: u16, message: String },
    #[error("Backend returned no content")]
    EmptyResponse,
}

// ── Request / Response ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,   // "system" | "user" | "assistant"
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    pub messages: Vec<Message>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    pub model: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

// ── Trait ─────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError>;
    fn model_id(&self) -> &str;
    fn backend_name(&self) -> &'static str;
    fn is_local(&self) -> bool;
}

// ── Helper: parse OpenAI-style response ──────────────────────────────────────

pub(crate) fn parse_openai_response(json: &serde_json::Value, fallback_model: &str) -> LlmResponse {
    LlmResponse {
        content: json["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("")
            .to_string(),
        model: json["model"]
            .as_str()
            .unwrap_or(fallback_model)
            .to_string(),
        prompt_tokens:     json["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32,
        completion_tokens: json["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32,
    }
}

async fn check_response_status(resp: reqwest::Response) -> Result<serde_json::Value, LlmError> {
    let status = resp.status().as_u16();
    let text = resp.text().await?;
    let body: serde_json::Value = if status >= 400 {
        // Error bodies are not always JSON.
        serde_json::from_str(&text).unwrap_or_else(|_| serde_json::json!({ "message": text }))
    } else {
        serde_json::from_str(&text)?
    };
    if status >= 400 {
        let msg = body["error"]["message"]
            .as_str()
            .or_else(|| body["error"].as_str())
            .or_else(|| body["message"].as_str())
            .unwrap_or("unknown API error")
            .to_string();
        return Err(LlmError::ApiError { status, message: msg });
    }
    Ok(body)
}

fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("Falling back to default HTTP client: {e}");
            reqwest::Client::new()
        })
}

fn openai_body(req: &LlmRequest, default_model: &str) -> serde_json::Value {
    serde_json::json!({
        "model":       req.model.as_deref().unwrap_or(default_model),
        "messages":    req.messages,
        "max_tokens":  req.max_tokens.unwrap_or(1000),
        "temperature": req.temperature.unwrap_or(0.7),
    })
}

// ── 1. OpenAI-Compatible (xAI, OpenAI, Groq, OpenRouter, vLLM, …) ────────────

pub struct OpenAiCompatibleBackend {
    pub base_url: String,
    pub model: String,
    api_key: Option<SecretString>,
    client: reqwest::Client,
}

impl OpenAiCompatibleBackend {
    /// `base_url` includes the API version segment, e.g. `https://api.x.ai/v1`.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.map(SecretString::from),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = http_client(timeout);
        self
    }

    fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(k) => req.bearer_auth(k.expose_secret()),
            None    => req,
        }
    }
}

#[async_trait]
impl LlmBackend for OpenAiCompatibleBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = openai_body(&req, &self.model);
        let resp = self.auth(self.client.post(&url)).json(&body).send().await?;
        let json = check_response_status(resp).await?;
        Ok(parse_openai_response(&json, &self.model))
    }

    fn model_id(&self) -> &str { &self.model }
    fn backend_name(&self) -> &'static str { "openai_compatible" }
    fn is_local(&self) -> bool { false }
}

// ── 2. Ollama (local) ─────────────────────────────────────────────────────────

pub struct OllamaBackend {
    pub base_url: String,
    pub model: String,
    client: reqwest::Client,
}

impl OllamaBackend {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), model: model.into(), client: reqwest::Client::new() }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = http_client(timeout);
        self
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));
        let body = openai_body(&req, &self.model);
        let resp = self.client.post(&url).json(&body).send().await?;
        let json = check_response_status(resp).await?;
        Ok(parse_openai_response(&json, &self.model))
    }

    fn model_id(&self) -> &str { &self.model }
    fn backend_name(&self) -> &'static str { "ollama" }
    fn is_local(&self) -> bool { true }
}

// ── 3. Anthropic (claude-*) ───────────────────────────────────────────────────

pub struct AnthropicBackend {
    pub base_url: String,
    pub model: String,
    api_key: SecretString,
    client: reqwest::Client,
}

impl AnthropicBackend {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: ANTHROPIC_BASE_URL.to_string(),
            model: model.into(),
            api_key: SecretString::from(api_key.into()),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = http_client(timeout);
        self
    }
}

#[async_trait]
impl LlmBackend for AnthropicBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        // Anthropic Messages API — split system prompt from user messages
        let system = req.messages.iter()
            .find(|m| m.role == "system")
            .map(|m| m.content.as_str())
            .unwrap_or("");

        let messages: Vec<serde_json::Value> = req.messages.iter()
            .filter(|m| m.role != "system")
            .map(|m| serde_json::json!({"role": m.role, "content": m.content}))
            .collect();

        let model = req.model.as_deref().unwrap_or(&self.model);

        let mut body = serde_json::json!({
            "model":       model,
            "messages":    messages,
            "max_tokens":  req.max_tokens.unwrap_or(1000),
            "temperature": req.temperature.unwrap_or(0.7),
        });
        if !system.is_empty() {
            body["system"] = serde_json::Value::String(system.to_string());
        }

        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let resp = self.client
            .post(&url)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await?;

        let json = check_response_status(resp).await?;

        let content = json["content"]
            .as_array()
            .and_then(|blocks| blocks.first())
            .and_then(|b| b["text"].as_str())
            .unwrap_or("")
            .to_string();

        Ok(LlmResponse {
            content,
            model: json["model"].as_str().unwrap_or(model).to_string(),
            prompt_tokens:     json["usage"]["input_tokens"].as_u64().unwrap_or(0) as u32,
            completion_tokens: json["usage"]["output_tokens"].as_u64().unwrap_or(0) as u32,
        })
    }

    fn model_id(&self) -> &str { &self.model }
    fn backend_name(&self) -> &'static str { "anthropic" }
    fn is_local(&self) -> bool { false }
}

// ── Construction from config ─────────────────────────────────────────────────

/// Build the configured insight backend. `None` when insights are disabled
/// or the provider cannot work without a key that is not set.
pub fn build_backend(config: &InsightsConfig) -> Option<Arc<dyn LlmBackend>> {
    if !config.enabled {
        tracing::info!("Insight generation disabled; responses will carry the fallback text");
        return None;
    }

    let timeout = Duration::from_secs(config.timeout_secs);
    let api_key = config.resolve_api_key();

    let backend: Arc<dyn LlmBackend> = match config.provider {
        Provider::OpenAiCompatible => {
            if api_key.is_none() {
                tracing::warn!(
                    "No API key for the insight backend (set insights.api_key or {})",
                    oncofair_config::API_KEY_ENV
                );
            }
            let base = config.base_url.as_deref().unwrap_or(XAI_BASE_URL);
            Arc::new(
                OpenAiCompatibleBackend::new(base, &config.model, api_key).with_timeout(timeout),
            )
        }
        Provider::Ollama => {
            let base = config.base_url.as_deref().unwrap_or(OLLAMA_BASE_URL);
            Arc::new(OllamaBackend::new(base, &config.model).with_timeout(timeout))
        }
        Provider::Anthropic => {
            let Some(key) = api_key else {
                tracing::warn!(
                    "Anthropic configured but no API key found (set insights.api_key or {})",
                    oncofair_config::API_KEY_ENV
                );
                return None;
            };
            let base = config.base_url.as_deref().unwrap_or(ANTHROPIC_BASE_URL);
            Arc::new(
                AnthropicBackend::new(key, &config.model)
                    .with_base_url(base)
                    .with_timeout(timeout),
            )
        }
    };

    tracing::info!(
        backend = backend.backend_name(),
        model = backend.model_id(),
        is_local = backend.is_local(),
        "Insight backend ready"
    );
    Some(backend)
}

// ── Mock Implementation for Testing ────────────────────────────────────────

/// Canned-response backend that records the requests it receives.
pub struct MockLlmBackend {
    reply: Result<String, String>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlmBackend {
    pub fn replying(content: impl Into<String>) -> Self {
        Self { reply: Ok(content.into()), requests: Mutex::new(Vec::new()) }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self { reply: Err(message.into()), requests: Mutex::new(Vec::new()) }
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmBackend for MockLlmBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        if let Ok(mut log) = self.requests.lock() {
            log.push(req);
        }
        match &self.reply {
            Ok(content) => Ok(LlmResponse {
                content: content.clone(),
                model: "mock".to_string(),
                prompt_tokens: 0,
                completion_tokens: 0,
            }),
            Err(message) => Err(LlmError::Unavailable(message.clone())),
        }
    }

    fn model_id(&self) -> &str { "mock" }
    fn backend_name(&self) -> &'static str { "mock" }
    fn is_local(&self) -> bool { true }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
