//! Configuration loading for OncoFair.
//! Reads oncofair.toml from the current directory or path in ONCOFAIR_CONFIG env var.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Env var holding the insight backend API key when the config leaves it blank.
pub const API_KEY_ENV: &str = "ONCOFAIR_LLM_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub insights: InsightsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest accepted request body, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

/// 100 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

fn default_host() -> String            { "127.0.0.1".to_string() }
fn default_port() -> u16               { 8000 }
fn default_max_upload_bytes() -> usize { DEFAULT_MAX_UPLOAD_BYTES }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    #[serde(default = "default_her2_path")]
    pub her2_path: PathBuf,
    #[serde(default = "default_lung_path")]
    pub lung_path: PathBuf,
}

fn default_her2_path() -> PathBuf { PathBuf::from("models/her2_status_model.json") }
fn default_lung_path() -> PathBuf { PathBuf::from("models/cancer_subtype_model.json") }

impl Default for ModelsConfig {
    fn default() -> Self {
        Self { her2_path: default_her2_path(), lung_path: default_lung_path() }
    }
}

/// Which wire protocol the insight backend speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    #[serde(rename = "openai_compatible")]
    OpenAiCompatible,
    Ollama,
    Anthropic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightsConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    #[serde(default = "default_provider")]
    pub provider: Provider,
    /// Overrides the provider's default endpoint.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn bool_true()            -> bool     { true }
fn default_provider()     -> Provider { Provider::OpenAiCompatible }
fn default_model()        -> String   { "grok-2-1212".to_string() }
fn default_max_tokens()   -> u32      { 1000 }
fn default_temperature()  -> f32      { 0.7 }
fn default_timeout_secs() -> u64      { 60 }

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            enabled: bool_true(),
            provider: default_provider(),
            base_url: None,
            model: default_model(),
            api_key: String::new(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl InsightsConfig {
    /// API key from the config file, falling back to `ONCOFAIR_LLM_API_KEY`.
    /// Blank keys resolve to `None`.
    pub fn resolve_api_key(&self) -> Option<String> {
        let key = if self.api_key.is_empty() {
            std::env::var(API_KEY_ENV).unwrap_or_default()
        } else {
            self.api_key.clone()
        };
        let key = key.trim().to_string();
        (!key.is_empty()).then_some(key)
    }
}


impl Config {
    /// Load configuration from oncofair.toml.
    /// Checks ONCOFAIR_CONFIG env var first, then current directory.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("ONCOFAIR_CONFIG")
            .unwrap_or_else(|_| "oncofair.toml".to_string());

        if !Path::new(&path).exists() {
            anyhow::bail!(
                "Config file not found: {}\n\
                 Copy oncofair.example.toml to oncofair.toml and edit it.",
                path
            );
        }

        Self::from_file(&path)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        tracing::debug!(
            bind = %config.server.bind_addr(),
            insights = config.insights.enabled,
            "configuration parsed"
        );
        Ok(config)
    }
}
