//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Backend and static asset locations
    #[serde(default)]
    pub api: ApiConfig,

    /// Fallback chain behavior
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Identity provider and session persistence
    #[serde(default)]
    pub auth: AuthConfig,

    /// AI assistant settings
    #[serde(default)]
    pub chat: ChatConfig,

    /// Log verbosity
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Overlay values from an arbitrary variable lookup.
    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = lookup("PATHWISE_API_BASE_URL") {
            self.api.base_url = v;
        }
        if let Some(v) = lookup("PATHWISE_STATIC_BASE") {
            self.api.static_base = v;
        }
        if let Some(v) = lookup("PATHWISE_TIMEOUT_MS") {
            match v.parse() {
                Ok(ms) => self.api.timeout_ms = ms,
                Err(_) => log::warn!("Ignoring PATHWISE_TIMEOUT_MS={v}: not a number"),
            }
        }
        if let Some(v) = lookup("SUPABASE_URL") {
            self.auth.provider_url = Some(v);
        }
        if let Some(v) = lookup("SUPABASE_ANON_KEY") {
            self.auth.anon_key = Some(v);
        }
        if let Some(v) = lookup("OPENAI_API_KEY") {
            self.chat.api_key = Some(v);
        }
        if let Some(v) = lookup("OPENAI_MODEL") {
            self.chat.model = v;
        }
        self
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.api.base_url)
            .map_err(|e| AppError::validation(format!("api.base_url is not a URL: {e}")))?;
        if self.api.static_base.trim().is_empty() {
            return Err(AppError::validation("api.static_base is empty"));
        }
        if self.api.user_agent.trim().is_empty() {
            return Err(AppError::validation("api.user_agent is empty"));
        }
        if self.api.timeout_ms == 0 {
            return Err(AppError::validation("api.timeout_ms must be > 0"));
        }
        if let Some(provider) = &self.auth.provider_url {
            url::Url::parse(provider)
                .map_err(|e| AppError::validation(format!("auth.provider_url: {e}")))?;
        }
        if self.auth.session_file.trim().is_empty() {
            return Err(AppError::validation("auth.session_file is empty"));
        }
        if !(0.0..=2.0).contains(&self.chat.temperature) {
            return Err(AppError::validation("chat.temperature must be within 0.0..=2.0"));
        }
        if self.chat.max_tokens == 0 {
            return Err(AppError::validation("chat.max_tokens must be > 0"));
        }
        Ok(())
    }
}

/// Backend API and static asset locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the backend content API
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Static asset root: an http(s) URL or a local directory
    #[serde(default = "defaults::static_base")]
    pub static_base: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-source request timeout in milliseconds
    #[serde(default = "defaults::timeout_ms")]
    pub timeout_ms: u64,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            static_base: defaults::static_base(),
            user_agent: defaults::user_agent(),
            timeout_ms: defaults::timeout_ms(),
        }
    }
}

/// Fallback chain behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Treat a well-formed but empty remote collection as a failure
    #[serde(default = "defaults::empty_remote_is_failure")]
    pub empty_remote_is_failure: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            empty_remote_is_failure: defaults::empty_remote_is_failure(),
        }
    }
}

/// Identity provider and session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Identity provider base URL
    #[serde(default)]
    pub provider_url: Option<String>,

    /// Public (anon) key sent with provider requests
    #[serde(default)]
    pub anon_key: Option<String>,

    /// Where the session token is persisted
    #[serde(default = "defaults::session_file")]
    pub session_file: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            provider_url: None,
            anon_key: None,
            session_file: defaults::session_file(),
        }
    }
}

/// AI assistant settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Key for direct chat-completion calls; backend route is used when unset
    #[serde(default)]
    pub api_key: Option<String>,

    /// Chat-completion API base URL
    #[serde(default = "defaults::chat_api_base")]
    pub api_base_url: String,

    #[serde(default = "defaults::chat_model")]
    pub model: String,

    #[serde(default = "defaults::chat_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "defaults::chat_temperature")]
    pub temperature: f32,

    /// Conversation turns kept for context
    #[serde(default = "defaults::chat_max_history")]
    pub max_history: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: defaults::chat_api_base(),
            model: defaults::chat_model(),
            max_tokens: defaults::chat_max_tokens(),
            temperature: defaults::chat_temperature(),
            max_history: defaults::chat_max_history(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// env_logger filter used when neither `--verbose` nor `RUST_LOG` is set
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    // API defaults
    pub fn base_url() -> String {
        "http://localhost:8000".into()
    }
    pub fn static_base() -> String {
        "public".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; Pathwise/0.1)".into()
    }
    pub fn timeout_ms() -> u64 {
        5000
    }

    // Loader defaults
    pub fn empty_remote_is_failure() -> bool {
        true
    }

    // Auth defaults
    pub fn session_file() -> String {
        "storage/session.json".into()
    }

    // Chat defaults
    pub fn chat_api_base() -> String {
        "https://api.openai.com".into()
    }
    pub fn chat_model() -> String {
        "gpt-4o".into()
    }
    pub fn chat_max_tokens() -> u32 {
        2000
    }
    pub fn chat_temperature() -> f32 {
        0.7
    }
    pub fn chat_max_history() -> usize {
        10
    }

    // Logging defaults
    pub fn log_level() -> String {
        "warn".into()
    }
}
