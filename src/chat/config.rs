//! Configuration for the chat core.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default chat-completions endpoint (Groq, OpenAI-compatible).
pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "llama3-70b-8192";

/// Fixed sampling temperature used for every turn.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Behavioral preamble stored at index 0 of every conversation.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "a smart, coding-focused assistant. Be helpful, clear, and efficient.";

/// Default storage root for conversation records.
pub const DEFAULT_CHAT_DIR: &str = "chats";

/// Environment variable overriding the API key.
const API_KEY_ENV: &str = "CONRAD_API_KEY";
/// Environment variable overriding the endpoint URL.
const API_URL_ENV: &str = "CONRAD_API_URL";
/// Environment variable overriding the model identifier.
const MODEL_ENV: &str = "CONRAD_MODEL";
/// Environment variable overriding the storage root.
const CHAT_DIR_ENV: &str = "CONRAD_CHAT_DIR";

/// Configuration for the store, the completion client, and the session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Chat-completions endpoint URL. Validated when the HTTP client is
    /// built, not here.
    pub api_url: String,
    /// Static bearer credential. Never validated locally; a bad or missing
    /// key surfaces as a response-status error.
    pub api_key: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Sampling temperature sent with every request.
    pub temperature: f32,
    /// System message content for new conversations.
    pub system_prompt: String,
    /// Storage root for conversation records, created on first use.
    pub storage_dir: PathBuf,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            storage_dir: PathBuf::from(DEFAULT_CHAT_DIR),
        }
    }
}

impl ChatConfig {
    /// Create a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Layer environment overrides (`CONRAD_*`) over the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Layer overrides from a variable lookup over the defaults; the seam
    /// behind [`ChatConfig::from_env`].
    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(key) = var(API_KEY_ENV) {
            config.api_key = key;
        }
        if let Some(url) = var(API_URL_ENV) {
            config.api_url = url;
        }
        if let Some(model) = var(MODEL_ENV) {
            config.model = model;
        }
        if let Some(dir) = var(CHAT_DIR_ENV) {
            config.storage_dir = PathBuf::from(dir);
        }
        config
    }

    /// Set the endpoint URL.
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Set the bearer credential.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = key.into();
        self
    }

    /// Set the model identifier.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the sampling temperature.
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the system message content.
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Set the storage root for conversation records.
    #[must_use]
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = dir.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ChatConfig::default();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert!((config.temperature - DEFAULT_TEMPERATURE).abs() < f32::EPSILON);
        assert_eq!(config.storage_dir, PathBuf::from("chats"));
        assert!(config.api_key.is_empty());
    }

    #[test]
    fn test_config_builder() {
        let config = ChatConfig::new()
            .with_api_url("http://127.0.0.1:9/v1/chat/completions")
            .with_api_key("test-key")
            .with_model("test-model")
            .with_temperature(0.2)
            .with_storage_dir("/tmp/conrad-test");

        assert_eq!(config.api_url, "http://127.0.0.1:9/v1/chat/completions");
        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.model, "test-model");
        assert!((config.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.storage_dir, PathBuf::from("/tmp/conrad-test"));
    }

    #[test]
    fn test_env_overrides_layer_over_defaults() {
        let config = ChatConfig::from_vars(|name| match name {
            "CONRAD_API_KEY" => Some("secret".to_string()),
            "CONRAD_MODEL" => Some("other-model".to_string()),
            _ => None,
        });

        assert_eq!(config.api_key, "secret");
        assert_eq!(config.model, "other-model");
        // Unset variables keep their defaults.
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.storage_dir, PathBuf::from(DEFAULT_CHAT_DIR));
    }

    #[test]
    fn test_env_overrides_url_and_storage_dir() {
        let config = ChatConfig::from_vars(|name| match name {
            "CONRAD_API_URL" => Some("http://127.0.0.1:8080/v1/chat/completions".to_string()),
            "CONRAD_CHAT_DIR" => Some("/tmp/conrad-chats".to_string()),
            _ => None,
        });

        assert_eq!(config.api_url, "http://127.0.0.1:8080/v1/chat/completions");
        assert_eq!(config.storage_dir, PathBuf::from("/tmp/conrad-chats"));
        assert_eq!(config.model, DEFAULT_MODEL);
        assert!(config.api_key.is_empty());
    }

    #[test]
    fn test_no_overrides_equals_defaults() {
        let config = ChatConfig::from_vars(|_| None);
        assert_eq!(config.api_url, ChatConfig::default().api_url);
        assert_eq!(config.model, ChatConfig::default().model);
        assert_eq!(config.storage_dir, ChatConfig::default().storage_dir);
    }
}
