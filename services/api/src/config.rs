use shield_advisor_core::{Locale, gemini};
use std::{net::SocketAddr, time::Duration};
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Defines the supported hosted-model providers for the advisor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    OpenAI,
}

impl Provider {
    pub fn default_api_base(&self) -> &'static str {
        match self {
            Provider::Gemini => gemini::DEFAULT_GEMINI_API_BASE,
            Provider::OpenAI => "https://api.openai.com/v1",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Gemini => gemini::DEFAULT_GEMINI_MODEL,
            Provider::OpenAI => "gpt-4o",
        }
    }

    fn api_key_var(&self) -> &'static str {
        match self {
            Provider::Gemini => "GEMINI_API_KEY",
            Provider::OpenAI => "OPENAI_API_KEY",
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub provider: Provider,
    /// Initial access credential. `None` starts every page session in the
    /// reconnect-required state until one is supplied.
    pub api_key: Option<String>,
    pub api_base: String,
    pub chat_model: String,
    pub temperature: f32,
    pub default_locale: Locale,
    /// Page sessions untouched for this long are evicted.
    pub session_idle_ttl: Duration,
    pub log_level: Level,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .field("chat_model", &self.chat_model)
            .field("temperature", &self.temperature)
            .field("default_locale", &self.default_locale)
            .field("session_idle_ttl", &self.session_idle_ttl)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let provider_str = std::env::var("LLM_PROVIDER").unwrap_or_else(|_| "gemini".to_string());
        let provider = match provider_str.to_lowercase().as_str() {
            "gemini" => Provider::Gemini,
            "openai" => Provider::OpenAI,
            other => {
                return Err(ConfigError::InvalidValue(
                    "LLM_PROVIDER".to_string(),
                    format!("'{}' is not a supported provider", other),
                ));
            }
        };

        let api_key = std::env::var(provider.api_key_var())
            .ok()
            .filter(|key| !key.trim().is_empty());

        let api_base = std::env::var("LLM_API_BASE")
            .unwrap_or_else(|_| provider.default_api_base().to_string());

        let chat_model =
            std::env::var("CHAT_MODEL").unwrap_or_else(|_| provider.default_model().to_string());

        let temperature = match std::env::var("CHAT_TEMPERATURE") {
            Ok(raw) => raw
                .parse::<f32>()
                .ok()
                .filter(|t| (0.0..=2.0).contains(t))
                .ok_or_else(|| {
                    ConfigError::InvalidValue(
                        "CHAT_TEMPERATURE".to_string(),
                        format!("'{}' is not a temperature between 0 and 2", raw),
                    )
                })?,
            Err(_) => 0.7,
        };

        let default_locale = match std::env::var("DEFAULT_LOCALE") {
            Ok(raw) => raw.parse::<Locale>().map_err(|e| {
                ConfigError::InvalidValue("DEFAULT_LOCALE".to_string(), e.to_string())
            })?,
            Err(_) => Locale::default(),
        };

        let session_idle_ttl = match std::env::var("SESSION_IDLE_TTL_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or_else(|| {
                    ConfigError::InvalidValue(
                        "SESSION_IDLE_TTL_SECS".to_string(),
                        format!("'{}' is not a positive number of seconds", raw),
                    )
                })?,
            Err(_) => Duration::from_secs(1800),
        };

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            bind_address,
            provider,
            api_key,
            api_base,
            chat_model,
            temperature,
            default_locale,
            session_idle_ttl,
            log_level,
        })
    }
}
