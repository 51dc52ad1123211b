use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::llm::{self, Provider};

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    ReadFile { path: PathBuf, source: std::io::Error },
    /// Failed to parse JSON.
    ParseJson { path: PathBuf, source: serde_json::Error },
    /// Validation error.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFile { path, source } => {
                write!(f, "failed to read config file '{}': {}", path.display(), source)
            }
            Self::ParseJson { path, source } => {
                write!(f, "failed to parse config file '{}': {}", path.display(), source)
            }
            Self::Validation(msg) => write!(f, "config validation error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::ParseJson { source, .. } => Some(source),
            Self::Validation(_) => None,
        }
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    telegram_bot_token: String,
    /// Which backend answers: "openai" (default) or "anthropic".
    model: Option<String>,
    openai_api_key: Option<String>,
    anthropic_api_key: Option<String>,
    /// Persona display name. Defaults to "arthur".
    bot_name: Option<String>,
    /// Serve Telegram webhooks instead of long polling.
    webhook: Option<WebhookFile>,
    /// Directory for log files. Defaults to current directory.
    data_dir: Option<String>,
}

#[derive(Deserialize)]
struct WebhookFile {
    /// Public URL Telegram delivers updates to.
    url: String,
    #[serde(default = "default_webhook_port")]
    port: u16,
}

fn default_webhook_port() -> u16 {
    8443
}

pub struct WebhookConfig {
    pub url: reqwest::Url,
    pub port: u16,
}

pub struct Config {
    pub telegram_bot_token: String,
    pub provider: Provider,
    /// Present only if non-blank in the file. A missing key for the selected
    /// provider is not a load error; the generator answers with its fixed
    /// configuration-error fallback instead.
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub bot_name: String,
    pub webhook: Option<WebhookConfig>,
    /// Directory for log files.
    pub data_dir: PathBuf,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config_path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| ConfigError::ReadFile { path: config_path.clone(), source: e })?;
        let file: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseJson { path: config_path.clone(), source: e })?;

        if file.telegram_bot_token.is_empty() {
            return Err(ConfigError::Validation("telegram_bot_token is required".into()));
        }
        // Telegram tokens are formatted as {bot_id}:{secret} where bot_id is numeric
        let token_parts: Vec<&str> = file.telegram_bot_token.split(':').collect();
        if token_parts.len() != 2 || token_parts[0].parse::<u64>().is_err() || token_parts[1].is_empty() {
            return Err(ConfigError::Validation(
                "telegram_bot_token appears invalid (expected format: 123456789:ABCdefGHI...)".into()
            ));
        }

        let provider = file.model.as_deref().map(Provider::parse).unwrap_or_default();

        let webhook = file
            .webhook
            .map(|w| {
                let url = w.url.parse::<reqwest::Url>().map_err(|e| {
                    ConfigError::Validation(format!("invalid webhook url '{}': {}", w.url, e))
                })?;
                Ok(WebhookConfig { url, port: w.port })
            })
            .transpose()?;

        let data_dir = file
            .data_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            telegram_bot_token: file.telegram_bot_token,
            provider,
            openai_api_key: non_blank(file.openai_api_key),
            anthropic_api_key: non_blank(file.anthropic_api_key),
            bot_name: non_blank(file.bot_name)
                .unwrap_or_else(|| llm::DEFAULT_BOT_NAME.to_string()),
            webhook,
            data_dir,
        })
    }
}

/// Blank secrets behave as if they were never set.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
