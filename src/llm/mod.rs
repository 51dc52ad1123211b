//! Reply generation - relays one user utterance to the configured LLM backend.
//!
//! The two providers take incompatible request shapes (OpenAI inlines a
//! role-tagged turn list, Anthropic takes a separate `system` field), so both
//! sit behind narrow clients and the transports only ever see plain strings.

pub mod anthropic;
pub mod openai;


use std::fmt;

use tracing::warn;

use crate::config::Config;

/// Which backend answers for the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    #[default]
    OpenAi,
    Anthropic,
}

impl Provider {
    /// Parse the `model` config value. Anything that isn't "anthropic" is
    /// treated as OpenAI, the default path.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "anthropic" => Self::Anthropic,
            _ => Self::OpenAi,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenAi => write!(f, "openai"),
            Self::Anthropic => write!(f, "anthropic"),
        }
    }
}

/// Replies stay short to match the persona ("sends very short messages").
const MAX_REPLY_TOKENS: u32 = 100;
const TEMPERATURE: f32 = 0.7;

pub const DEFAULT_BOT_NAME: &str = "arthur";

const CONFIG_FALLBACK: &str = "sorry, my brain isn't set up right now";
const GENERIC_FALLBACK: &str = "sorry, something went wrong in my brain";
const OPENAI_EMPTY_FALLBACK: &str = "sorry, got no response from gpt";
const ANTHROPIC_EMPTY_FALLBACK: &str = "hmm, something went wrong with claude";

/// The fixed system instruction sent with every request.
pub fn persona_prompt(bot_name: &str) -> String {
    format!(
        "you are {bot_name}, a friend who always talks in all lowercase and sends very short messages."
    )
}

#[derive(Debug)]
pub enum LlmError {
    /// The selected provider has no API key configured.
    MissingKey(Provider),
    /// The request never got a response (connect failure, timeout).
    Http(String),
    /// The provider answered with a non-success status.
    Api(String),
    /// The response body could not be decoded.
    Parse(String),
    /// The provider answered but without any usable text.
    Empty(Provider),
}

impl LlmError {
    /// The reply the user gets when this failure occurs. Total, so the bot
    /// always has something to send back.
    pub fn fallback(&self) -> &'static str {
        match self {
            Self::MissingKey(_) => CONFIG_FALLBACK,
            Self::Empty(Provider::OpenAi) => OPENAI_EMPTY_FALLBACK,
            Self::Empty(Provider::Anthropic) => ANTHROPIC_EMPTY_FALLBACK,
            Self::Http(_) | Self::Api(_) | Self::Parse(_) => GENERIC_FALLBACK,
        }
    }
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingKey(provider) => write!(f, "no API key configured for {provider}"),
            Self::Http(e) => write!(f, "HTTP error: {e}"),
            Self::Api(e) => write!(f, "API error: {e}"),
            Self::Parse(e) => write!(f, "Parse error: {e}"),
            Self::Empty(provider) => write!(f, "empty response from {provider}"),
        }
    }
}

impl std::error::Error for LlmError {}

/// Turns one utterance into one reply. Holds no mutable state; concurrent
/// messages share only the read-only config and the HTTP connection pools.
pub struct ReplyGenerator {
    provider: Provider,
    system_prompt: String,
    openai: Option<openai::Client>,
    anthropic: Option<anthropic::Client>,
}

impl ReplyGenerator {
    pub fn new(config: &Config) -> Self {
        Self {
            provider: config.provider,
            system_prompt: persona_prompt(&config.bot_name),
            openai: config.openai_api_key.clone().map(openai::Client::new),
            anthropic: config.anthropic_api_key.clone().map(anthropic::Client::new),
        }
    }

    /// Generate a reply for one utterance. Never fails: every error path
    /// resolves to its fixed fallback string here, at the boundary.
    pub async fn generate(&self, text: &str) -> String {
        match self.complete(text).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Reply generation failed: {e}");
                e.fallback().to_string()
            }
        }
    }

    async fn complete(&self, text: &str) -> Result<String, LlmError> {
        let reply = match self.provider {
            Provider::OpenAi => {
                let client = self
                    .openai
                    .as_ref()
                    .ok_or(LlmError::MissingKey(Provider::OpenAi))?;
                client
                    .complete(&self.system_prompt, text, MAX_REPLY_TOKENS, TEMPERATURE)
                    .await?
            }
            Provider::Anthropic => {
                let client = self
                    .anthropic
                    .as_ref()
                    .ok_or(LlmError::MissingKey(Provider::Anthropic))?;
                client
                    .complete(&self.system_prompt, text, MAX_REPLY_TOKENS, TEMPERATURE)
                    .await?
            }
        };

        // Whitespace-only output counts as no response at all.
        let reply = reply.trim();
        if reply.is_empty() {
            return Err(LlmError::Empty(self.provider));
        }
        Ok(reply.to_string())
    }
}
