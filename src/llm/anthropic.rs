//! Anthropic Messages API client.

use serde::{Deserialize, Serialize};

use super::{LlmError, Provider};

const API_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const MODEL: &str = "claude-sonnet-4-20250514";

pub struct Client {
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'static str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<ApiMessage<'a>>,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

// Tool-use and thinking blocks deserialize into Other and are skipped.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

impl ContentBlock {
    fn into_text(self) -> Option<String> {
        match self {
            Self::Text { text } => Some(text),
            Self::Other => None,
        }
    }
}

impl Client {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, API_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url,
            http: reqwest::Client::new(),
        }
    }

    /// Single-turn completion: the persona goes in the `system` field, the
    /// utterance is the sole `user` message. Returns the first text-typed
    /// content block.
    pub async fn complete(
        &self,
        system: &str,
        text: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, LlmError> {
        let request = ApiRequest {
            model: MODEL,
            max_tokens,
            temperature,
            system,
            messages: vec![ApiMessage {
                role: "user",
                content: text,
            }],
        };

        let response = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("{status}: {body}")));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        api_response
            .content
            .into_iter()
            .find_map(ContentBlock::into_text)
            .ok_or(LlmError::Empty(Provider::Anthropic))
    }
}
