//! Chat-completions endpoint client
//!
//! Non-streaming POST with a bearer credential, body `{model, messages,
//! max_tokens}`. Text-only messages serialize their content as a plain
//! string; messages carrying an image reference serialize as typed content
//! parts, text first and the image reference last.

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    types::{ChatMessage, Content},
};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Client for the completion endpoint
pub struct CompletionClient {
    client: reqwest::Client,
    base_url: String,
}

impl Default for CompletionClient {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionClient {
    /// Create a client against the default endpoint
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create a client against a custom base URL
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Send the message sequence and return the assistant's text reply
    pub async fn complete(
        &self,
        api_key: &str,
        model: &str,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<String> {
        let request = build_request(model, messages, max_tokens);
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = parse_upstream_error(&body)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());
            return Err(Error::upstream(status.as_u16(), message));
        }

        let body: WireResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::UnexpectedResponse("completion contained no choices".to_string()))
    }
}

/// Build the outbound request body
pub(crate) fn build_request(model: &str, messages: &[ChatMessage], max_tokens: u32) -> WireRequest {
    WireRequest {
        model: model.to_string(),
        messages: messages.iter().map(convert_message).collect(),
        max_tokens,
    }
}

fn convert_message(msg: &ChatMessage) -> WireMessage {
    let content = if msg.has_image() {
        WireContent::Parts(
            msg.content
                .iter()
                .map(|c| match c {
                    Content::Text { text } => WirePart::Text { text: text.clone() },
                    Content::Image { url } => WirePart::ImageUrl {
                        image_url: ImageUrl { url: url.clone() },
                    },
                })
                .collect(),
        )
    } else {
        WireContent::Text(msg.text())
    };

    WireMessage {
        role: msg.role.as_str().to_string(),
        content,
    }
}

/// Extract the upstream error message from an error body, if present
fn parse_upstream_error(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(|s| s.to_string())
}

#[derive(Debug, Serialize)]
pub(crate) struct WireRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    pub max_tokens: u32,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireMessage {
    pub role: String,
    pub content: WireContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum WireContent {
    Text(String),
    Parts(Vec<WirePart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum WirePart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
pub(crate) struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
}

#[derive(Debug, Deserialize)]
struct WireResponseMessage {
    content: Option<String>,
}
