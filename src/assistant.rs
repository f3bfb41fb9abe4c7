//! Passthrough to the chat-completion gateway, plus best-effort extraction
//! of a chart specification from free-text completion output.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::NovaError;

pub const ASSISTANT_SYSTEM_PROMPT: &str = "You are NOVA, a poetic AI BI assistant. Respond with \
    insights about data queries in a conversational, elegant way. Keep responses concise and \
    actionable.";

pub const ANALYST_SYSTEM_PROMPT: &str =
    "You are a data analyst providing clear, actionable insights.";

/// Stand-in reply when the gateway answers without any content.
pub const EMPTY_REPLY_FALLBACK: &str = "I apologize, but I couldn't process that query.";

#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_message: &str)
        -> Result<String, NovaError>;
}

/// Gateway speaking the OpenAI-style chat-completions wire shape.
pub struct HttpCompletionGateway {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl HttpCompletionGateway {
    pub fn new(endpoint: String, api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl CompletionGateway for HttpCompletionGateway {
    async fn complete(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<String, NovaError> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_message },
            ],
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(NovaError::GatewayError {
                message: format!("completion request failed with {}: {}", status, detail),
            });
        }

        let completion: ChatCompletionResponse = response.json().await?;
        Ok(reply_content(completion))
    }
}

/// Picks the first choice's message content, or the fixed apology when the
/// gateway answers without any.
fn reply_content(completion: ChatCompletionResponse) -> String {
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .unwrap_or_else(|| EMPTY_REPLY_FALLBACK.to_string())
}

/// Chart specification the assistant may embed in a reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartSpec {
    #[serde(rename = "type")]
    pub chart_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
}

/// Outcome of the best-effort chart extraction. The distinction between a
/// genuine parse and the hardcoded fallback is kept explicit rather than
/// swallowed.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartOutcome {
    Parsed(ChartSpec),
    Fallback(ChartSpec),
    Rejected,
}

pub fn default_chart() -> ChartSpec {
    ChartSpec {
        chart_type: "bar".to_string(),
        title: Some("Overview".to_string()),
        x: None,
        y: None,
    }
}

/// Scans a completion reply for a chart specification.
///
/// A fenced ```json block wins over the first balanced `{...}` object found
/// in the text. A region that fails to deserialize into a [`ChartSpec`]
/// yields the fallback chart; a reply with no JSON-looking region at all is
/// rejected outright.
pub fn extract_chart_spec(reply: &str) -> ChartOutcome {
    let region = match fenced_json_block(reply).or_else(|| first_balanced_object(reply)) {
        Some(region) => region,
        None => return ChartOutcome::Rejected,
    };

    match serde_json::from_str::<ChartSpec>(region) {
        Ok(spec) if !spec.chart_type.trim().is_empty() => ChartOutcome::Parsed(spec),
        _ => ChartOutcome::Fallback(default_chart()),
    }
}

fn fenced_json_block(text: &str) -> Option<&str> {
    let start = text.find("```json")? + "```json".len();
    let rest = &text[start..];
    let end = rest.find("```")?;
    Some(rest[..end].trim())
}

fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}
