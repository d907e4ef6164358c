//! LLM gateway — the single point of entry for completion-endpoint calls.
//!
//! ARCHITECTURAL RULE: no other module may talk to the completion API
//! directly. All LLM traffic goes through `CompletionGateway`, which
//! `AppState` carries as an `Arc<dyn CompletionGateway>` so tests can swap
//! in a scripted backend.
//!
//! The wire format is the OpenAI-compatible chat-completions shape. Calls
//! are never retried; a failed call is terminal for the current request.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama3-70b-8192";
const REQUEST_TIMEOUT_SECS: u64 = 45;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("completion response carried no choices")]
    EmptyChoices,

    /// Completion text could not be decoded as the expected JSON. Carries
    /// the raw text for diagnostics.
    #[error("completion text is not valid JSON: {message}")]
    Parse { message: String, raw: String },
}

/// One role-tagged message in a completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Sampling parameters sent with every completion request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SamplingConfig {
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1024,
            top_p: 1.0,
        }
    }
}

impl SamplingConfig {
    /// Near-deterministic settings for structured extraction.
    pub fn extraction() -> Self {
        Self {
            temperature: 0.1,
            max_tokens: 1000,
            top_p: 1.0,
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpstreamError {
    error: UpstreamErrorBody,
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorBody {
    message: String,
}

#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// Sends one completion request and returns the first choice's text.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        sampling: &SamplingConfig,
    ) -> Result<String, LlmError>;
}

/// HTTP gateway for the configured completion endpoint.
#[derive(Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl LlmClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionGateway for LlmClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        sampling: &SamplingConfig,
    ) -> Result<String, LlmError> {
        let request_body = CompletionRequest {
            model: &self.model,
            messages,
            temperature: sampling.temperature,
            max_tokens: sampling.max_tokens,
            top_p: sampling.top_p,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Try to parse the structured error message
            let message = serde_json::from_str::<UpstreamError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: CompletionResponse = response.json().await?;
        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(LlmError::EmptyChoices)?;

        debug!("completion succeeded ({} chars)", text.len());
        Ok(text)
    }
}

/// Extracts a JSON object from completion text that may wrap it in prose or
/// markdown fencing: parse the span from the first `{` to the last `}`,
/// then fall back to the whole text. The raw text rides along on failure.
pub fn extract_json_object(text: &str) -> Result<Value, LlmError> {
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str(&text[start..=end]) {
                return Ok(value);
            }
        }
    }
    serde_json::from_str(text.trim()).map_err(|e| LlmError::Parse {
        message: e.to_string(),
        raw: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_json_object_from_prose_wrapped_text() {
        let text = r#"Here is the data you asked for: {"budget": 20000} hope it helps!"#;
        let expected: Value = serde_json::from_str(r#"{"budget": 20000}"#).unwrap();
        assert_eq!(extract_json_object(text).unwrap(), expected);
    }

    #[test]
    fn test_extract_json_object_from_fenced_text() {
        let text = "```json\n{\"preferred_locations\": [\"Canada\"]}\n```";
        let value = extract_json_object(text).unwrap();
        assert_eq!(value["preferred_locations"][0], "Canada");
    }

    #[test]
    fn test_extract_json_object_bare_json() {
        let value = extract_json_object(r#"{"a": 1}"#).unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_extract_json_object_no_brace_is_parse_error() {
        let err = extract_json_object("no structured data here").unwrap_err();
        match err {
            LlmError::Parse { raw, .. } => assert_eq!(raw, "no structured data here"),
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn test_extract_json_object_nested_braces() {
        let text = r#"Result: {"outer": {"inner": 2}} done."#;
        let value = extract_json_object(text).unwrap();
        assert_eq!(value["outer"]["inner"], 2);
    }

    #[test]
    fn test_chat_message_constructors_set_roles() {
        assert_eq!(ChatMessage::system("s").role, "system");
        assert_eq!(ChatMessage::user("u").role, "user");
        assert_eq!(ChatMessage::assistant("a").role, "assistant");
    }

    #[test]
    fn test_completion_request_serializes_wire_shape() {
        let messages = vec![ChatMessage::user("hi")];
        let sampling = SamplingConfig::default();
        let request = CompletionRequest {
            model: "llama3-70b-8192",
            messages: &messages,
            temperature: sampling.temperature,
            max_tokens: sampling.max_tokens,
            top_p: sampling.top_p,
            stream: false,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "llama3-70b-8192");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["stream"], false);
        assert!(value["max_tokens"].is_u64());
    }

    #[test]
    fn test_completion_response_deserializes_choices() {
        let json = r#"{"choices": [{"message": {"content": "hello"}}]}"#;
        let response: CompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            response.choices[0].message.content.as_deref(),
            Some("hello")
        );
    }

    #[test]
    fn test_upstream_error_body_parses() {
        let json = r#"{"error": {"message": "model overloaded"}}"#;
        let err: UpstreamError = serde_json::from_str(json).unwrap();
        assert_eq!(err.error.message, "model overloaded");
    }

    #[test]
    fn test_extraction_sampling_is_near_deterministic() {
        let sampling = SamplingConfig::extraction();
        assert!(sampling.temperature < 0.2);
    }
}
