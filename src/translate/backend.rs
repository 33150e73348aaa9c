//! OpenAI-compatible chat-completions client.
//! One attempt per query: the next keystroke event supersedes a failed
//! request, so there is no retry ladder here.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{BackendError, TranslationBackend};
use crate::config::Settings;

/// Timeout for translation calls.
pub const TRANSLATE_TIMEOUT: Duration = Duration::from_secs(30);
/// Timeout for auxiliary calls (model listing, connection probe).
pub const AUXILIARY_TIMEOUT: Duration = Duration::from_secs(15);

const USER_AGENT: &str = concat!("colloq/", env!("CARGO_PKG_VERSION"));
const TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: u32 = 1000;
/// Token cap for the connection probe; the reply content is discarded.
const PROBE_MAX_TOKENS: u32 = 5;

/// Chat-completions HTTP client with connection pooling.
pub struct ChatClient {
    http: reqwest::Client,
}

impl ChatClient {
    pub fn new() -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        Ok(Self { http })
    }

    /// List model ids available from the backend, sorted.
    pub async fn list_models(&self, settings: &Settings) -> Result<Vec<String>, BackendError> {
        let url = models_endpoint(&settings.api_url);
        let response = self
            .http
            .get(&url)
            .timeout(AUXILIARY_TIMEOUT)
            .bearer_auth(&settings.api_key)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(protocol_error(status, response.text().await.ok()));
        }

        let parsed: ModelsResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Shape(format!("models response: {e}")))?;

        let mut ids: Vec<String> = parsed.data.into_iter().map(|m| m.id).collect();
        ids.sort();
        Ok(ids)
    }

    /// Minimal chat call validating URL, credential and model together.
    pub async fn probe(&self, settings: &Settings) -> Result<(), BackendError> {
        let body = serde_json::json!({
            "model": settings.model,
            "messages": [
                {"role": "user", "content": "Hello"}
            ],
            "max_tokens": PROBE_MAX_TOKENS
        });

        let response = self
            .http
            .post(&settings.api_url)
            .timeout(AUXILIARY_TIMEOUT)
            .bearer_auth(&settings.api_key)
            .json(&body)
            .send()
            .await
            .map_err(map_send_error)?;

        read_content(response).await.map(|_| ())
    }
}

#[async_trait]
impl TranslationBackend for ChatClient {
    async fn translate(&self, text: &str, settings: &Settings) -> Result<String, BackendError> {
        let body = serde_json::json!({
            "model": settings.model,
            "messages": [
                {"role": "system", "content": settings.prompt},
                {"role": "user", "content": text}
            ],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS
        });

        let response = self
            .http
            .post(&settings.api_url)
            .timeout(TRANSLATE_TIMEOUT)
            .bearer_auth(&settings.api_key)
            .json(&body)
            .send()
            .await
            .map_err(map_send_error)?;

        read_content(response).await
    }
}

/// Extract `choices[0].message.content` from a chat-completions response,
/// classifying non-success statuses and missing fields along the way.
async fn read_content(response: reqwest::Response) -> Result<String, BackendError> {
    let status = response.status();
    if !status.is_success() {
        return Err(protocol_error(status, response.text().await.ok()));
    }

    let parsed: ChatResponse = response
        .json()
        .await
        .map_err(|e| BackendError::Shape(format!("chat response: {e}")))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| {
            BackendError::Shape("response missing choices[0].message.content".to_string())
        })
}

fn map_send_error(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::Transport("request timed out".to_string())
    } else {
        BackendError::Transport(e.to_string())
    }
}

/// Build the protocol error for a non-success status, preferring the
/// backend's structured `error.message` over the raw status line.
fn protocol_error(status: reqwest::StatusCode, body: Option<String>) -> BackendError {
    let detail = body
        .as_deref()
        .and_then(|b| serde_json::from_str::<ErrorResponse>(b).ok())
        .map(|e| e.error.message)
        .unwrap_or_else(|| status.to_string());

    BackendError::Protocol {
        status: status.as_u16(),
        detail,
    }
}

/// Derive the models listing endpoint from the configured completions URL.
pub fn models_endpoint(api_url: &str) -> String {
    if let Some(base) = api_url.strip_suffix("/chat/completions") {
        format!("{base}/models")
    } else if let Some(base) = api_url.strip_suffix("/completions") {
        format!("{base}/models")
    } else {
        format!("{}/models", api_url.trim_end_matches('/'))
    }
}

// --- Response types ---

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::FailureKind;

    #[test]
    fn models_endpoint_strips_completions_suffix() {
        assert_eq!(
            models_endpoint("https://api.openai.com/v1/chat/completions"),
            "https://api.openai.com/v1/models"
        );
        assert_eq!(
            models_endpoint("https://api.example.com/v1/completions"),
            "https://api.example.com/v1/models"
        );
        assert_eq!(
            models_endpoint("https://api.example.com/v1/"),
            "https://api.example.com/v1/models"
        );
    }

    #[test]
    fn protocol_error_prefers_structured_detail() {
        let err = protocol_error(
            reqwest::StatusCode::UNAUTHORIZED,
            Some(r#"{"error": {"message": "Incorrect API key provided"}}"#.to_string()),
        );
        match err {
            BackendError::Protocol { status, detail } => {
                assert_eq!(status, 401);
                assert_eq!(detail, "Incorrect API key provided");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            protocol_error(reqwest::StatusCode::UNAUTHORIZED, None).kind(),
            FailureKind::Protocol
        );
    }

    #[test]
    fn protocol_error_falls_back_to_status_line() {
        let err = protocol_error(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            Some("<html>gateway</html>".to_string()),
        );
        match err {
            BackendError::Protocol { status, detail } => {
                assert_eq!(status, 500);
                assert!(detail.contains("500"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
