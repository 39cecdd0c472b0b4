//! Claude API client for single-turn completions.

use std::sync::Arc;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::instrument;

use crate::config::ClaudeConfig;

use super::error::ClaudeError;
use super::types::{ChatRequest, ChatResponse, Message};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Claude API client.
///
/// Cheap to clone.
#[derive(Clone)]
pub struct ClaudeClient {
    inner: Arc<ClaudeClientInner>,
}

struct ClaudeClientInner {
    client: reqwest::Client,
    model: String,
    max_tokens: u32,
    base_url: String,
}

impl ClaudeClient {
    /// Create a client for the public Anthropic API.
    ///
    /// # Errors
    ///
    /// Returns `ClaudeError::InvalidApiKey` if the key cannot be sent as a
    /// header, or `ClaudeError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ClaudeConfig) -> Result<Self, ClaudeError> {
        Self::with_base_url(config, ANTHROPIC_API_URL)
    }

    /// Create a client against another origin (tests, proxies).
    ///
    /// # Errors
    ///
    /// See [`ClaudeClient::new`].
    pub fn with_base_url(config: &ClaudeConfig, base_url: &str) -> Result<Self, ClaudeError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(config.api_key.expose_secret())
                .map_err(|_| ClaudeError::InvalidApiKey)?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(ClaudeClientInner {
                client,
                model: config.model.clone(),
                max_tokens: config.max_tokens,
                base_url: base_url.trim_end_matches('/').to_string(),
            }),
        })
    }

    /// Model ID sent with every request.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.inner.model
    }

    /// Send messages and wait for the complete response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API answers an error.
    #[instrument(skip(self, messages), fields(model = %self.inner.model))]
    pub async fn chat(&self, messages: Vec<Message>) -> Result<ChatResponse, ClaudeError> {
        let request = ChatRequest {
            model: self.inner.model.clone(),
            max_tokens: self.inner.max_tokens,
            messages,
        };

        let response = self
            .inner
            .client
            .post(format!("{}/v1/messages", self.inner.base_url))
            .json(&request)
            .send()
            .await?;

        let response = handle_response(response).await?;
        tracing::debug!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            stop_reason = ?response.stop_reason,
            "Claude response received"
        );
        Ok(response)
    }
}

async fn handle_response(response: reqwest::Response) -> Result<ChatResponse, ClaudeError> {
    let status = response.status();
    if !status.is_success() {
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        let body = response.text().await?;
        return Err(ClaudeError::from_status(
            status,
            retry_after.as_deref(),
            &body,
        ));
    }

    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(ClaudeError::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claude::{ContentBlock, ImageSource};
    use secrecy::SecretString;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config() -> ClaudeConfig {
        ClaudeConfig {
            api_key: SecretString::from("sk-ant-test"),
            model: "claude-test".to_string(),
            max_tokens: 1234,
        }
    }

    fn messages() -> Vec<Message> {
        vec![Message::user(vec![
            ContentBlock::Image {
                source: ImageSource::from_base64("data:image/png;base64,AAAA"),
            },
            ContentBlock::Text {
                text: "make a page".to_string(),
            },
        ])]
    }

    #[tokio::test]
    async fn test_chat_sends_headers_and_budget() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "sk-ant-test"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .and(body_partial_json(json!({
                "model": "claude-test",
                "max_tokens": 1234,
                "messages": [{"role": "user", "content": [
                    {"type": "image", "source": {"media_type": "image/png", "data": "AAAA"}}
                ]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "msg_1",
                "model": "claude-test",
                "stop_reason": "end_turn",
                "content": [{"type": "text", "text": "<html></html>"}],
                "usage": {"input_tokens": 1, "output_tokens": 2}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ClaudeClient::with_base_url(&config(), &server.uri()).expect("client");
        let response = client.chat(messages()).await.expect("response");
        assert_eq!(response.text(), "<html></html>");
    }

    #[tokio::test]
    async fn test_chat_maps_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "type": "error",
                "error": {"type": "invalid_request_error", "message": "Image too large"}
            })))
            .mount(&server)
            .await;

        let client = ClaudeClient::with_base_url(&config(), &server.uri()).expect("client");
        let err = client.chat(messages()).await.expect_err("api error");
        assert!(matches!(
            err,
            ClaudeError::Rejected { status: 400, ref message } if message == "Image too large"
        ));
    }

    #[tokio::test]
    async fn test_chat_maps_rate_limit_and_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = ClaudeClient::with_base_url(&config(), &server.uri()).expect("client");
        assert!(matches!(
            client.chat(messages()).await,
            Err(ClaudeError::RateLimited(7))
        ));
        assert!(matches!(
            client.chat(messages()).await,
            Err(ClaudeError::Unauthorized)
        ));
    }

    #[test]
    fn test_invalid_api_key_rejected() {
        let config = ClaudeConfig {
            api_key: SecretString::from("bad\nkey"),
            ..config()
        };
        assert!(matches!(
            ClaudeClient::new(&config),
            Err(ClaudeError::InvalidApiKey)
        ));
    }

    #[test]
    fn test_claude_client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<ClaudeClient>();
    }
}
