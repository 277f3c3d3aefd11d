//! LLM Client (C5): a stateless, non-blocking client for a
//! chat-completions endpoint (§4.5).
//!
//! The client holds no per-request state and performs no retries —
//! retry policy, if ever added, belongs to the Job Scheduler so its
//! semantics stay predictable (§4.5). A non-2xx response or a malformed
//! body is mapped to [`docforge_core::Error::Upstream`] /
//! [`docforge_core::Error::Network`] with enough detail for the REST
//! surface to return a 502.

use crate::types::{
    ChatMessage, ChatRequest, ChatResponse, CollectionFile, CompletionRequest, CompletionResult,
};
use docforge_core::{utils::safe_truncate, Error, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Non-blocking client for the chat-completions contract (§6.2).
#[derive(Debug, Clone)]
pub struct LlmClient {
    http: Client,
}

impl LlmClient {
    /// Builds a client with `timeout` as the per-request deadline
    /// (default 300s per §4.5, configurable via `Config::llm_timeout_s`).
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::Network)?;
        Ok(Self { http })
    }

    /// Sends one completion request and extracts generated text and
    /// token usage (§4.5).
    pub async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResult> {
        let url = format!(
            "{}/api/chat/completions",
            request.base_url.trim_end_matches('/')
        );

        let body = ChatRequest {
            model: request.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: request.prompt.clone(),
            }],
            stream: false,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            files: request
                .collection_ids
                .iter()
                .map(|id| CollectionFile {
                    kind: "collection",
                    id: id.clone(),
                })
                .collect(),
        };

        debug!(
            model = %request.model,
            prompt_bytes = request.prompt.len(),
            collections = request.collection_ids.len(),
            "sending completion request"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&request.api_key)
            .json(&body)
            .send()
            .await
            .map_err(Error::Network)?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "LLM endpoint returned an error");
            return Err(Error::Upstream {
                status: status.as_u16(),
                body: safe_truncate(&body_text, 2000).to_string(),
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(Error::Network)?;
        Ok(match parsed {
            ChatResponse::Choices { choices, usage } => CompletionResult {
                content: choices
                    .into_iter()
                    .next()
                    .map(|c| c.message.content)
                    .unwrap_or_default(),
                tokens_used: usage.unwrap_or_default().total_tokens,
            },
            ChatResponse::Fallback { response } => CompletionResult {
                content: response,
                tokens_used: 0,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(base_url: String) -> CompletionRequest {
        CompletionRequest {
            base_url,
            api_key: "sk-test".to_string(),
            model: "m".to_string(),
            prompt: "hello".to_string(),
            temperature: 0.7,
            max_tokens: 512,
            collection_ids: Vec::new(),
        }
    }

    #[tokio::test]
    async fn extracts_content_and_usage_from_choices_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "Hello **world**"}}],
                "usage": {"total_tokens": 42}
            })))
            .mount(&server)
            .await;

        let client = LlmClient::new(Duration::from_secs(5)).unwrap();
        let result = client.complete(&request(server.uri())).await.unwrap();
        assert_eq!(result.content, "Hello **world**");
        assert_eq!(result.tokens_used, 42);
    }

    #[tokio::test]
    async fn falls_back_to_response_field_when_no_choices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"response": "fallback text"})),
            )
            .mount(&server)
            .await;

        let client = LlmClient::new(Duration::from_secs(5)).unwrap();
        let result = client.complete(&request(server.uri())).await.unwrap();
        assert_eq!(result.content, "fallback text");
        assert_eq!(result.tokens_used, 0);
    }

    #[tokio::test]
    async fn non_2xx_becomes_upstream_error_with_status_preserved() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat/completions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let client = LlmClient::new(Duration::from_secs(5)).unwrap();
        let err = client.complete(&request(server.uri())).await.unwrap_err();
        match err {
            Error::Upstream { status, body } => {
                assert_eq!(status, 503);
                assert!(body.contains("overloaded"));
            }
            other => panic!("expected Upstream error, got {other:?}"),
        }
    }
}
