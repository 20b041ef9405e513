//! OpenAI-compatible provider implementation.
//!
//! Works with: OpenAI, OpenRouter, Ollama, vLLM, llama.cpp server, and any
//! endpoint exposing `/chat/completions` and `/embeddings`.

use async_trait::async_trait;
use folio_core::error::ProviderError;
use folio_core::message::{Message, Role};
use folio_core::provider::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// An OpenAI-compatible LLM provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: build_client(DEFAULT_TIMEOUT),
        }
    }

    /// Replace the request timeout (default 120 s).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self
    }

    /// Create an OpenAI provider (convenience constructor).
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new("openai", "https://api.openai.com/v1", api_key)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Convert our Message types to OpenAI API format.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role().as_str().to_string(),
                content: Some(m.content().to_string()),
            })
            .collect()
    }

    /// Map non-success statuses onto `ProviderError`.
    async fn check_status(
        &self,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ProviderError> {
        let status = response.status().as_u16();

        if status == 429 {
            let retry_after_secs = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(5);
            return Err(ProviderError::RateLimited { retry_after_secs });
        }

        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if !response.status().is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!(provider = %self.name, status, body = %error_body, "Provider returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        Ok(response)
    }
}

fn build_client(timeout: Duration) -> reqwest::Client {
    match reqwest::Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "HTTP client setup failed, using defaults without a timeout");
            reqwest::Client::default()
        }
    }
}

/// Turn a parsed chat completion into our response type.
///
/// A missing or blank reply is an error, never an empty assistant turn.
fn into_provider_response(api_response: ApiResponse) -> Result<ProviderResponse, ProviderError> {
    let content = api_response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(ProviderError::EmptyResponse)?;

    let usage = api_response.usage.map(|u| Usage {
        prompt_tokens: u.prompt_tokens,
        completion_tokens: u.completion_tokens,
        total_tokens: u.total_tokens,
    });

    Ok(ProviderResponse {
        message: Message::new(Role::Assistant, content),
        usage,
        model: api_response.model,
    })
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "temperature": request.temperature,
            "stream": false,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        debug!(
            provider = %self.name,
            model = %request.model,
            messages = request.messages.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let response = self.check_status(response).await?;

        let api_response: ApiResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        into_provider_response(api_response)
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
        let url = format!("{}/embeddings", self.base_url);

        let body = serde_json::json!({
            "model": request.model,
            "input": request.inputs,
            "encoding_format": "float",
        });

        debug!(
            provider = %self.name,
            model = %request.model,
            count = request.inputs.len(),
            "Sending embedding request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let response = self.check_status(response).await?;

        let api_resp: EmbeddingApiResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse embedding response: {e}"),
            })?;

        let model = if api_resp.model.is_empty() {
            request.model
        } else {
            api_resp.model.clone()
        };

        Ok(EmbeddingResponse {
            embeddings: api_resp.into_ordered_embeddings(),
            model,
        })
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: String,
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

// --- Embedding API types ---

#[derive(Debug, Deserialize)]
struct EmbeddingApiResponse {
    data: Vec<EmbeddingData>,
    #[serde(default)]
    model: String,
}

impl EmbeddingApiResponse {
    /// Embeddings in input order; the API tags each with its input index.
    fn into_ordered_embeddings(self) -> Vec<Vec<f32>> {
        let mut data = self.data;
        data.sort_by_key(|d| d.index);
        data.into_iter().map(|d| d.embedding).collect()
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_constructor() {
        let provider = OpenAiCompatProvider::openai("sk-test");
        assert_eq!(provider.name(), "openai");
        assert!(provider.base_url().contains("api.openai.com"));
    }

    #[test]
    fn trailing_slash_trimmed() {
        let provider = OpenAiCompatProvider::new("custom", "http://localhost:9000/v1/", "");
        assert_eq!(provider.base_url(), "http://localhost:9000/v1");
    }

    #[test]
    fn message_conversion() {
        let messages = vec![
            Message::system("You are a portfolio analyst"),
            Message::user("Hello"),
            Message::assistant("Hi"),
        ];
        let api_messages = OpenAiCompatProvider::to_api_messages(&messages);
        assert_eq!(api_messages.len(), 3);
        assert_eq!(api_messages[0].role, "system");
        assert_eq!(api_messages[1].role, "user");
        assert_eq!(api_messages[2].role, "assistant");
        assert_eq!(api_messages[1].content.as_deref(), Some("Hello"));
    }

    #[test]
    fn parse_chat_response() {
        let data = r#"{
            "model": "gpt-3.5-turbo-0125",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "20% bonds"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        }"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.model, "gpt-3.5-turbo-0125");
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("20% bonds"));
        assert_eq!(parsed.usage.unwrap().total_tokens, 15);
    }

    #[test]
    fn chat_response_converts_to_assistant_message() {
        let data = r#"{"model": "m", "choices": [{"message": {"role": "assistant", "content": "80% equities"}}]}"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        let response = into_provider_response(parsed).unwrap();
        assert_eq!(response.message, Message::assistant("80% equities"));
        assert_eq!(response.model, "m");
        assert!(response.usage.is_none());
    }

    #[test]
    fn null_or_blank_content_is_an_empty_response() {
        for content in ["null", "\"\"", "\"  \""] {
            let data = format!(
                r#"{{"model": "m", "choices": [{{"message": {{"role": "assistant", "content": {content}}}}}]}}"#
            );
            let parsed: ApiResponse = serde_json::from_str(&data).unwrap();
            assert!(matches!(
                into_provider_response(parsed),
                Err(ProviderError::EmptyResponse)
            ));
        }
    }

    #[test]
    fn no_choices_is_an_empty_response() {
        let parsed: ApiResponse = serde_json::from_str(r#"{"model": "m", "choices": []}"#).unwrap();
        assert!(matches!(into_provider_response(parsed), Err(ProviderError::EmptyResponse)));
    }

    #[test]
    fn parse_embedding_response_reorders_by_index() {
        let data = r#"{
            "data": [
                {"embedding": [0.4, 0.5, 0.6], "index": 1},
                {"embedding": [0.1, 0.2, 0.3], "index": 0}
            ],
            "model": "text-embedding-3-small",
            "usage": {"prompt_tokens": 8, "total_tokens": 8}
        }"#;
        let parsed: EmbeddingApiResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.model, "text-embedding-3-small");
        let embeddings = parsed.into_ordered_embeddings();
        assert_eq!(embeddings[0], vec![0.1, 0.2, 0.3]);
        assert_eq!(embeddings[1], vec![0.4, 0.5, 0.6]);
    }
}
