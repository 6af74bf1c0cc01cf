use crate::ai::CompletionClient;
use crate::error::{AnalyzerError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_MAX_TOKENS: u32 = 1024;
const DEFAULT_TEMPERATURE: f32 = 0.7;

/// OpenAI chat completions client
///
/// Built without a key the client still constructs; every completion then
/// fails with `MissingConfig`, which the summarizer reports per batch.
pub struct OpenAIClient {
    api_key: Option<String>,
    client: Client,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAIClient {
    /// Create a new OpenAI client
    pub fn new(api_key: Option<String>, base_url: &str, model: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;

        Ok(Self {
            api_key,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        })
    }

    /// Set max tokens
    #[allow(dead_code)]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set sampling temperature
    #[allow(dead_code)]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl CompletionClient for OpenAIClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AnalyzerError::MissingConfig(format!(
                "openai_api_key is required (or set {})",
                crate::config::API_KEY_ENV
            ))
        })?;

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: system,
                },
                Message {
                    role: "user",
                    content: user,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AnalyzerError::llm(format!(
                "API request failed with status {}: {}",
                status, error_text
            )));
        }

        let chat_response: ChatResponse = response.json().await?;

        match chat_response.choices.into_iter().next() {
            Some(choice) => Ok(choice
                .message
                .content
                .map(|c| c.trim().to_string())
                .unwrap_or_default()),
            None => Err(AnalyzerError::llm("No choices in completion response")),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_client_creation() {
        let client =
            OpenAIClient::new(Some("sk-test".to_string()), "https://api.openai.com/v1/", "gpt-4o-mini".to_string())
                .unwrap();
        assert_eq!(client.base_url, "https://api.openai.com/v1");
        assert_eq!(client.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(client.temperature, DEFAULT_TEMPERATURE);
    }

    #[test]
    fn test_client_builder() {
        let client = OpenAIClient::new(Some("sk-test".to_string()), "http://localhost", "gpt-4o".to_string())
            .unwrap()
            .with_max_tokens(256)
            .with_temperature(0.0);

        assert_eq!(client.model, "gpt-4o");
        assert_eq!(client.max_tokens, 256);
        assert_eq!(client.temperature, 0.0);
    }

    #[tokio::test]
    async fn test_complete_sends_chat_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "max_tokens": 1024,
                "temperature": 0.7,
                "messages": [
                    { "role": "system", "content": "be brief" },
                    { "role": "user", "content": "summarize" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "  Two themes.\n" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            OpenAIClient::new(Some("sk-test".to_string()), &server.uri(), "gpt-4o-mini".to_string()).unwrap();
        let text = client.complete("be brief", "summarize").await.unwrap();
        assert_eq!(text, "Two themes.");
    }

    #[tokio::test]
    async fn test_complete_without_key_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = OpenAIClient::new(None, &server.uri(), "gpt-4o-mini".to_string()).unwrap();
        let result = client.complete("system", "user").await;
        assert!(matches!(result, Err(AnalyzerError::MissingConfig(_))));
    }

    #[tokio::test]
    async fn test_complete_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let client =
            OpenAIClient::new(Some("sk-test".to_string()), &server.uri(), "gpt-4o-mini".to_string()).unwrap();
        let result = client.complete("system", "user").await;
        assert!(matches!(result, Err(AnalyzerError::Llm(msg)) if msg.contains("429")));
    }

    #[tokio::test]
    async fn test_complete_without_choices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let client =
            OpenAIClient::new(Some("sk-test".to_string()), &server.uri(), "gpt-4o-mini".to_string()).unwrap();
        assert!(client.complete("system", "user").await.is_err());
    }
}
