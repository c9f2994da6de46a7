use std::time::Duration;
use async_trait::async_trait;
use serde::{Serialize, Deserialize};
use reqwest::Client;
use log::error;

use crate::errors::ProviderError;
use crate::providers::{map_request_error, map_status_error, Completion, CompletionPrompt};

/// OpenAI client, also usable with OpenAI-compatible servers
#[derive(Debug)]
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API base URL, e.g. `https://api.openai.com/v1`
    endpoint: String,
}

/// Chat completion request
#[derive(Debug, Serialize)]
pub struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Chat message
#[derive(Debug, Serialize, Deserialize)]
pub struct OpenAIMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
pub struct OpenAIResponse {
    #[serde(default)]
    pub choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
pub struct OpenAIChoice {
    pub message: OpenAIMessage,
}

impl OpenAIRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            temperature: None,
        }
    }

    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(OpenAIMessage {
            role: role.into(),
            content: Some(content.into()),
        });
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

impl OpenAI {
    /// Create a new OpenAI client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }

    fn api_url(&self) -> String {
        let base = if self.endpoint.is_empty() {
            "https://api.openai.com/v1"
        } else {
            self.endpoint.trim_end_matches('/')
        };
        format!("{}/chat/completions", base)
    }
}

#[async_trait]
impl Completion for OpenAI {
    type Request = OpenAIRequest;
    type Response = OpenAIResponse;

    fn build_request(&self, prompt: &CompletionPrompt) -> Self::Request {
        let mut request = OpenAIRequest::new(&prompt.model).temperature(prompt.temperature);
        if !prompt.system.is_empty() {
            request = request.add_message("system", &prompt.system);
        }
        request.add_message("user", &prompt.user)
    }

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        let mut builder = self.client.post(self.api_url()).json(&request);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let response = builder.send()
            .await
            .map_err(|e| map_request_error("OpenAI API", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("OpenAI API error ({}): {}", status, error_text);
            return Err(map_status_error("OpenAI API", status, error_text));
        }

        response.json::<OpenAIResponse>().await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse OpenAI API response: {}", e)))
    }

    async fn test_connection(&self, model: &str) -> Result<(), ProviderError> {
        let request = OpenAIRequest::new(model).add_message("user", "Hello");
        self.complete(request).await?;
        Ok(())
    }

    fn extract_text(response: &Self::Response) -> String {
        response.choices.first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default()
    }
}
