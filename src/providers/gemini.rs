use std::time::Duration;
use async_trait::async_trait;
use serde::{Serialize, Deserialize};
use reqwest::Client;
use log::error;

use crate::errors::ProviderError;
use crate::providers::{map_request_error, map_status_error, Completion, CompletionPrompt};

/// Gemini client for the `generateContent` API
#[derive(Debug)]
pub struct Gemini {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API base URL, e.g. `https://generativelanguage.googleapis.com/v1beta`
    endpoint: String,
}

/// Gemini request: model name travels in the URL, not the body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    #[serde(skip)]
    model: String,

    contents: Vec<GeminiContent>,

    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,

    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiPart {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

/// Gemini response
#[derive(Debug, Deserialize)]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
pub struct GeminiCandidate {
    pub content: Option<GeminiContent>,
}

impl GeminiContent {
    fn text(role: Option<&str>, text: impl Into<String>) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![GeminiPart { text: text.into() }],
        }
    }
}

impl Gemini {
    /// Create a new Gemini client
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

    fn api_url(&self, model: &str) -> String {
        let base = if self.endpoint.is_empty() {
            "https://generativelanguage.googleapis.com/v1beta"
        } else {
            self.endpoint.trim_end_matches('/')
        };
        format!("{}/models/{}:generateContent", base, model)
    }
}

#[async_trait]
impl Completion for Gemini {
    type Request = GeminiRequest;
    type Response = GeminiResponse;

    fn build_request(&self, prompt: &CompletionPrompt) -> Self::Request {
        GeminiRequest {
            model: prompt.model.clone(),
            contents: vec![GeminiContent::text(Some("user"), &prompt.user)],
            system_instruction: (!prompt.system.is_empty())
                .then(|| GeminiContent::text(None, &prompt.system)),
            generation_config: GenerationConfig {
                temperature: Some(prompt.temperature),
                response_mime_type: prompt.json_output.then(|| "application/json".to_string()),
            },
        }
    }

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        let response = self.client.post(self.api_url(&request.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| map_request_error("Gemini API", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Gemini API error ({}): {}", status, error_text);
            return Err(map_status_error("Gemini API", status, error_text));
        }

        response.json::<GeminiResponse>().await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse Gemini API response: {}", e)))
    }

    async fn test_connection(&self, model: &str) -> Result<(), ProviderError> {
        let request = self.build_request(&CompletionPrompt {
            model: model.to_string(),
            system: String::new(),
            user: "Hello".to_string(),
            temperature: 0.0,
            json_output: false,
        });

        self.complete(request).await?;
        Ok(())
    }

    fn extract_text(response: &Self::Response) -> String {
        response.candidates.first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| content.parts.iter().map(|p| p.text.as_str()).collect())
            .unwrap_or_default()
    }
}
