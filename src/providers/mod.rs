/*!
 * Provider implementations for different translation services.
 *
 * Two traits live here:
 * - `Provider`: the capability the pipeline needs (detect a context,
 *   translate one chunk). Implemented by `MockProvider` and `LlmProvider`.
 * - `Completion`: a wire-level text completion client. Implemented by
 *   the Gemini, OpenAI and Anthropic clients and adapted to `Provider`
 *   through `LlmProvider`.
 */

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

use crate::app_config::{Config, SpeedMode, TranslationProvider};
use crate::errors::ProviderError;
use crate::subtitle_processor::SubtitleBlock;

/// Translated lines keyed by the block's 0-based position within its chunk
pub type ChunkTranslation = BTreeMap<usize, Vec<String>>;

/// Capability required by the translation pipeline
///
/// Implementations are pure: they never mutate the blocks they are given.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Describe the subject and register of a document from a sample of its blocks
    async fn detect_context(&self, sample: &[SubtitleBlock], mode: SpeedMode) -> Result<String, ProviderError>;

    /// Translate one chunk, returning lines per in-chunk position
    async fn translate_chunk(
        &self,
        context: &str,
        blocks: &[SubtitleBlock],
        target_language: &str,
        mode: SpeedMode,
    ) -> Result<ChunkTranslation, ProviderError>;

    /// Check that the backing service is reachable with the model of `mode`
    async fn test_connection(&self, _mode: SpeedMode) -> Result<(), ProviderError> {
        Ok(())
    }
}

/// Provider-independent description of one completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionPrompt {
    /// Model name
    pub model: String,
    /// System instructions
    pub system: String,
    /// User content
    pub user: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Ask the service for a JSON reply when it supports it
    pub json_output: bool,
}

/// Common trait for all LLM completion clients
///
/// This trait defines the interface that all wire-level clients must follow,
/// allowing them to be used interchangeably behind `LlmProvider`.
#[async_trait]
pub trait Completion: Send + Sync + Debug {
    /// The request type for this client
    type Request: Send + Sync;

    /// The response type for this client
    type Response: Send + Sync;

    /// Build a wire request from a prompt
    fn build_request(&self, prompt: &CompletionPrompt) -> Self::Request;

    /// Complete a request using this client
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Test the connection to the service
    async fn test_connection(&self, model: &str) -> Result<(), ProviderError>;

    /// Extract text from the response
    fn extract_text(response: &Self::Response) -> String;
}

/// Map a reqwest failure onto a provider error
pub(crate) fn map_request_error(service: &str, error: reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::ConnectionError(format!("{} request timed out: {}", service, error))
    } else if error.is_connect() {
        ProviderError::ConnectionError(format!("Failed to connect to {}: {}", service, error))
    } else {
        ProviderError::RequestFailed(format!("Failed to send request to {}: {}", service, error))
    }
}

/// Map a non-success HTTP status onto a provider error
pub(crate) fn map_status_error(service: &str, status: reqwest::StatusCode, body: String) -> ProviderError {
    match status.as_u16() {
        401 | 403 => ProviderError::AuthenticationError(format!("{} rejected the API key: {}", service, body)),
        429 => ProviderError::RateLimitExceeded(format!("{}: {}", service, body)),
        status_code => ProviderError::ApiError { status_code, message: body },
    }
}

/// Build the live provider named by the configuration.
///
/// The mock provider is returned for `TranslationProvider::Mock`.
pub fn create_provider(config: &Config) -> Arc<dyn Provider> {
    let translation = &config.translation;
    let api_key = translation.get_api_key();
    let endpoint = translation.get_endpoint();
    let timeout = translation.get_timeout();
    let models = ModelSelection {
        fast: translation.get_model(SpeedMode::Fast),
        normal: translation.get_model(SpeedMode::Normal),
    };
    let temperature = translation.common.temperature;

    match translation.provider {
        TranslationProvider::Mock => {
            Arc::new(mock::MockProvider::working().with_latency(translation.common.mock_latency))
        }
        TranslationProvider::Gemini => Arc::new(
            llm::LlmProvider::new("gemini", gemini::Gemini::new(api_key, endpoint, timeout), models)
                .with_temperature(temperature),
        ),
        TranslationProvider::OpenAI => Arc::new(
            llm::LlmProvider::new("openai", openai::OpenAI::new(api_key, endpoint, timeout), models)
                .with_temperature(temperature),
        ),
        TranslationProvider::Anthropic => Arc::new(
            llm::LlmProvider::new("anthropic", anthropic::Anthropic::new(api_key, endpoint, timeout), models)
                .with_temperature(temperature),
        ),
    }
}

/// Models used for the fast and normal tiers
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSelection {
    pub fast: String,
    pub normal: String,
}

impl ModelSelection {
    pub fn for_mode(&self, mode: SpeedMode) -> &str {
        match mode {
            SpeedMode::Fast => &self.fast,
            SpeedMode::Normal | SpeedMode::Mock => &self.normal,
        }
    }
}

pub mod schema;
pub mod mock;
pub mod llm;
pub mod gemini;
pub mod openai;
pub mod anthropic;
