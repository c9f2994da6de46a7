/*!
 * Error types for the subtranslator application.
 *
 * This module contains custom error types for different parts of the pipeline,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The call did not complete within the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The response decoded but does not follow the translation schema
    #[error("Invalid response schema: {0}")]
    InvalidSchema(String),
}

impl ProviderError {
    /// Whether another attempt could plausibly succeed.
    ///
    /// Authentication failures and client errors other than 429 are permanent.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::AuthenticationError(_) => false,
            Self::ApiError { status_code, .. } => {
                *status_code == 429 || *status_code >= 500 || *status_code < 400
            }
            _ => true,
        }
    }
}

/// Errors that can occur while reading and parsing subtitle input
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubtitleError {
    /// Input rejected by policy before parsing (extension, size, emptiness)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Content could not be parsed into timed blocks
    #[error("Malformed subtitle content: {0}")]
    Malformed(String),
}

/// Errors that can occur during translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Request rejected before any provider call
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Error with subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Context detection exhausted its attempts
    #[error("Context detection failed after {attempts} attempt(s): {source}")]
    ContextDetection {
        /// Attempts consumed
        attempts: u32,
        /// Last provider error
        #[source]
        source: ProviderError,
    },

    /// A single chunk could not be translated
    #[error("Chunk {chunk_index} translation failed: {message}")]
    ChunkTranslation {
        /// Position of the chunk in the document
        chunk_index: usize,
        /// What went wrong
        message: String,
    },

    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
