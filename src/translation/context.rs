/*!
 * Document-level context detection.
 *
 * The first chunk of a document is sent to the provider once to obtain a
 * one-sentence description of its subject and register. That sentence is
 * embedded in every chunk request so independently translated chunks keep
 * a consistent tone.
 */

use std::fmt;
use std::sync::Arc;

use log::{info, error};

use crate::app_config::SpeedMode;
use crate::errors::{ProviderError, TranslationError};
use crate::providers::Provider;
use crate::subtitle_processor::SubtitleDocument;
use crate::translation::concurrency::ConcurrencyLimiter;
use crate::translation::retry::RetryPolicy;

/// Context string used when the document has no text to sample
const EMPTY_DOCUMENT_CONTEXT: &str = "Unknown (empty input)";

/// Read-only description of a document, shared by all its chunk requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationContext(String);

impl TranslationContext {
    pub fn new(context: impl Into<String>) -> Self {
        Self(context.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TranslationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Detects the context of a document with bounded retries
#[derive(Debug, Clone)]
pub struct ContextDetector {
    provider: Arc<dyn Provider>,
    retry: RetryPolicy,
}

impl ContextDetector {
    pub fn new(provider: Arc<dyn Provider>, retry: RetryPolicy) -> Self {
        Self { provider, retry }
    }

    /// Detect the context from the document's first chunk.
    ///
    /// Exhausting the retries is fatal for the document.
    pub async fn detect(
        &self,
        document: &SubtitleDocument,
        mode: SpeedMode,
        limiter: &ConcurrencyLimiter,
    ) -> Result<TranslationContext, TranslationError> {
        let Some(sample) = document.chunks.first().filter(|chunk| !chunk.is_empty()) else {
            return Ok(TranslationContext::new(EMPTY_DOCUMENT_CONTEXT));
        };

        let _permit = limiter.acquire().await.map_err(|e| TranslationError::ContextDetection {
            attempts: 0,
            source: ProviderError::RequestFailed(e.to_string()),
        })?;

        let provider = &self.provider;
        let retry = &self.retry;
        let outcome = self.retry
            .run(
                "Context detection",
                move |_attempt| retry.timed(provider.detect_context(sample, mode)),
                ProviderError::is_retryable,
            )
            .await;

        match outcome.result {
            Ok(context) => {
                info!("Detected context for {}: {}", document.source_name, truncate_text(&context, 80));
                Ok(TranslationContext::new(context))
            }
            Err(source) => {
                error!("Context detection for {} failed after {} attempt(s)", document.source_name, outcome.attempts);
                Err(TranslationError::ContextDetection { attempts: outcome.attempts, source })
            }
        }
    }
}

fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    }
}
