/*!
 * Document-level translation service.
 *
 * `TranslationService` is the entry point used by front-ends: it validates a
 * request, parses the document, detects its context, translates all chunks
 * through the orchestrator and reassembles the result.
 */

use std::sync::Arc;
use std::time::Instant;

use log::{info, warn};

use crate::app_config::{Config, SpeedMode};
use crate::errors::{ProviderError, TranslationError};
use crate::language_utils::resolve_target_language;
use crate::providers::mock::MockProvider;
use crate::providers::{create_provider, Provider};
use crate::subtitle_processor::SubtitleParser;
use crate::translation::chunk::{ChunkOutcome, ChunkTranslator};
use crate::translation::concurrency::ConcurrencyLimiter;
use crate::translation::context::{ContextDetector, TranslationContext};
use crate::translation::orchestrator::{ProgressCallback, TranslationOrchestrator, TranslationStats};
use crate::translation::reassembler::reassemble;
use crate::translation::retry::RetryPolicy;

/// One document to translate
#[derive(Debug, Clone)]
pub struct TranslationRequest {
    /// Original file name, checked against the input policy
    pub file_name: String,
    /// Raw document bytes
    pub content: Vec<u8>,
    /// Requested language, by name or ISO 639 code
    pub target_language: String,
    pub mode: SpeedMode,
    /// Overrides the configured chunk size
    pub chunk_max_blocks: Option<usize>,
    /// Turn any failed chunk into an error instead of a partial result
    pub fail_on_chunk_failure: bool,
}

impl TranslationRequest {
    pub fn new(
        file_name: impl Into<String>,
        content: impl Into<Vec<u8>>,
        target_language: impl Into<String>,
        mode: SpeedMode,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
            target_language: target_language.into(),
            mode,
            chunk_max_blocks: None,
            fail_on_chunk_failure: false,
        }
    }

    pub fn with_chunk_max_blocks(mut self, max_blocks: usize) -> Self {
        self.chunk_max_blocks = Some(max_blocks);
        self
    }

    pub fn strict(mut self) -> Self {
        self.fail_on_chunk_failure = true;
        self
    }
}

/// Reassembled document and its counters
#[derive(Debug, Clone)]
pub struct TranslationResult {
    /// SRT bytes, translated where possible
    pub content: Vec<u8>,
    pub stats: TranslationStats,
    /// Per-chunk outcomes in chunk order
    pub outcomes: Vec<ChunkOutcome>,
    pub context: TranslationContext,
    /// Allow-list spelling of the target language
    pub target_language: String,
}

/// Translates whole documents
#[derive(Debug, Clone)]
pub struct TranslationService {
    live: Arc<dyn Provider>,
    mock: Arc<dyn Provider>,
    limiter: ConcurrencyLimiter,
    retry: RetryPolicy,
    parser: SubtitleParser,
    target_languages: Vec<String>,
}

impl TranslationService {
    /// Build the service from configuration around a process-wide limiter
    pub fn new(config: &Config, limiter: ConcurrencyLimiter) -> Self {
        let translation = &config.translation;
        let mock: Arc<dyn Provider> = Arc::new(MockProvider::working().with_latency(translation.common.mock_latency));
        let retry = RetryPolicy::from_config(&translation.common).with_call_timeout(translation.get_timeout());

        Self {
            live: create_provider(config),
            mock,
            limiter,
            retry,
            parser: SubtitleParser::from_config(config),
            target_languages: config.effective_target_languages(),
        }
    }

    /// Build the service around explicit providers
    pub fn with_providers(
        live: Arc<dyn Provider>,
        mock: Arc<dyn Provider>,
        limiter: ConcurrencyLimiter,
        retry: RetryPolicy,
        parser: SubtitleParser,
        target_languages: Vec<String>,
    ) -> Self {
        Self { live, mock, limiter, retry, parser, target_languages }
    }

    /// Provider serving a speed mode. Mock mode never reaches a live backend.
    pub fn provider_for(&self, mode: SpeedMode) -> Arc<dyn Provider> {
        match mode {
            SpeedMode::Mock => Arc::clone(&self.mock),
            SpeedMode::Fast | SpeedMode::Normal => Arc::clone(&self.live),
        }
    }

    pub fn limiter(&self) -> &ConcurrencyLimiter {
        &self.limiter
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn target_languages(&self) -> &[String] {
        &self.target_languages
    }

    /// Check that the provider behind `mode` is reachable
    pub async fn test_connection(&self, mode: SpeedMode) -> Result<(), ProviderError> {
        let provider = self.provider_for(mode);
        info!("Testing connection to {} [{} mode]", provider.name(), mode);
        self.retry.timed(provider.test_connection(mode)).await
    }

    pub async fn translate(&self, request: TranslationRequest) -> Result<TranslationResult, TranslationError> {
        self.translate_with_progress(request, None).await
    }

    /// Translate one document, reporting chunk progress to `progress`
    pub async fn translate_with_progress(
        &self,
        request: TranslationRequest,
        progress: Option<ProgressCallback>,
    ) -> Result<TranslationResult, TranslationError> {
        let started = Instant::now();

        let target_language = resolve_target_language(&request.target_language, &self.target_languages)
            .map_err(|e| TranslationError::InvalidInput(e.to_string()))?;

        let parser = match request.chunk_max_blocks {
            Some(0) => return Err(TranslationError::InvalidInput("Chunk size must be greater than zero".to_string())),
            Some(max_blocks) => self.parser.with_max_blocks(max_blocks),
            None => self.parser.clone(),
        };

        let mut document = parser.parse(&request.file_name, &request.content)?;

        let provider = self.provider_for(request.mode);
        let context = ContextDetector::new(Arc::clone(&provider), self.retry.clone())
            .detect(&document, request.mode, &self.limiter)
            .await?;

        let orchestrator = TranslationOrchestrator::new(
            ChunkTranslator::new(provider, self.retry.clone()),
            self.limiter.clone(),
        );
        let (outcomes, stats) = orchestrator
            .translate_document(&mut document, &context, &target_language, request.mode, progress)
            .await;

        if request.fail_on_chunk_failure {
            if let Some(failed) = outcomes.iter().find(|outcome| outcome.failed) {
                return Err(TranslationError::ChunkTranslation {
                    chunk_index: failed.chunk_index,
                    message: format!(
                        "failed after {} attempt(s), {} of {} chunk(s) failed overall",
                        failed.attempts, stats.chunks_with_failures, stats.total_chunks
                    ),
                });
            }
        }

        let content = reassemble(&document);

        if stats.is_complete() {
            info!("Finished {} in {:.2?}", request.file_name, started.elapsed());
        } else {
            warn!(
                "Finished {} in {:.2?} with {} untranslated chunk(s)",
                request.file_name,
                started.elapsed(),
                stats.chunks_with_failures
            );
        }

        Ok(TranslationResult { content, stats, outcomes, context, target_language })
    }
}
