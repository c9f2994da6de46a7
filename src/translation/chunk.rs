/*!
 * Translation of a single chunk with bounded retries.
 *
 * Every attempt resends the whole chunk and validates the reply into a
 * staging map. Blocks are only written once the chunk reaches its final
 * state: with the successful attempt, or, when every attempt failed, with
 * the most complete reply that passed validation.
 */

use std::sync::Arc;

use log::warn;
use thiserror::Error;

use crate::app_config::SpeedMode;
use crate::errors::ProviderError;
use crate::providers::{ChunkTranslation, Provider};
use crate::subtitle_processor::SubtitleBlock;
use crate::translation::context::TranslationContext;
use crate::translation::retry::RetryPolicy;

/// Why a single attempt was rejected
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChunkAttemptError {
    /// The provider call failed or its reply violated the schema
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The reply was valid but did not cover every block
    #[error("response covered {} of {expected} block(s)", .staged.len())]
    Incomplete {
        /// Valid entries of the reply
        staged: ChunkTranslation,
        /// Blocks in the chunk
        expected: usize,
    },
}

impl ChunkAttemptError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Provider(error) => error.is_retryable(),
            Self::Incomplete { .. } => true,
        }
    }
}

/// Terminal state of one chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkOutcome {
    /// Position of the chunk in the document
    pub chunk_index: usize,
    /// Attempts consumed, including a successful one
    pub attempts: u32,
    /// Whether the chunk ended without a complete translation
    pub failed: bool,
}

impl ChunkOutcome {
    /// Attempts that ended in an error
    pub fn failed_attempts(&self) -> u32 {
        if self.failed {
            self.attempts
        } else {
            self.attempts.saturating_sub(1)
        }
    }
}

/// Translates one chunk at a time
#[derive(Debug, Clone)]
pub struct ChunkTranslator {
    provider: Arc<dyn Provider>,
    retry: RetryPolicy,
}

impl ChunkTranslator {
    pub fn new(provider: Arc<dyn Provider>, retry: RetryPolicy) -> Self {
        Self { provider, retry }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Translate `blocks` in place. Failures are contained in the outcome.
    pub async fn translate(
        &self,
        chunk_index: usize,
        blocks: &mut [SubtitleBlock],
        context: &TranslationContext,
        target_language: &str,
        mode: SpeedMode,
    ) -> ChunkOutcome {
        let label = format!("Chunk {}", chunk_index);
        let mut best_partial: Option<ChunkTranslation> = None;

        let view: &[SubtitleBlock] = blocks;
        let outcome = self.retry
            .run_observed(
                &label,
                move |_attempt| self.attempt(view, context, target_language, mode),
                ChunkAttemptError::is_retryable,
                |_attempt, error| {
                    if let ChunkAttemptError::Incomplete { staged, .. } = error {
                        if best_partial.as_ref().is_none_or(|best| staged.len() > best.len()) {
                            best_partial = Some(staged.clone());
                        }
                    }
                },
            )
            .await;

        let attempts = outcome.attempts;
        match outcome.result {
            Ok(staged) => {
                Self::commit(blocks, staged);
                ChunkOutcome { chunk_index, attempts, failed: false }
            }
            Err(error) => {
                if let Some(staged) = best_partial {
                    warn!("{} keeps {} of {} partial translation(s) after failing: {}", label, staged.len(), blocks.len(), error);
                    Self::commit(blocks, staged);
                }
                ChunkOutcome { chunk_index, attempts, failed: true }
            }
        }
    }

    /// One fresh request for the whole chunk
    async fn attempt(
        &self,
        blocks: &[SubtitleBlock],
        context: &TranslationContext,
        target_language: &str,
        mode: SpeedMode,
    ) -> Result<ChunkTranslation, ChunkAttemptError> {
        let translation = self.retry
            .timed(self.provider.translate_chunk(context.as_str(), blocks, target_language, mode))
            .await?;

        Self::validate(translation, blocks.len())
    }

    /// Check positions against the chunk and require every block to be covered
    pub fn validate(translation: ChunkTranslation, expected: usize) -> Result<ChunkTranslation, ChunkAttemptError> {
        if let Some(position) = translation.keys().find(|position| **position >= expected) {
            return Err(ProviderError::InvalidSchema(format!(
                "index {} is out of range for a chunk of {} block(s)",
                position, expected
            )).into());
        }

        if translation.len() < expected {
            return Err(ChunkAttemptError::Incomplete { staged: translation, expected });
        }

        Ok(translation)
    }

    /// Write staged lines onto their blocks
    fn commit(blocks: &mut [SubtitleBlock], staged: ChunkTranslation) {
        for (position, lines) in staged {
            let Some(block) = blocks.get_mut(position) else {
                continue;
            };

            let text = lines.iter()
                .map(|line| line.trim_end())
                .filter(|line| !line.trim().is_empty())
                .collect::<Vec<_>>()
                .join("\n");

            if !text.is_empty() {
                block.translated_content = Some(text);
            }
        }
    }
}
