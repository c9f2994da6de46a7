/*!
 * Concurrent translation of every chunk of a document.
 *
 * All chunk tasks are started together and joined together. Each task
 * takes one permit of the shared `ConcurrencyLimiter` for its provider
 * work and gives it back when it settles, whatever the outcome. Dropping
 * the returned future cancels every task and releases their permits.
 */

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use log::{error, info};
use serde::Serialize;

use crate::app_config::SpeedMode;
use crate::subtitle_processor::SubtitleDocument;
use crate::translation::chunk::{ChunkOutcome, ChunkTranslator};
use crate::translation::concurrency::ConcurrencyLimiter;
use crate::translation::context::TranslationContext;

/// Called with `(completed_chunks, total_chunks)` whenever a chunk settles
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Document-level counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TranslationStats {
    /// Chunks the document was split into
    pub total_chunks: usize,
    /// Blocks parsed from the document
    pub total_blocks: usize,
    /// Failed attempts summed over every chunk
    pub total_failed_attempts: u32,
    /// Chunks that ended without a complete translation
    pub chunks_with_failures: usize,
}

impl TranslationStats {
    /// Aggregate per-chunk outcomes
    pub fn from_outcomes(outcomes: &[ChunkOutcome], total_blocks: usize) -> Self {
        Self {
            total_chunks: outcomes.len(),
            total_blocks,
            total_failed_attempts: outcomes.iter().map(ChunkOutcome::failed_attempts).sum(),
            chunks_with_failures: outcomes.iter().filter(|o| o.failed).count(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.chunks_with_failures == 0
    }
}

/// Drives a document's chunks through the chunk translator
#[derive(Debug, Clone)]
pub struct TranslationOrchestrator {
    translator: ChunkTranslator,
    limiter: ConcurrencyLimiter,
}

impl TranslationOrchestrator {
    pub fn new(translator: ChunkTranslator, limiter: ConcurrencyLimiter) -> Self {
        Self { translator, limiter }
    }

    /// Translate every chunk in place and return outcomes in chunk order.
    ///
    /// Returns only once every chunk has reached a terminal state.
    pub async fn translate_document(
        &self,
        document: &mut SubtitleDocument,
        context: &TranslationContext,
        target_language: &str,
        mode: SpeedMode,
        progress: Option<ProgressCallback>,
    ) -> (Vec<ChunkOutcome>, TranslationStats) {
        let total_chunks = document.chunk_count();
        let total_blocks = document.total_blocks();
        let completed = AtomicUsize::new(0);

        info!(
            "Translating {} ({} blocks in {} chunks) into {} [{} mode]",
            document.source_name, total_blocks, total_chunks, target_language, mode
        );

        let tasks = document.chunks.iter_mut().enumerate().map(|(chunk_index, blocks)| {
            let completed = &completed;
            let progress = progress.clone();

            async move {
                let outcome = match self.limiter.acquire().await {
                    Ok(permit) => {
                        let outcome = self.translator
                            .translate(chunk_index, blocks, context, target_language, mode)
                            .await;
                        drop(permit);
                        outcome
                    }
                    Err(e) => {
                        error!("Chunk {} could not acquire a concurrency slot: {}", chunk_index, e);
                        ChunkOutcome { chunk_index, attempts: 0, failed: true }
                    }
                };

                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                if let Some(callback) = progress {
                    callback(done, total_chunks);
                }

                outcome
            }
        });

        let mut outcomes = join_all(tasks).await;
        outcomes.sort_by_key(|outcome| outcome.chunk_index);

        let stats = TranslationStats::from_outcomes(&outcomes, total_blocks);
        if stats.is_complete() {
            info!(
                "Translated {}: {} chunks, {} failed attempt(s)",
                document.source_name, stats.total_chunks, stats.total_failed_attempts
            );
        } else {
            error!(
                "Translated {} with {} of {} chunk(s) failing, {} failed attempt(s)",
                document.source_name, stats.chunks_with_failures, stats.total_chunks, stats.total_failed_attempts
            );
        }

        (outcomes, stats)
    }
}
