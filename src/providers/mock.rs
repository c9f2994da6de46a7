/*!
 * Mock provider implementations.
 *
 * The mock echoes the original text as its "translation" and simulates
 * latency depending on the speed mode. Other behaviors exist to exercise
 * retry and failure handling:
 * - `MockProvider::working()` - Always succeeds, echoing the input
 * - `MockProvider::intermittent(n)` - Fails every nth chunk request
 * - `MockProvider::failing()` - Always fails with an error
 * - `MockProvider::partial()` - Omits the last block of every chunk
 * - `MockProvider::slow(ms)` - Succeeds after a fixed delay
 */

use async_trait::async_trait;
use log::debug;
use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::{DelayRange, MockLatencyConfig, SpeedMode};
use crate::errors::ProviderError;
use crate::providers::{ChunkTranslation, Provider};
use crate::subtitle_processor::SubtitleBlock;

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds, echoing the original text
    Working,
    /// Fails every Nth chunk request
    Intermittent { fail_every: usize },
    /// Always fails with an error, context detection included
    Failing,
    /// Succeeds but leaves out the last block of each chunk
    Partial,
    /// Simulates slow response (for timeout testing)
    Slow { delay_ms: u64 },
}

/// Mock provider for exercising the pipeline without external calls
#[derive(Debug)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Simulated latency per speed mode
    latency: MockLatencyConfig,
    /// Chunk request counter for intermittent failures
    request_count: Arc<AtomicUsize>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior and no latency
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            latency: MockLatencyConfig::instant(),
            request_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create an intermittently failing mock provider
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every: fail_every.max(1) })
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that returns incomplete chunk translations
    pub fn partial() -> Self {
        Self::new(MockBehavior::Partial)
    }

    /// Create a mock that answers after `delay_ms`
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Simulate latency per speed mode
    pub fn with_latency(mut self, latency: MockLatencyConfig) -> Self {
        self.latency = latency;
        self
    }

    /// Number of chunk requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Canned context string for a speed mode
    pub fn context_for(mode: SpeedMode) -> String {
        format!("Mock Context Detected ({} mode)", mode)
    }

    /// Echo translation of a chunk: every block mapped to its own lines
    pub fn echo_translation(blocks: &[SubtitleBlock]) -> ChunkTranslation {
        blocks.iter()
            .enumerate()
            .map(|(position, block)| (position, block.content.lines().map(str::to_string).collect()))
            .collect()
    }

    fn pick_delay(range: DelayRange) -> Duration {
        if range.max_ms == 0 {
            return Duration::ZERO;
        }
        let millis = rand::rng().random_range(range.min_ms..=range.max_ms);
        Duration::from_millis(millis)
    }

    async fn simulate_latency(&self, mode: SpeedMode) {
        let delay = match self.behavior {
            MockBehavior::Slow { delay_ms } => Duration::from_millis(delay_ms),
            _ => Self::pick_delay(self.latency.for_mode(mode)),
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

impl Clone for MockProvider {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior,
            latency: self.latency,
            request_count: Arc::clone(&self.request_count),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn detect_context(&self, _sample: &[SubtitleBlock], mode: SpeedMode) -> Result<String, ProviderError> {
        if self.behavior == MockBehavior::Failing {
            return Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            });
        }

        self.simulate_latency(mode).await;
        Ok(Self::context_for(mode))
    }

    async fn translate_chunk(
        &self,
        _context: &str,
        blocks: &[SubtitleBlock],
        target_language: &str,
        mode: SpeedMode,
    ) -> Result<ChunkTranslation, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        debug!("Mock request #{} for {} block(s) into {}", count + 1, blocks.len(), target_language);

        self.simulate_latency(mode).await;

        match self.behavior {
            MockBehavior::Working | MockBehavior::Slow { .. } => Ok(Self::echo_translation(blocks)),

            MockBehavior::Intermittent { fail_every } => {
                if count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    Ok(Self::echo_translation(blocks))
                }
            }

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::Partial => {
                let mut translation = Self::echo_translation(blocks);
                if translation.len() > 1 {
                    translation.pop_last();
                }
                Ok(translation)
            }
        }
    }
}
