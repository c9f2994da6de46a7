/*!
 * Scripted providers for pipeline tests
 *
 * `ScriptedProvider` answers chunk requests through a closure so tests can
 * decide per call and per chunk what the provider returns.
 * `ScriptedCompletion` sits one level lower and replays raw text replies
 * through the real `LlmProvider` decoding path.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use subtranslator::app_config::SpeedMode;
use subtranslator::errors::ProviderError;
use subtranslator::providers::mock::MockProvider;
use subtranslator::providers::{ChunkTranslation, Completion, CompletionPrompt, Provider};
use subtranslator::subtitle_processor::SubtitleBlock;

type ChunkScript = dyn Fn(usize, &[SubtitleBlock]) -> Result<ChunkTranslation, ProviderError> + Send + Sync;

/// Provider whose chunk replies come from a closure `(call_number, blocks)`
#[derive(Clone)]
pub struct ScriptedProvider {
    script: Arc<ChunkScript>,
    context: Result<String, ProviderError>,
    delay: Duration,
    chunk_calls: Arc<AtomicUsize>,
    context_calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

impl ScriptedProvider {
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(usize, &[SubtitleBlock]) -> Result<ChunkTranslation, ProviderError> + Send + Sync + 'static,
    {
        Self {
            script: Arc::new(script),
            context: Ok("A scripted conversation.".to_string()),
            delay: Duration::ZERO,
            chunk_calls: Arc::new(AtomicUsize::new(0)),
            context_calls: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Echo every chunk
    pub fn echo() -> Self {
        Self::new(|_, blocks| Ok(MockProvider::echo_translation(blocks)))
    }

    /// Fail every chunk containing a block with the given source index
    pub fn failing_on_block(block_index: usize) -> Self {
        Self::new(move |_, blocks| {
            if blocks.iter().any(|b| b.index == block_index) {
                Err(ProviderError::ApiError { status_code: 503, message: "overloaded".to_string() })
            } else {
                Ok(MockProvider::echo_translation(blocks))
            }
        })
    }

    pub fn with_context_error(mut self, error: ProviderError) -> Self {
        self.context = Err(error);
        self
    }

    /// Wait this long inside every chunk call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn chunk_calls(&self) -> usize {
        self.chunk_calls.load(Ordering::SeqCst)
    }

    pub fn context_calls(&self) -> usize {
        self.context_calls.load(Ordering::SeqCst)
    }

    /// Highest number of chunk calls observed running at once
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for ScriptedProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedProvider")
            .field("chunk_calls", &self.chunk_calls())
            .field("context_calls", &self.context_calls())
            .finish()
    }
}

/// Decrements the in-flight counter even when the call is cancelled
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn detect_context(&self, _sample: &[SubtitleBlock], _mode: SpeedMode) -> Result<String, ProviderError> {
        self.context_calls.fetch_add(1, Ordering::SeqCst);
        self.context.clone()
    }

    async fn translate_chunk(
        &self,
        _context: &str,
        blocks: &[SubtitleBlock],
        _target_language: &str,
        _mode: SpeedMode,
    ) -> Result<ChunkTranslation, ProviderError> {
        let call = self.chunk_calls.fetch_add(1, Ordering::SeqCst);

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(&self.in_flight);
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        (self.script)(call, blocks)
    }
}

/// Completion client replaying raw text replies
///
/// Context requests (no JSON output) always get `context_reply`. Translation
/// requests pop the next scripted reply and repeat the last one when the
/// script runs out.
#[derive(Debug, Clone)]
pub struct ScriptedCompletion {
    context_reply: String,
    replies: Arc<Mutex<VecDeque<Result<String, ProviderError>>>>,
    last: Arc<Mutex<Option<Result<String, ProviderError>>>>,
    prompts: Arc<Mutex<Vec<CompletionPrompt>>>,
}

impl ScriptedCompletion {
    pub fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            context_reply: "\"A friendly chat between two neighbours.\"".to_string(),
            replies: Arc::new(Mutex::new(replies.into())),
            last: Arc::new(Mutex::new(None)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every translation request gets the same reply
    pub fn always(reply: &str) -> Self {
        Self::new(vec![Ok(reply.to_string())])
    }

    /// Prompts received so far, context detection included
    pub fn prompts(&self) -> Vec<CompletionPrompt> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl Completion for ScriptedCompletion {
    type Request = CompletionPrompt;
    type Response = String;

    fn build_request(&self, prompt: &CompletionPrompt) -> Self::Request {
        prompt.clone()
    }

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        let json_output = request.json_output;
        self.prompts.lock().push(request);

        if !json_output {
            return Ok(self.context_reply.clone());
        }

        let next = self.replies.lock().pop_front();
        let mut last = self.last.lock();
        if let Some(reply) = next {
            *last = Some(reply);
        }
        last.clone()
            .unwrap_or_else(|| Err(ProviderError::RequestFailed("no scripted reply".to_string())))
    }

    async fn test_connection(&self, _model: &str) -> Result<(), ProviderError> {
        Ok(())
    }

    fn extract_text(response: &Self::Response) -> String {
        response.clone()
    }
}
