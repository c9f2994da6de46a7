/*!
 * Chunked subtitle translation pipeline.
 *
 * - `retry`: bounded fixed-delay retry policy with per-call timeouts
 * - `concurrency`: process-wide limiter shared by every document
 * - `context`: one-off context detection per document
 * - `chunk`: translation of a single chunk with staged commits
 * - `orchestrator`: concurrent fan-out over all chunks and statistics
 * - `reassembler`: SRT serialization with fallback to the original text
 * - `prompts`: request text sent to live providers
 * - `core`: document-level `TranslationService`
 */

pub use self::chunk::{ChunkOutcome, ChunkTranslator};
pub use self::concurrency::ConcurrencyLimiter;
pub use self::context::{ContextDetector, TranslationContext};
pub use self::core::{TranslationRequest, TranslationResult, TranslationService};
pub use self::orchestrator::{ProgressCallback, TranslationOrchestrator, TranslationStats};
pub use self::reassembler::reassemble;
pub use self::retry::{RetryOutcome, RetryPolicy};

pub mod chunk;
pub mod concurrency;
pub mod context;
pub mod core;
pub mod orchestrator;
pub mod prompts;
pub mod reassembler;
pub mod retry;
