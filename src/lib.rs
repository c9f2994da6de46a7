/*!
 * # subtranslator
 *
 * Translates SRT subtitle files into a target language through an external
 * text-generation service.
 *
 * Documents are parsed into fixed-size chunks, a context sentence is detected
 * once per document, and every chunk is translated concurrently under a
 * process-wide limit with bounded retries. Chunks that still fail keep their
 * original text, so the reassembled file always contains every block.
 *
 * ## Architecture
 *
 * - `app_config`: Configuration management
 * - `subtitle_processor`: SRT parsing and chunking
 * - `providers`: Provider capability and its mock and live implementations:
 *   - `providers::gemini`: Gemini API client
 *   - `providers::openai`: OpenAI-compatible API client
 *   - `providers::anthropic`: Anthropic API client
 * - `translation`: The translation pipeline:
 *   - `translation::core`: Document-level service
 *   - `translation::orchestrator`: Concurrent chunk translation
 *   - `translation::chunk`: Single-chunk translation with retries
 * - `file_utils`: File system operations
 * - `app_controller`: File and folder runs behind the command line
 * - `language_utils`: Target language resolution
 * - `errors`: Custom error types for the application
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod providers;
pub mod subtitle_processor;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::{Config, SpeedMode, TranslationProvider};
pub use errors::{AppError, ProviderError, SubtitleError, TranslationError};
pub use language_utils::{get_language_name, resolve_target_language};
pub use providers::Provider;
pub use subtitle_processor::{SubtitleBlock, SubtitleDocument, SubtitleParser};
pub use translation::{
    ConcurrencyLimiter, TranslationRequest, TranslationResult, TranslationService, TranslationStats,
};
