/*!
 * Tests for the retry policy, concurrency limiter and chunk translator
 */

use std::sync::Arc;
use std::time::Duration;

use subtranslator::app_config::{SpeedMode, TranslationCommonConfig};
use subtranslator::errors::ProviderError;
use subtranslator::providers::ChunkTranslation;
use subtranslator::subtitle_processor::SubtitleBlock;
use subtranslator::translation::chunk::ChunkAttemptError;
use subtranslator::translation::{
    ChunkOutcome, ChunkTranslator, ConcurrencyLimiter, RetryOutcome, RetryPolicy, TranslationContext,
    TranslationStats,
};
use crate::common::mock_providers::ScriptedProvider;

fn chunk(count: usize) -> Vec<SubtitleBlock> {
    (1..=count)
        .map(|i| SubtitleBlock::new(i, i as u64 * 1000, i as u64 * 1000 + 800, format!("Line {}", i)))
        .collect()
}

#[test]
fn test_retryPolicy_fromConfig_shouldUseCommonSettings() {
    let common = TranslationCommonConfig { retry_max_attempts: 6, retry_delay_ms: 250, ..Default::default() };
    let policy = RetryPolicy::from_config(&common);

    assert_eq!(policy.max_attempts(), 6);
    assert_eq!(policy.delay(), Duration::from_millis(250));
    assert_eq!(policy.call_timeout(), None);
    assert_eq!(policy.with_call_timeout(Duration::ZERO).call_timeout(), None);
}

#[tokio::test(start_paused = true)]
async fn test_retryPolicy_shouldWaitFixedDelayBetweenAttempts() {
    let policy = RetryPolicy::new(3, Duration::from_millis(500));
    let started = tokio::time::Instant::now();

    let outcome: RetryOutcome<(), ProviderError> = policy
        .run("op", |_| async { Err(ProviderError::ConnectionError("down".into())) }, ProviderError::is_retryable)
        .await;

    assert_eq!(outcome.attempts, 3);
    assert_eq!(started.elapsed(), Duration::from_millis(1000));
}

#[tokio::test]
async fn test_limiter_fromConfig_shouldUseConfiguredCapacity() {
    let common = TranslationCommonConfig { max_concurrent_translations: 3, ..Default::default() };
    let limiter = ConcurrencyLimiter::from_config(&common);

    assert_eq!(limiter.capacity(), 3);
    let permit = limiter.acquire().await.unwrap();
    assert_eq!(limiter.in_use(), 1);
    drop(permit);
    assert_eq!(limiter.available(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_chunkTranslator_withOutOfRangeReply_shouldRetryAndFail() {
    let provider = ScriptedProvider::new(|_, _| {
        let mut translation = ChunkTranslation::new();
        translation.insert(7, vec!["nope".to_string()]);
        Ok(translation)
    });
    let translator = ChunkTranslator::new(Arc::new(provider.clone()), RetryPolicy::new(3, Duration::from_millis(10)));
    let mut blocks = chunk(2);

    let outcome = translator
        .translate(0, &mut blocks, &TranslationContext::new("ctx"), "French", SpeedMode::Fast)
        .await;

    assert_eq!(outcome, ChunkOutcome { chunk_index: 0, attempts: 3, failed: true });
    assert_eq!(provider.chunk_calls(), 3);
    assert!(blocks.iter().all(|b| b.translated_content.is_none()));
}

#[tokio::test(start_paused = true)]
async fn test_chunkTranslator_withAuthError_shouldNotRetry() {
    let provider = ScriptedProvider::new(|_, _| Err(ProviderError::AuthenticationError("bad key".into())));
    let translator = ChunkTranslator::new(Arc::new(provider.clone()), RetryPolicy::new(4, Duration::from_millis(10)));

    let outcome = translator
        .translate(2, &mut chunk(1), &TranslationContext::new("ctx"), "French", SpeedMode::Fast)
        .await;

    assert_eq!(outcome, ChunkOutcome { chunk_index: 2, attempts: 1, failed: true });
    assert_eq!(outcome.failed_attempts(), 1);
    assert_eq!(provider.chunk_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_chunkTranslator_shouldResendWholeChunkAndCommitOnlyFinalReply() {
    // First reply is incomplete, second covers everything with different text
    let provider = ScriptedProvider::new(|call, blocks| {
        let mut translation = ChunkTranslation::new();
        if call == 0 {
            translation.insert(0, vec!["premier essai".to_string()]);
        } else {
            assert_eq!(blocks.len(), 2);
            translation.insert(0, vec!["Un".to_string()]);
            translation.insert(1, vec!["Deux".to_string()]);
        }
        Ok(translation)
    });
    let translator = ChunkTranslator::new(Arc::new(provider), RetryPolicy::new(3, Duration::from_millis(10)));
    let mut blocks = chunk(2);

    let outcome = translator
        .translate(0, &mut blocks, &TranslationContext::new("ctx"), "French", SpeedMode::Normal)
        .await;

    assert_eq!(outcome, ChunkOutcome { chunk_index: 0, attempts: 2, failed: false });
    assert_eq!(blocks[0].translated_content.as_deref(), Some("Un"));
    assert_eq!(blocks[1].translated_content.as_deref(), Some("Deux"));
}

#[test]
fn test_chunkAttemptError_incomplete_shouldBeRetryable() {
    let error = ChunkAttemptError::Incomplete { staged: ChunkTranslation::new(), expected: 2 };
    assert!(error.is_retryable());
    assert_eq!(error.to_string(), "response covered 0 of 2 block(s)");
}

#[test]
fn test_translationStats_shouldCountOnlyFailedAttempts() {
    let outcomes = [
        ChunkOutcome { chunk_index: 0, attempts: 1, failed: false },
        ChunkOutcome { chunk_index: 1, attempts: 1, failed: false },
    ];
    let stats = TranslationStats::from_outcomes(&outcomes, 4);

    assert_eq!(stats.total_failed_attempts, 0);
    assert!(stats.is_complete());
}
