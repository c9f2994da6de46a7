/*!
 * Tests for provider implementations and the response schema
 */

use subtranslator::app_config::{SpeedMode, TranslationProvider};
use subtranslator::errors::ProviderError;
use subtranslator::providers::mock::MockProvider;
use subtranslator::providers::schema::{decode_translation, encode_translation};
use subtranslator::providers::{create_provider, ChunkTranslation, ModelSelection, Provider};
use subtranslator::subtitle_processor::SubtitleBlock;
use crate::common;

fn blocks() -> Vec<SubtitleBlock> {
    vec![
        SubtitleBlock::new(1, 0, 1000, "Hello"),
        SubtitleBlock::new(2, 1000, 2000, "How are\nyou?"),
    ]
}

#[test]
fn test_decodeTranslation_withExactSchema_shouldMapPositions() {
    let text = r#"[{"index":1,"translated_lines":["Comment","allez-vous ?"]},{"index":0,"translated_lines":["Bonjour"]}]"#;
    let translation = decode_translation(text, 2).unwrap();

    assert_eq!(translation[&0], vec!["Bonjour"]);
    assert_eq!(translation[&1], vec!["Comment", "allez-vous ?"]);
}

#[test]
fn test_decodeTranslation_withCodeFenceAndProse_shouldExtractArray() {
    let text = "Here you go:\n```json\n[{\"index\": 0, \"translated_lines\": [\"Bonjour\"]}]\n```\nEnjoy!";
    let translation = decode_translation(text, 1).unwrap();
    assert_eq!(translation.len(), 1);
}

#[test]
fn test_decodeTranslation_withSchemaViolations_shouldReturnInvalidSchema() {
    let cases = [
        "no array at all",
        r#"[{"translated_lines":["x"]}]"#,
        r#"[{"index":0}]"#,
        r#"[{"index":"0","translated_lines":["x"]}]"#,
        r#"[{"index":0,"translated_lines":[1, 2]}]"#,
        r#"[{"index":2,"translated_lines":["x"]}]"#,
        r#"[{"index":-1,"translated_lines":["x"]}]"#,
        r#"[{"index":0,"translated_lines":["x"]},{"index":0,"translated_lines":["y"]}]"#,
    ];

    for text in cases {
        assert!(
            matches!(decode_translation(text, 2), Err(ProviderError::InvalidSchema(_))),
            "expected a schema violation for {}",
            text
        );
    }
}

#[test]
fn test_decodeTranslation_withMissingEntries_shouldReturnPartialMap() {
    let translation = decode_translation(r#"[{"index":0,"translated_lines":["Bonjour"]}]"#, 2).unwrap();
    assert_eq!(translation.len(), 1);
    assert!(!translation.contains_key(&1));
}

#[test]
fn test_encodeTranslation_shouldFollowWireSchema() {
    let mut translation = ChunkTranslation::new();
    translation.insert(0, vec!["Bonjour".to_string()]);

    assert_eq!(encode_translation(&translation), r#"[{"index":0,"translated_lines":["Bonjour"]}]"#);
}

#[tokio::test]
async fn test_mockProvider_shouldEchoWithoutMutatingInput() {
    let input = blocks();
    let provider = MockProvider::working();

    let translation = provider.translate_chunk("ctx", &input, "French", SpeedMode::Mock).await.unwrap();

    assert_eq!(translation[&0], vec!["Hello"]);
    assert_eq!(translation[&1], vec!["How are", "you?"]);
    assert_eq!(input, blocks());
    assert_eq!(provider.request_count(), 1);
}

#[tokio::test]
async fn test_mockProvider_detectContext_shouldNameTheMode() {
    let context = MockProvider::working().detect_context(&blocks(), SpeedMode::Fast).await.unwrap();
    assert_eq!(context, "Mock Context Detected (fast mode)");
}

#[tokio::test]
async fn test_mockProvider_intermittent_shouldFailEveryNthRequest() {
    let provider = MockProvider::intermittent(3);
    let mut results = Vec::new();
    for _ in 0..6 {
        results.push(provider.translate_chunk("ctx", &blocks(), "French", SpeedMode::Fast).await.is_ok());
    }
    assert_eq!(results, vec![true, true, false, true, true, false]);
}

#[tokio::test]
async fn test_mockProvider_failing_shouldFailBothOperations() {
    let provider = MockProvider::failing();
    assert!(provider.detect_context(&blocks(), SpeedMode::Fast).await.is_err());
    assert!(provider.translate_chunk("ctx", &blocks(), "French", SpeedMode::Fast).await.is_err());
}

#[test]
fn test_createProvider_shouldFollowConfiguredProvider() {
    let config = common::mock_config();
    assert_eq!(create_provider(&config).name(), "mock");

    for (provider, name) in [
        (TranslationProvider::Gemini, "gemini"),
        (TranslationProvider::OpenAI, "openai"),
        (TranslationProvider::Anthropic, "anthropic"),
    ] {
        let mut config = common::mock_config();
        config.translation.provider = provider;
        assert_eq!(create_provider(&config).name(), name);
    }
}

#[test]
fn test_modelSelection_shouldUseNormalModelForMock() {
    let models = ModelSelection { fast: "flash".to_string(), normal: "pro".to_string() };
    assert_eq!(models.for_mode(SpeedMode::Fast), "flash");
    assert_eq!(models.for_mode(SpeedMode::Normal), "pro");
    assert_eq!(models.for_mode(SpeedMode::Mock), "pro");
}

#[test]
fn test_providerError_isRetryable_shouldSeparatePermanentErrors() {
    assert!(ProviderError::RateLimitExceeded("slow down".into()).is_retryable());
    assert!(ProviderError::ApiError { status_code: 503, message: String::new() }.is_retryable());
    assert!(ProviderError::InvalidSchema("bad".into()).is_retryable());
    assert!(!ProviderError::AuthenticationError("bad key".into()).is_retryable());
    assert!(!ProviderError::ApiError { status_code: 400, message: String::new() }.is_retryable());
}
