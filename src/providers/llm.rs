/*!
 * Adapter from a wire-level completion client to the translation capability.
 *
 * `LlmProvider` owns the prompt layout and response decoding, so every
 * live service speaks exactly the same schema.
 */

use async_trait::async_trait;
use log::{debug, warn};

use crate::app_config::SpeedMode;
use crate::errors::ProviderError;
use crate::providers::{schema, ChunkTranslation, Completion, CompletionPrompt, ModelSelection, Provider};
use crate::subtitle_processor::SubtitleBlock;
use crate::translation::prompts;

/// Default sampling temperature for translation requests
const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Live provider backed by any `Completion` client
#[derive(Debug)]
pub struct LlmProvider<C: Completion> {
    name: String,
    client: C,
    models: ModelSelection,
    temperature: f32,
}

impl<C: Completion> LlmProvider<C> {
    pub fn new(name: impl Into<String>, client: C, models: ModelSelection) -> Self {
        Self {
            name: name.into(),
            client,
            models,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 1.0);
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    async fn complete_text(&self, prompt: CompletionPrompt) -> Result<String, ProviderError> {
        let request = self.client.build_request(&prompt);
        let response = self.client.complete(request).await?;
        Ok(C::extract_text(&response))
    }
}

#[async_trait]
impl<C: Completion> Provider for LlmProvider<C> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn detect_context(&self, sample: &[SubtitleBlock], mode: SpeedMode) -> Result<String, ProviderError> {
        let sample_text = prompts::context_sample_text(sample);
        if sample_text.trim().is_empty() {
            warn!("Context sample is empty, asking {} anyway", self.name);
        }

        let prompt = CompletionPrompt {
            model: self.models.for_mode(mode).to_string(),
            system: prompts::CONTEXT_DETECTOR.to_string(),
            user: sample_text,
            temperature: self.temperature,
            json_output: false,
        };

        let context = self.complete_text(prompt).await?;
        let context = context.trim().trim_matches('"').trim().to_string();

        if context.is_empty() {
            return Err(ProviderError::ParseError(format!("{} returned an empty context description", self.name)));
        }

        debug!("{} detected context: {}", self.name, context);
        Ok(context)
    }

    async fn translate_chunk(
        &self,
        context: &str,
        blocks: &[SubtitleBlock],
        target_language: &str,
        mode: SpeedMode,
    ) -> Result<ChunkTranslation, ProviderError> {
        let prompt = CompletionPrompt {
            model: self.models.for_mode(mode).to_string(),
            system: prompts::translation_system_prompt(context, target_language),
            user: prompts::translation_user_prompt(blocks),
            temperature: self.temperature,
            json_output: true,
        };

        let text = self.complete_text(prompt).await?;
        schema::decode_translation(&text, blocks.len())
    }

    async fn test_connection(&self, mode: SpeedMode) -> Result<(), ProviderError> {
        self.client.test_connection(self.models.for_mode(mode)).await
    }
}
