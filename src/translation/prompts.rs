/*!
 * Prompt construction for context detection and chunk translation.
 *
 * Every live provider shares these prompts, so the response schema
 * requested here is the one the decoder in `providers::schema` accepts.
 */

use crate::subtitle_processor::SubtitleBlock;

/// Maximum number of sample lines sent for context detection
pub const CONTEXT_SAMPLE_MAX_LINES: usize = 100;

/// System prompt for detecting the subject and register of a document.
pub const CONTEXT_DETECTOR: &str = r#"You are a context detector for video subtitles. Read the subtitle lines provided by the user and describe, in exactly one sentence, what the video is and what it is about, so that a translator can keep a consistent tone and vocabulary.

The template is: This is a subtitle for a movie/vlog/tutorial/lecture/interview/... for/of/about ...

Reply with that single sentence only, without quotes or any other text."#;

/// System prompt template for translating one chunk.
pub const CHUNK_TRANSLATOR: &str = r#"You're a video subtitle translator. {context} I'll give you the content of srt subtitle blocks, each preceded by its index. You should translate it into {target_language}.

Make sure to return a structured JSON array [...] and nothing else. Each item inside the array is a JSON object following this structure:
"index": the index of the subtitle block exactly as given to you (an integer).
"translated_lines": an array of strings, one string per line of the translated block.

Return exactly one item for every index you receive. Do not merge, split or skip blocks."#;

/// Render the translation system prompt for a context and target language.
pub fn translation_system_prompt(context: &str, target_language: &str) -> String {
    CHUNK_TRANSLATOR
        .replace("{context}", context.trim())
        .replace("{target_language}", target_language)
}

/// Render the chunk body: each block's in-chunk position followed by its text.
pub fn translation_user_prompt(blocks: &[SubtitleBlock]) -> String {
    let mut prompt = String::new();
    for (position, block) in blocks.iter().enumerate() {
        prompt.push_str(&format!("\n{}\n{}\n", position, block.content));
    }
    prompt
}

/// Join the sample text used for context detection.
pub fn context_sample_text(sample: &[SubtitleBlock]) -> String {
    sample.iter()
        .flat_map(|block| block.content.lines())
        .filter(|line| !line.trim().is_empty())
        .take(CONTEXT_SAMPLE_MAX_LINES)
        .collect::<Vec<_>>()
        .join("\n")
}
