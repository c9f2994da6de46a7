/*!
 * Decoder for the structured translation response.
 *
 * Providers must answer with a JSON array of objects
 * `{ "index": <int>, "translated_lines": [<string>, ...] }` where `index`
 * is the 0-based position of the block inside the chunk that was sent.
 * Code fences and prose around the array are tolerated.
 */

use serde::{Deserialize, Serialize};

use crate::errors::ProviderError;
use crate::providers::ChunkTranslation;

/// One entry of the response array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslatedBlock {
    /// Position within the chunk
    pub index: i64,

    /// Lines of the translated block, joined with newlines on commit
    pub translated_lines: Vec<String>,
}

/// Find the first JSON array in a model reply that matches the response schema.
///
/// Every `[` is tried as a start so bracketed prose such as `Translation [fr]:`
/// does not hide the array that follows. An empty array is only returned when
/// no non-empty one is found.
fn extract_entries(text: &str) -> Result<Vec<TranslatedBlock>, ProviderError> {
    let mut first_error = None;
    let mut empty_seen = false;

    for (start, _) in text.match_indices('[') {
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Vec<TranslatedBlock>>();
        match stream.next() {
            Some(Ok(entries)) if !entries.is_empty() => return Ok(entries),
            Some(Ok(_)) => empty_seen = true,
            Some(Err(e)) => {
                first_error.get_or_insert(e);
            }
            None => {}
        }
    }

    if empty_seen {
        return Ok(Vec::new());
    }

    Err(match first_error {
        Some(e) => ProviderError::InvalidSchema(e.to_string()),
        None => ProviderError::InvalidSchema(format!(
            "response does not contain a JSON array: {}",
            truncate_text(text.trim(), 120)
        )),
    })
}

/// Decode and validate a response for a chunk of `chunk_len` blocks.
///
/// Out-of-range and duplicated positions reject the whole response; missing
/// positions do not, completeness is the caller's concern.
pub fn decode_translation(text: &str, chunk_len: usize) -> Result<ChunkTranslation, ProviderError> {
    let entries = extract_entries(text)?;

    let mut translation = ChunkTranslation::new();
    for entry in entries {
        let position = usize::try_from(entry.index)
            .ok()
            .filter(|position| *position < chunk_len)
            .ok_or_else(|| ProviderError::InvalidSchema(format!(
                "index {} is out of range for a chunk of {} block(s)",
                entry.index, chunk_len
            )))?;

        if translation.insert(position, entry.translated_lines).is_some() {
            return Err(ProviderError::InvalidSchema(format!("index {} appears more than once", position)));
        }
    }

    Ok(translation)
}

/// Encode a translation in the wire schema
pub fn encode_translation(translation: &ChunkTranslation) -> String {
    let entries: Vec<TranslatedBlock> = translation.iter()
        .map(|(position, lines)| TranslatedBlock {
            index: *position as i64,
            translated_lines: lines.clone(),
        })
        .collect();

    serde_json::to_string(&entries).unwrap_or_else(|_| "[]".to_string())
}

fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    }
}
