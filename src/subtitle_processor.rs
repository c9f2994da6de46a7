use std::fmt;
use regex::Regex;
use once_cell::sync::Lazy;
use log::{warn, debug};

use crate::app_config::Config;
use crate::errors::SubtitleError;

// @module: Subtitle parsing and chunking

// @const: SRT timestamp regex
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2}):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d{1,2}):(\d{2}):(\d{2})[,.](\d{3})").unwrap()
});

// @const: UTF-8 byte order mark
const BOM: char = '\u{feff}';

// @struct: Single timed caption unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleBlock {
    // @field: Source numbering, never reassigned
    pub index: usize,

    // @field: Start time in ms
    pub start_ms: u64,

    // @field: End time in ms
    pub end_ms: u64,

    // @field: Original text, may span multiple lines
    pub content: String,

    // @field: Translation, set once by the owning chunk task
    pub translated_content: Option<String>,
}

impl SubtitleBlock {
    pub fn new(index: usize, start_ms: u64, end_ms: u64, content: impl Into<String>) -> Self {
        SubtitleBlock {
            index,
            start_ms,
            end_ms,
            content: content.into(),
            translated_content: None,
        }
    }

    /// Parse an SRT timestamp (`HH:MM:SS,mmm`, `.` accepted as separator) to milliseconds
    pub fn parse_timestamp(timestamp: &str) -> Result<u64, SubtitleError> {
        let parts: Vec<&str> = timestamp.trim().split(&[':', ',', '.'][..]).collect();

        if parts.len() != 4 {
            return Err(SubtitleError::Malformed(format!("Invalid timestamp format: {}", timestamp)));
        }

        let mut values = [0u64; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part.parse().map_err(|_| {
                SubtitleError::Malformed(format!("Invalid timestamp component '{}' in {}", part, timestamp))
            })?;
        }
        let [hours, minutes, seconds, millis] = values;

        if minutes >= 60 || seconds >= 60 || millis >= 1000 {
            return Err(SubtitleError::Malformed(format!("Invalid time components in timestamp: {}", timestamp)));
        }

        Ok(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis)
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }

    pub fn format_start_time(&self) -> String {
        Self::format_timestamp(self.start_ms)
    }

    pub fn format_end_time(&self) -> String {
        Self::format_timestamp(self.end_ms)
    }

    /// Text to emit: the translation when present and non-empty, the original otherwise
    pub fn output_text(&self) -> &str {
        match self.translated_content.as_deref() {
            Some(translated) if !translated.trim().is_empty() => translated,
            _ => &self.content,
        }
    }

    pub fn is_translated(&self) -> bool {
        self.translated_content.is_some()
    }
}

impl fmt::Display for SubtitleBlock {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.index)?;
        writeln!(f, "{} --> {}", self.format_start_time(), self.format_end_time())?;
        writeln!(f, "{}", self.output_text())?;
        writeln!(f)
    }
}

/// A parsed document: ordered, non-overlapping chunks of blocks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleDocument {
    /// Name of the source file, used for logging and output naming
    pub source_name: String,

    /// Chunks in source order
    pub chunks: Vec<Vec<SubtitleBlock>>,
}

impl SubtitleDocument {
    /// Build a document by chunking blocks in source order
    pub fn from_blocks(
        source_name: impl Into<String>,
        blocks: Vec<SubtitleBlock>,
        max_blocks: usize,
    ) -> Result<Self, SubtitleError> {
        if max_blocks == 0 {
            return Err(SubtitleError::InvalidInput("Chunk size must be greater than zero".to_string()));
        }

        Ok(SubtitleDocument {
            source_name: source_name.into(),
            chunks: split_into_chunks(blocks, max_blocks),
        })
    }

    pub fn total_blocks(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Blocks in source order
    pub fn blocks(&self) -> impl Iterator<Item = &SubtitleBlock> {
        self.chunks.iter().flatten()
    }

    /// Drop every translation, leaving the document as parsed
    pub fn clear_translations(&mut self) {
        for block in self.chunks.iter_mut().flatten() {
            block.translated_content = None;
        }
    }
}

/// Split blocks greedily into chunks of at most `max_blocks`, preserving order.
///
/// Produces `ceil(len / max_blocks)` chunks; only the last one may be short.
pub fn split_into_chunks(blocks: Vec<SubtitleBlock>, max_blocks: usize) -> Vec<Vec<SubtitleBlock>> {
    if blocks.is_empty() {
        warn!("No subtitle blocks to split into chunks");
        return Vec::new();
    }

    let max_blocks = max_blocks.max(1);
    let total_blocks = blocks.len();
    let mut chunks = Vec::with_capacity(total_blocks.div_ceil(max_blocks));
    let mut current_chunk = Vec::with_capacity(max_blocks.min(total_blocks));

    for block in blocks {
        current_chunk.push(block);
        if current_chunk.len() == max_blocks {
            chunks.push(std::mem::take(&mut current_chunk));
        }
    }

    if !current_chunk.is_empty() {
        chunks.push(current_chunk);
    }

    if log::max_level() >= log::LevelFilter::Debug {
        for (i, chunk) in chunks.iter().enumerate() {
            let first = chunk.first().map(|b| b.index).unwrap_or_default();
            let last = chunk.last().map(|b| b.index).unwrap_or_default();
            debug!("Chunk {}: {} blocks (indices {}..={})", i, chunk.len(), first, last);
        }
    }

    chunks
}

/// Parse SRT format string into subtitle blocks, keeping source numbering and order
pub fn parse_srt_string(content: &str) -> Result<Vec<SubtitleBlock>, SubtitleError> {
    let content = content.strip_prefix(BOM).unwrap_or(content);
    let mut blocks = Vec::new();

    // State variables for parsing
    let mut current_index: Option<usize> = None;
    let mut current_times: Option<(u64, u64)> = None;
    let mut current_text = String::new();

    let mut flush = |index: Option<usize>, times: Option<(u64, u64)>, text: &mut String| {
        if let (Some(index), Some((start_ms, end_ms))) = (index, times) {
            if text.trim().is_empty() {
                debug!("Subtitle block {} has no text", index);
            }
            blocks.push(SubtitleBlock::new(index, start_ms, end_ms, text.trim_end()));
        }
        text.clear();
    };

    for (line_number, line) in content.lines().enumerate() {
        let trimmed = line.trim();

        // A blank line closes any timed block, including one with no text
        if trimmed.is_empty() {
            if current_times.is_some() {
                flush(current_index.take(), current_times.take(), &mut current_text);
            }
            continue;
        }

        if current_index.is_none() {
            match trimmed.parse::<usize>() {
                Ok(index) => current_index = Some(index),
                Err(_) => warn!("Unexpected text at line {} before a block number: {}", line_number + 1, trimmed),
            }
            continue;
        }

        if current_times.is_none() {
            match TIMESTAMP_REGEX.captures(trimmed) {
                Some(caps) => current_times = Some((captures_to_ms(&caps, 1), captures_to_ms(&caps, 5))),
                None => {
                    warn!("Expected a timing line at line {}, found: {}", line_number + 1, trimmed);
                    current_index = trimmed.parse::<usize>().ok();
                }
            }
            continue;
        }

        if !current_text.is_empty() {
            current_text.push('\n');
        }
        current_text.push_str(line.trim_end());
    }

    flush(current_index, current_times, &mut current_text);

    if blocks.is_empty() {
        return Err(SubtitleError::Malformed("No timed subtitle blocks were found in the content".to_string()));
    }

    let inverted = blocks.iter().filter(|b| b.end_ms <= b.start_ms).count();
    if inverted > 0 {
        debug!("{} block(s) have end time not after start time, passing through unchanged", inverted);
    }

    Ok(blocks)
}

fn captures_to_ms(caps: &regex::Captures, start_idx: usize) -> u64 {
    let part = |offset: usize| -> u64 {
        caps.get(start_idx + offset)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };

    (part(0) * 3600 + part(1) * 60 + part(2)) * 1000 + part(3)
}

/// Validates raw subtitle uploads and turns them into chunked documents
#[derive(Debug, Clone)]
pub struct SubtitleParser {
    max_blocks: usize,
    max_file_size_bytes: u64,
}

impl SubtitleParser {
    pub fn new(max_blocks: usize, max_file_size_bytes: u64) -> Self {
        Self { max_blocks, max_file_size_bytes }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.chunk_max_blocks, config.max_file_size_bytes)
    }

    pub fn max_blocks(&self) -> usize {
        self.max_blocks
    }

    /// Same input policy with a different chunk size
    pub fn with_max_blocks(&self, max_blocks: usize) -> Self {
        Self { max_blocks, ..self.clone() }
    }

    /// Reject inputs by extension, emptiness and size before any parsing
    pub fn validate_input(&self, file_name: &str, bytes: &[u8]) -> Result<(), SubtitleError> {
        if !file_name.to_lowercase().ends_with(".srt") {
            return Err(SubtitleError::InvalidInput(format!(
                "Invalid file type for '{}'. Only .srt files are accepted",
                file_name
            )));
        }

        if bytes.len() as u64 > self.max_file_size_bytes {
            return Err(SubtitleError::InvalidInput(format!(
                "File size {} exceeds the limit of {} bytes",
                bytes.len(),
                self.max_file_size_bytes
            )));
        }

        if Self::decode(bytes).trim_start_matches(BOM).trim().is_empty() {
            return Err(SubtitleError::InvalidInput("File is empty".to_string()));
        }

        Ok(())
    }

    /// Lossy UTF-8 decoding
    pub fn decode(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }

    /// Validate, parse and chunk one document
    pub fn parse(&self, file_name: &str, bytes: &[u8]) -> Result<SubtitleDocument, SubtitleError> {
        self.validate_input(file_name, bytes)?;

        let blocks = parse_srt_string(&Self::decode(bytes))?;
        let document = SubtitleDocument::from_blocks(file_name, blocks, self.max_blocks)?;

        debug!(
            "Parsed {}: {} blocks in {} chunk(s)",
            file_name,
            document.total_blocks(),
            document.chunk_count()
        );

        Ok(document)
    }
}
