/*!
 * Serialization of a translated document back into SRT.
 */

use std::fmt::Write;

use crate::subtitle_processor::SubtitleDocument;

/// Render every block in source order, falling back to the original text
/// where no translation was committed.
pub fn reassemble_to_string(document: &SubtitleDocument) -> String {
    let mut output = String::with_capacity(document.total_blocks() * 64);
    for block in document.blocks() {
        // Writing into a String cannot fail
        let _ = write!(output, "{}", block);
    }
    output
}

/// Reassembled document as UTF-8 bytes
pub fn reassemble(document: &SubtitleDocument) -> Vec<u8> {
    reassemble_to_string(document).into_bytes()
}
