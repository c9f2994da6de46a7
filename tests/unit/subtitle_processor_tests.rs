/*!
 * Tests for subtitle parsing and chunking
 */

use std::fmt::Write;

use subtranslator::errors::SubtitleError;
use subtranslator::subtitle_processor::{
    parse_srt_string, split_into_chunks, SubtitleBlock, SubtitleDocument, SubtitleParser,
};
use crate::common;

/// Test timestamp parsing and formatting
#[test]
fn test_timestamp_parsing_withValidTimestamp_shouldParseAndFormat() {
    let ts = "01:23:45,678";
    let ms = SubtitleBlock::parse_timestamp(ts).unwrap();
    assert_eq!(ms, 5025678);

    let formatted = SubtitleBlock::format_timestamp(ms);
    assert_eq!(formatted, ts);
}

#[test]
fn test_timestamp_parsing_withOutOfRangeComponents_shouldFail() {
    assert!(SubtitleBlock::parse_timestamp("00:61:00,000").is_err());
    assert!(SubtitleBlock::parse_timestamp("00:00:00").is_err());
    assert!(SubtitleBlock::parse_timestamp("aa:00:00,000").is_err());
}

/// Test subtitle block display formatting
#[test]
fn test_subtitle_block_display_withTranslation_shouldEmitTranslatedText() {
    let mut block = SubtitleBlock::new(12, 5000, 10000, "Test subtitle");
    block.translated_content = Some("Sous-titre".to_string());

    let mut output = String::new();
    write!(output, "{}", block).unwrap();

    assert_eq!(output, "12\n00:00:05,000 --> 00:00:10,000\nSous-titre\n\n");
}

#[test]
fn test_parse_srt_string_shouldKeepSourceNumberingAndMultilineText() {
    let content = "5\n00:00:01,000 --> 00:00:02,000\nFirst line\nSecond line\n\n9\n00:00:03,000 --> 00:00:04,000\nNext\n";
    let blocks = parse_srt_string(content).unwrap();

    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].index, 5);
    assert_eq!(blocks[0].content, "First line\nSecond line");
    assert_eq!(blocks[1].index, 9);
    assert_eq!((blocks[1].start_ms, blocks[1].end_ms), (3000, 4000));
    assert!(blocks.iter().all(|b| b.translated_content.is_none()));
}

#[test]
fn test_parse_srt_string_withBomAndCrlf_shouldParse() {
    let content = "\u{feff}1\r\n00:00:01,000 --> 00:00:02,000\r\nHello\r\n\r\n2\r\n00:00:03,000 --> 00:00:04,000\r\nWorld\r\n";
    let blocks = parse_srt_string(content).unwrap();

    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].content, "Hello");
    assert_eq!(blocks[1].content, "World");
}

#[test]
fn test_parse_srt_string_withNoTimedBlocks_shouldBeMalformed() {
    let result = parse_srt_string("just some text\nwithout any timing\n");
    assert!(matches!(result, Err(SubtitleError::Malformed(_))));
}

#[test]
fn test_parse_srt_string_withInvertedTiming_shouldPassThrough() {
    let blocks = parse_srt_string("1\n00:00:05,000 --> 00:00:01,000\nBackwards\n").unwrap();
    assert_eq!((blocks[0].start_ms, blocks[0].end_ms), (5000, 1000));
}

/// Chunks partition the document exactly, in order, with ceil(n / max) chunks
#[test]
fn test_split_into_chunks_shouldPartitionInOrder() {
    for total in [1usize, 2, 3, 7, 10, 25, 101] {
        for max_blocks in [1usize, 2, 3, 10, 100] {
            let blocks = parse_srt_string(&common::numbered_srt(total)).unwrap();
            let original = blocks.clone();

            let chunks = split_into_chunks(blocks, max_blocks);

            assert_eq!(chunks.len(), total.div_ceil(max_blocks), "total={} max={}", total, max_blocks);
            assert_eq!(chunks.iter().map(Vec::len).sum::<usize>(), total);
            for chunk in &chunks[..chunks.len() - 1] {
                assert_eq!(chunk.len(), max_blocks);
            }
            assert!(chunks.last().map(Vec::len).unwrap_or_default() <= max_blocks);
            assert_eq!(chunks.concat(), original);
        }
    }
}

#[test]
fn test_document_withThreeBlocksAndMaxTwo_shouldHaveTwoChunks() {
    let blocks = parse_srt_string(common::SAMPLE_SRT).unwrap();
    let document = SubtitleDocument::from_blocks("sample.srt", blocks, 2).unwrap();

    assert_eq!(document.chunk_count(), 2);
    assert_eq!(document.chunks[0].len(), 2);
    assert_eq!(document.chunks[1].len(), 1);
    assert_eq!(document.blocks().map(|b| b.index).collect::<Vec<_>>(), vec![1, 2, 3]);
}

#[test]
fn test_document_withZeroChunkSize_shouldBeInvalidInput() {
    let blocks = parse_srt_string(common::SAMPLE_SRT).unwrap();
    let result = SubtitleDocument::from_blocks("sample.srt", blocks, 0);
    assert!(matches!(result, Err(SubtitleError::InvalidInput(_))));
}

#[test]
fn test_parser_shouldApplyInputPolicy() {
    let parser = SubtitleParser::new(10, 64);

    assert!(matches!(parser.parse("notes.txt", b"1\n"), Err(SubtitleError::InvalidInput(_))));
    assert!(matches!(parser.parse("empty.srt", b"  \n\n"), Err(SubtitleError::InvalidInput(_))));
    assert!(matches!(
        parser.parse("big.srt", common::SAMPLE_SRT.as_bytes()),
        Err(SubtitleError::InvalidInput(_))
    ));
    assert!(matches!(parser.parse("prose.srt", b"no timing here"), Err(SubtitleError::Malformed(_))));
}

#[test]
fn test_parser_withUpperCaseExtensionAndInvalidUtf8_shouldParseLossily() {
    let parser = SubtitleParser::new(10, 1024);
    let mut bytes = b"1\n00:00:01,000 --> 00:00:02,000\nCaf".to_vec();
    bytes.push(0xE9);
    bytes.extend_from_slice(b"\n");

    let document = parser.parse("MOVIE.SRT", &bytes).unwrap();
    let block = document.blocks().next().unwrap();

    assert_eq!(block.content, "Caf\u{fffd}");
}

#[test]
fn test_parser_withMaxBlocksOverride_shouldKeepPolicy() {
    let parser = SubtitleParser::new(100, 1024).with_max_blocks(1);
    let document = parser.parse("sample.srt", common::SAMPLE_SRT.as_bytes()).unwrap();

    assert_eq!(parser.max_blocks(), 1);
    assert_eq!(document.chunk_count(), 3);
    assert!(parser.parse("sample.txt", common::SAMPLE_SRT.as_bytes()).is_err());
}
