/*!
 * Tests for file and directory utilities
 */

use std::path::Path;

use anyhow::Result;
use subtranslator::file_utils::FileManager;
use crate::common;

#[test]
fn test_generate_output_path_shouldAppendLowercaseLanguage() {
    let output = FileManager::generate_output_path("/movies/Episode 1.srt", None, "French");
    assert_eq!(output, Path::new("/movies/Episode 1_french.srt"));

    let output = FileManager::generate_output_path("/movies/show.srt", Some(Path::new("/out")), "Vietnamese");
    assert_eq!(output, Path::new("/out/show_vietnamese.srt"));
}

#[test]
fn test_find_files_shouldSearchRecursivelyAndSort() -> Result<()> {
    let dir = common::create_temp_dir()?;
    common::create_test_subtitle(dir.path(), "b.srt")?;
    common::create_test_subtitle(dir.path(), "season1/a.srt")?;
    common::create_test_file(dir.path(), "notes.txt", "not a subtitle")?;

    let files = FileManager::find_files(dir.path(), "srt")?;

    assert_eq!(files.len(), 2);
    assert!(files[0].ends_with("b.srt"));
    assert!(files[1].ends_with("season1/a.srt"));
    Ok(())
}

#[test]
fn test_write_bytes_shouldCreateParentDirectories() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let target = dir.path().join("nested/deeper/out.srt");

    FileManager::write_bytes(&target, common::SAMPLE_SRT.as_bytes())?;

    assert!(FileManager::file_exists(&target));
    assert!(FileManager::dir_exists(dir.path().join("nested")));
    assert_eq!(FileManager::read_bytes(&target)?, common::SAMPLE_SRT.as_bytes());
    Ok(())
}

#[test]
fn test_read_bytes_withMissingFile_shouldFail() {
    assert!(FileManager::read_bytes("/definitely/not/here.srt").is_err());
}

#[test]
fn test_file_name_of_shouldReturnLastComponent() {
    assert_eq!(FileManager::file_name_of("/a/b/movie.srt"), "movie.srt");
}
