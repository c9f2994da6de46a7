/*!
 * Application controller used by the command line front-end.
 *
 * Wraps a `TranslationService` with file handling: reading inputs, naming
 * and writing outputs, progress bars, and folder runs where every document
 * shares the service's concurrency limiter.
 */

use anyhow::{anyhow, Context, Result};
use futures::future::join_all;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::app_config::{Config, SpeedMode};
use crate::file_utils::FileManager;
use crate::translation::{
    ConcurrencyLimiter, ProgressCallback, TranslationRequest, TranslationService, TranslationStats,
};

/// Per-run options coming from the command line
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub target_language: String,
    pub mode: SpeedMode,
    /// Directory for outputs; next to each input when absent
    pub output_dir: Option<PathBuf>,
    pub chunk_max_blocks: Option<usize>,
    pub strict: bool,
    pub force_overwrite: bool,
}

/// What happened to one input file
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Translated { output: PathBuf, stats: TranslationStats },
    Skipped { output: PathBuf },
}

/// Totals of a folder run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderSummary {
    pub translated: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Files written with at least one untranslated chunk
    pub partial: usize,
}

/// Main application controller
pub struct Controller {
    service: TranslationService,
}

impl Controller {
    /// Build a controller with its own process-wide limiter
    pub fn with_config(config: &Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        let limiter = ConcurrencyLimiter::from_config(&config.translation.common);
        Ok(Self::with_service(TranslationService::new(config, limiter)))
    }

    pub fn with_service(service: TranslationService) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &TranslationService {
        &self.service
    }

    /// Check the provider serving `mode`
    pub async fn test_connection(&self, mode: SpeedMode) -> Result<()> {
        self.service
            .test_connection(mode)
            .await
            .map_err(|e| anyhow!("Connection test failed: {}", e))?;
        info!("Connection test succeeded [{} mode]", mode);
        Ok(())
    }

    /// Translate one file
    pub async fn run(&self, input_file: &Path, options: &RunOptions) -> Result<FileOutcome> {
        let multi_progress = MultiProgress::new();
        self.translate_file(input_file, options, &multi_progress).await
    }

    /// Translate every `.srt` file below `input_dir`, all documents at once
    pub async fn run_folder(&self, input_dir: &Path, options: &RunOptions) -> Result<FolderSummary> {
        let start_time = Instant::now();

        if !FileManager::dir_exists(input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let files = FileManager::find_files(input_dir, "srt")?;
        if files.is_empty() {
            return Err(anyhow!("No subtitle files found in directory: {:?}", input_dir));
        }

        info!(
            "Translating {} file(s) from {:?} with at most {} concurrent request(s)",
            files.len(),
            input_dir,
            self.service.limiter().capacity()
        );

        let multi_progress = MultiProgress::new();
        let runs = files.iter().map(|file| self.translate_file(file, options, &multi_progress));
        let results = join_all(runs).await;

        let mut summary = FolderSummary::default();
        for (file, result) in files.iter().zip(results) {
            match result {
                Ok(FileOutcome::Translated { stats, .. }) => {
                    summary.translated += 1;
                    if !stats.is_complete() {
                        summary.partial += 1;
                    }
                }
                Ok(FileOutcome::Skipped { .. }) => summary.skipped += 1,
                Err(e) => {
                    error!("Failed to translate {:?}: {:#}", file, e);
                    summary.failed += 1;
                }
            }
        }

        info!(
            "Folder done in {:.1?}: {} translated ({} partial), {} skipped, {} failed",
            start_time.elapsed(),
            summary.translated,
            summary.partial,
            summary.skipped,
            summary.failed
        );

        Ok(summary)
    }

    async fn translate_file(
        &self,
        input_file: &Path,
        options: &RunOptions,
        multi_progress: &MultiProgress,
    ) -> Result<FileOutcome> {
        if !FileManager::file_exists(input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let file_name = FileManager::file_name_of(input_file);
        let content = FileManager::read_bytes(input_file)?;

        let mut request = TranslationRequest::new(&file_name, content, &options.target_language, options.mode);
        request.chunk_max_blocks = options.chunk_max_blocks;
        request.fail_on_chunk_failure = options.strict;

        // Name the output after the allow-list spelling so "fr" and "French" agree
        let language = crate::language_utils::resolve_target_language(
            &options.target_language,
            self.service.target_languages(),
        )?;
        let output = FileManager::generate_output_path(input_file, options.output_dir.as_deref(), &language);

        if FileManager::file_exists(&output) && !options.force_overwrite {
            warn!("Skipping {}, {:?} already exists (use -f to force overwrite)", file_name, output);
            return Ok(FileOutcome::Skipped { output });
        }

        let progress_bar = multi_progress.add(ProgressBar::new(0));
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar.set_message(file_name.clone());

        let bar = progress_bar.clone();
        let progress: ProgressCallback = Arc::new(move |completed, total| {
            bar.set_length(total as u64);
            bar.set_position(completed as u64);
        });

        let result = self.service.translate_with_progress(request, Some(progress)).await;
        progress_bar.finish_and_clear();
        let result = result.with_context(|| format!("Translation of {} failed", file_name))?;

        FileManager::write_bytes(&output, &result.content)?;

        let stats = result.stats;
        if stats.is_complete() {
            info!("Success: {:?} ({} blocks, {} retries)", output, stats.total_blocks, stats.total_failed_attempts);
        } else {
            warn!(
                "Wrote {:?} with {} of {} chunk(s) left untranslated",
                output, stats.chunks_with_failures, stats.total_chunks
            );
        }

        Ok(FileOutcome::Translated { output, stats })
    }
}
