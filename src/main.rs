// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{error, info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use subtranslator::app_config::{self, Config, SpeedMode, TranslationProvider};
use subtranslator::app_controller::{Controller, RunOptions};
use subtranslator::file_utils::FileManager;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliTranslationProvider {
    Mock,
    Gemini,
    #[value(name = "openai")]
    OpenAI,
    Anthropic,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Mock => TranslationProvider::Mock,
            CliTranslationProvider::Gemini => TranslationProvider::Gemini,
            CliTranslationProvider::OpenAI => TranslationProvider::OpenAI,
            CliTranslationProvider::Anthropic => TranslationProvider::Anthropic,
        }
    }
}

/// CLI Wrapper for SpeedMode to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliSpeedMode {
    Mock,
    Fast,
    Normal,
}

impl From<CliSpeedMode> for SpeedMode {
    fn from(mode: CliSpeedMode) -> Self {
        match mode {
            CliSpeedMode::Mock => SpeedMode::Mock,
            CliSpeedMode::Fast => SpeedMode::Fast,
            CliSpeedMode::Normal => SpeedMode::Normal,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// Options shared by every subcommand that loads the configuration
#[derive(Args, Debug, Clone)]
struct ConfigArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: PathBuf,

    /// Translation provider to use
    #[arg(short, long, value_enum, env = "AI_PROVIDER")]
    provider: Option<CliTranslationProvider>,

    /// API key for the selected provider
    #[arg(long, env = "AI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Comma separated list of allowed target languages
    #[arg(long, env = "TARGET_LANGUAGES")]
    target_languages: Option<String>,

    /// Maximum attempts per chunk, the first one included
    #[arg(long, env = "RETRY_MAX_ATTEMPTS")]
    retry_max_attempts: Option<u32>,

    /// Maximum provider calls in flight across all files
    #[arg(long, env = "MAX_CONCURRENT_TRANSLATIONS")]
    max_concurrent_translations: Option<usize>,

    /// Default number of blocks per chunk
    #[arg(long, env = "CHUNK_MAX_BLOCKS")]
    chunk_max_blocks: Option<usize>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(Args, Debug)]
struct TranslateArgs {
    /// Input .srt file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Target language, by name or ISO 639 code (must be in the allow-list)
    #[arg(short = 't', long)]
    language: String,

    /// Speed mode: mock never calls a live provider
    #[arg(short, long, value_enum, default_value = "normal")]
    mode: CliSpeedMode,

    /// Output directory (defaults to the input file's directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Blocks per chunk for this run
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Fail instead of writing a partially translated file
    #[arg(long)]
    strict: bool,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Speed mode whose model is checked
    #[arg(short, long, value_enum, default_value = "fast")]
    mode: CliSpeedMode,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a subtitle file or every subtitle file in a directory
    Translate(TranslateArgs),

    /// Test the connection to the configured provider
    Check(CheckArgs),

    /// Generate shell completions for subtranslator
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// subtranslator - chunked subtitle translation with AI providers
#[derive(Parser, Debug)]
#[command(name = "subtranslator")]
#[command(version)]
#[command(about = "AI-powered subtitle translation tool")]
#[command(long_about = "subtranslator splits SRT files into chunks and translates them concurrently using AI providers.

EXAMPLES:
    subtranslator translate movie.srt -t French              # Translate with the default config
    subtranslator translate movie.srt -t vi -m fast          # Use the provider's fast model
    subtranslator translate movie.srt -t fr -m mock          # Dry run without any API call
    subtranslator translate /subs -t French -o /out          # Translate a whole directory
    subtranslator check -p openai                            # Test the provider connection
    subtranslator completions bash > subtranslator.bash      # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. If the file does not exist,
    a default one is created. AI_PROVIDER, AI_API_KEY, TARGET_LANGUAGES,
    CHUNK_MAX_BLOCKS, RETRY_MAX_ATTEMPTS and MAX_CONCURRENT_TRANSLATIONS
    override the file.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation, filtered by the global max level
struct CustomLogger;

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Info until the configuration says otherwise
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "subtranslator", &mut std::io::stdout());
            Ok(())
        }
        Commands::Check(args) => run_check(args).await,
        Commands::Translate(args) => run_translate(args).await,
    }
}

async fn run_check(args: CheckArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let controller = Controller::with_config(&config)?;
    controller.test_connection(args.mode.into()).await
}

async fn run_translate(args: TranslateArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let controller = Controller::with_config(&config)?;

    let options = RunOptions {
        target_language: args.language.clone(),
        mode: args.mode.into(),
        output_dir: args.output.clone(),
        chunk_max_blocks: args.chunk_size,
        strict: args.strict,
        force_overwrite: args.force_overwrite,
    };

    if FileManager::file_exists(&args.input_path) {
        controller.run(&args.input_path, &options).await?;
        Ok(())
    } else if FileManager::dir_exists(&args.input_path) {
        let summary = controller.run_folder(&args.input_path, &options).await?;
        if summary.failed > 0 {
            error!("{} file(s) failed to translate", summary.failed);
            return Err(anyhow!("{} of {} file(s) failed", summary.failed, summary.failed + summary.translated + summary.skipped));
        }
        Ok(())
    } else {
        Err(anyhow!("Input path does not exist: {:?}", args.input_path))
    }
}

/// Load the configuration file, creating it with defaults when missing,
/// then apply command line and environment overrides.
fn load_config(args: &ConfigArgs) -> Result<Config> {
    if let Some(level) = args.log_level {
        let level: app_config::LogLevel = level.into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = if args.config_path.exists() {
        read_config_file(&args.config_path)?
    } else {
        warn!("Config file not found at {:?}, creating default config.", args.config_path);
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(&args.config_path, config_json)
            .with_context(|| format!("Failed to write default config to file: {:?}", args.config_path))?;
        config
    };

    apply_overrides(&mut config, args);

    if args.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    info!(
        "Using {} provider, languages: {}",
        config.translation.provider.display_name(),
        config.effective_target_languages().join(", ")
    );

    Ok(config)
}

fn read_config_file(path: &Path) -> Result<Config> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open config file: {:?}", path))?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .with_context(|| format!("Failed to parse config file: {:?}", path))
}

fn apply_overrides(config: &mut Config, args: &ConfigArgs) {
    if let Some(provider) = args.provider {
        config.translation.provider = provider.into();
    }

    if let Some(api_key) = args.api_key.as_deref().filter(|key| !key.is_empty()) {
        config.translation.active_provider_config_mut().api_key = api_key.to_string();
    }

    if let Some(languages) = &args.target_languages {
        config.set_target_languages_from_csv(languages);
    }

    if let Some(attempts) = args.retry_max_attempts {
        config.translation.common.retry_max_attempts = attempts;
    }

    if let Some(concurrency) = args.max_concurrent_translations {
        config.translation.common.max_concurrent_translations = concurrency;
    }

    if let Some(chunk_max_blocks) = args.chunk_max_blocks {
        config.chunk_max_blocks = chunk_max_blocks;
    }

    if let Some(level) = args.log_level {
        config.log_level = level.into();
    }
}
