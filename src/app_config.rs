use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::time::Duration;
use url::Url;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Languages a document may be translated into
    #[serde(default = "default_target_languages")]
    pub target_languages: Vec<String>,

    /// Maximum number of subtitle blocks per chunk
    #[serde(default = "default_chunk_max_blocks")]
    pub chunk_max_blocks: usize,

    /// Largest accepted subtitle file
    #[serde(default = "default_max_file_size_bytes")]
    pub max_file_size_bytes: u64,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: Local echo provider
    Mock,
    // @provider: Google Gemini
    #[default]
    Gemini,
    // @provider: OpenAI (or any OpenAI-compatible server)
    OpenAI,
    // @provider: Anthropic
    Anthropic,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Mock => "Mock",
            Self::Gemini => "Gemini",
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Mock => "mock".to_string(),
            Self::Gemini => "gemini".to_string(),
            Self::OpenAI => "openai".to_string(),
            Self::Anthropic => "anthropic".to_string(),
        }
    }

    /// Whether this provider calls an external service
    pub fn is_live(&self) -> bool {
        !matches!(self, Self::Mock)
    }
}

impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "gemini" | "google-gemini" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Speed/quality tier requested for a translation
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpeedMode {
    /// Echo translation, no external calls
    Mock,
    /// Cheaper, quicker model
    Fast,
    /// Higher quality model
    #[default]
    Normal,
}

impl SpeedMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::Fast => "fast",
            Self::Normal => "normal",
        }
    }
}

impl std::fmt::Display for SpeedMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SpeedMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "fast" => Ok(Self::Fast),
            "normal" => Ok(Self::Normal),
            _ => Err(anyhow!("Invalid speed mode: {}. Must be 'mock', 'fast', or 'normal'", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model used for fast mode
    #[serde(default = "String::new")]
    pub fast_model: String,

    // @field: Model used for normal mode
    #[serde(default = "String::new")]
    pub normal_model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Timeout seconds for a single provider call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: TranslationProvider) -> Self {
        Self {
            provider_type: provider_type.to_lowercase_string(),
            fast_model: default_fast_model(provider_type),
            normal_model: default_normal_model(provider_type),
            api_key: String::new(),
            endpoint: default_endpoint(provider_type),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Inclusive bounds of a simulated delay
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const ZERO: DelayRange = DelayRange { min_ms: 0, max_ms: 0 };

    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms: min_ms.min(max_ms), max_ms: max_ms.max(min_ms) }
    }
}

/// Latency the mock provider simulates per speed mode
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct MockLatencyConfig {
    #[serde(default = "default_mock_mode_delay")]
    pub mock: DelayRange,

    #[serde(default = "default_mock_fast_delay")]
    pub fast: DelayRange,

    #[serde(default = "default_mock_normal_delay")]
    pub normal: DelayRange,
}

impl MockLatencyConfig {
    /// No simulated latency at all
    pub fn instant() -> Self {
        Self { mock: DelayRange::ZERO, fast: DelayRange::ZERO, normal: DelayRange::ZERO }
    }

    pub fn for_mode(&self, mode: SpeedMode) -> DelayRange {
        match mode {
            SpeedMode::Mock => self.mock,
            SpeedMode::Fast => self.fast,
            SpeedMode::Normal => self.normal,
        }
    }
}

impl Default for MockLatencyConfig {
    fn default() -> Self {
        Self {
            mock: default_mock_mode_delay(),
            fast: default_mock_fast_delay(),
            normal: default_mock_normal_delay(),
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Translation provider to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Available translation providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Common translation settings
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

/// Common translation settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// Attempts per chunk or context detection, including the first
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,

    /// Fixed wait between two attempts in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Provider calls allowed in flight across the whole process
    #[serde(default = "default_max_concurrent_translations")]
    pub max_concurrent_translations: usize,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Simulated latency of the mock provider
    #[serde(default)]
    pub mock_latency: MockLatencyConfig,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            retry_max_attempts: default_retry_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            max_concurrent_translations: default_max_concurrent_translations(),
            temperature: default_temperature(),
            mock_latency: MockLatencyConfig::default(),
        }
    }
}

impl TranslationCommonConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_target_languages() -> Vec<String> {
    vec!["Vietnamese".to_string(), "French".to_string()]
}

fn default_chunk_max_blocks() -> usize {
    100
}

fn default_max_file_size_bytes() -> u64 {
    2 * 1024 * 1024
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_retry_max_attempts() -> u32 {
    4
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_max_concurrent_translations() -> usize {
    10
}

fn default_temperature() -> f32 {
    0.3
}

fn default_mock_mode_delay() -> DelayRange {
    DelayRange::new(50, 150)
}

fn default_mock_fast_delay() -> DelayRange {
    DelayRange::new(500, 800)
}

fn default_mock_normal_delay() -> DelayRange {
    DelayRange::new(800, 1300)
}

fn default_endpoint(provider: TranslationProvider) -> String {
    match provider {
        TranslationProvider::Mock => String::new(),
        TranslationProvider::Gemini => "https://generativelanguage.googleapis.com/v1beta".to_string(),
        TranslationProvider::OpenAI => "https://api.openai.com/v1".to_string(),
        TranslationProvider::Anthropic => "https://api.anthropic.com".to_string(),
    }
}

fn default_fast_model(provider: TranslationProvider) -> String {
    match provider {
        TranslationProvider::Mock => "mock".to_string(),
        TranslationProvider::Gemini => "gemini-2.5-flash".to_string(),
        TranslationProvider::OpenAI => "gpt-4o-mini".to_string(),
        TranslationProvider::Anthropic => "claude-3-5-haiku-latest".to_string(),
    }
}

fn default_normal_model(provider: TranslationProvider) -> String {
    match provider {
        TranslationProvider::Mock => "mock".to_string(),
        TranslationProvider::Gemini => "gemini-2.5-pro".to_string(),
        TranslationProvider::OpenAI => "gpt-4o".to_string(),
        TranslationProvider::Anthropic => "claude-3-5-sonnet-latest".to_string(),
    }
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.chunk_max_blocks == 0 {
            return Err(anyhow!("chunk_max_blocks must be greater than zero"));
        }

        if self.max_file_size_bytes == 0 {
            return Err(anyhow!("max_file_size_bytes must be greater than zero"));
        }

        let common = &self.translation.common;
        if common.retry_max_attempts == 0 {
            return Err(anyhow!("retry_max_attempts must be at least 1"));
        }
        if common.max_concurrent_translations == 0 {
            return Err(anyhow!("max_concurrent_translations must be greater than zero"));
        }

        if self.translation.provider.is_live() && self.translation.get_api_key().is_empty() {
            return Err(anyhow!(
                "Translation API key is required for {} provider",
                self.translation.provider.display_name()
            ));
        }

        if self.translation.provider.is_live() {
            let endpoint = self.translation.get_endpoint();
            Url::parse(&endpoint)
                .map_err(|e| anyhow!("Invalid endpoint '{}' for {} provider: {}", endpoint, self.translation.provider.display_name(), e))?;
        }

        Ok(())
    }

    /// Target languages, falling back to the defaults when none are configured
    pub fn effective_target_languages(&self) -> Vec<String> {
        let languages: Vec<String> = self.target_languages.iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();

        if languages.is_empty() {
            default_target_languages()
        } else {
            languages
        }
    }

    /// Replace the allow-list from a comma separated value such as `TARGET_LANGUAGES`
    pub fn set_target_languages_from_csv(&mut self, csv: &str) {
        self.target_languages = csv.split(',')
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            target_languages: default_target_languages(),
            chunk_max_blocks: default_chunk_max_blocks(),
            max_file_size_bytes: default_max_file_size_bytes(),
            translation: TranslationConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &TranslationProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers.iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Mutable access to the active provider configuration, inserting defaults when absent
    pub fn active_provider_config_mut(&mut self) -> &mut ProviderConfig {
        let provider_str = self.provider.to_lowercase_string();
        if let Some(pos) = self.available_providers.iter().position(|p| p.provider_type == provider_str) {
            return &mut self.available_providers[pos];
        }
        self.available_providers.push(ProviderConfig::new(self.provider));
        let last = self.available_providers.len() - 1;
        &mut self.available_providers[last]
    }

    /// Get the model for the active provider and speed mode
    pub fn get_model(&self, mode: SpeedMode) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            let model = match mode {
                SpeedMode::Fast => &provider_config.fast_model,
                SpeedMode::Normal | SpeedMode::Mock => &provider_config.normal_model,
            };
            if !model.is_empty() {
                return model.clone();
            }
        }

        match mode {
            SpeedMode::Fast => default_fast_model(self.provider),
            SpeedMode::Normal | SpeedMode::Mock => default_normal_model(self.provider),
        }
    }

    /// Get the API key for the active provider
    pub fn get_api_key(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.api_key.is_empty() {
                return provider_config.api_key.clone();
            }
        }

        String::new()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.endpoint.is_empty() {
                return provider_config.endpoint.clone();
            }
        }

        default_endpoint(self.provider)
    }

    /// Get the per-call timeout for the active provider
    pub fn get_timeout(&self) -> Duration {
        let secs = self.get_active_provider_config()
            .map(|p| p.timeout_secs)
            .filter(|secs| *secs > 0)
            .unwrap_or_else(default_timeout_secs);
        Duration::from_secs(secs)
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            available_providers: vec![
                ProviderConfig::new(TranslationProvider::Gemini),
                ProviderConfig::new(TranslationProvider::OpenAI),
                ProviderConfig::new(TranslationProvider::Anthropic),
            ],
            common: TranslationCommonConfig::default(),
        }
    }
}
