use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::Path;
use url::Url;

use crate::review::augment::{AugmentSettings, MAX_SEARCH_QUERIES};
use crate::review::keywords::KeywordSettings;
use crate::review::pipeline::ReviewSettings;
use crate::review::prompt::{DEFAULT_PROMPT_SOFT_LIMIT, DEFAULT_REVIEW_TEMPLATE};
use crate::review::sanitizer::SanitizePolicy;
use crate::review::streamer::DEFAULT_REVIEW_MAX_TOKENS;

/// Application configuration module
/// This module handles loading, validating and saving the configuration,
/// and derives the per-request review settings from it.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Model provider settings
    #[serde(default)]
    pub model: ModelConfig,

    /// Review prompt and call settings
    #[serde(default)]
    pub review: ReviewConfig,

    /// Keyword extraction settings
    #[serde(default)]
    pub keywords: KeywordSettings,

    /// Web search settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Model provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    // @provider: Anthropic
    #[default]
    Anthropic,
    // @provider: OpenAI
    OpenAI,
    // @provider: LM Studio (OpenAI-compatible local server)
    LMStudio,
}

impl ModelProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Anthropic => "Anthropic",
            Self::OpenAI => "OpenAI",
            Self::LMStudio => "LM Studio",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Anthropic => "anthropic".to_string(),
            Self::OpenAI => "openai".to_string(),
            Self::LMStudio => "lmstudio".to_string(),
        }
    }

    // @returns: Environment variable holding the API key, if the provider needs one
    pub fn api_key_env_var(&self) -> Option<&'static str> {
        match self {
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::OpenAI => Some("OPENAI_API_KEY"),
            Self::LMStudio => None,
        }
    }

    // @returns: Whether requests go to a hosted API that needs a key
    pub fn requires_api_key(&self) -> bool {
        self.api_key_env_var().is_some()
    }
}

impl std::fmt::Display for ModelProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for ModelProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "anthropic" => Ok(Self::Anthropic),
            "openai" => Ok(Self::OpenAI),
            "lmstudio" => Ok(Self::LMStudio),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Review model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: Keyword extraction model name; empty means the review model
    #[serde(default = "String::new")]
    pub keyword_model: String,

    // @field: API key; empty means the provider's environment variable
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: ModelProvider) -> Self {
        match provider_type {
            ModelProvider::Anthropic => Self {
                provider_type: "anthropic".to_string(),
                model: default_anthropic_model(),
                keyword_model: default_anthropic_keyword_model(),
                api_key: String::new(),
                endpoint: default_anthropic_endpoint(),
                timeout_secs: default_timeout_secs(),
            },
            ModelProvider::OpenAI => Self {
                provider_type: "openai".to_string(),
                model: default_openai_model(),
                keyword_model: default_openai_keyword_model(),
                api_key: String::new(),
                endpoint: default_openai_endpoint(),
                timeout_secs: default_timeout_secs(),
            },
            ModelProvider::LMStudio => Self {
                provider_type: "lmstudio".to_string(),
                model: default_lmstudio_model(),
                keyword_model: String::new(),
                api_key: String::new(),
                endpoint: default_lmstudio_endpoint(),
                timeout_secs: default_lmstudio_timeout_secs(),
            },
        }
    }
}

/// Model selection
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ModelConfig {
    /// Provider to use
    #[serde(default)]
    pub provider: ModelProvider,

    /// Available providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,
}

/// Review prompt and call settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ReviewConfig {
    /// Template override; `None` means the built-in template
    /// Placeholder: {document_text}
    #[serde(default)]
    pub template: Option<String>,

    /// Template file, read when `template` is not set
    #[serde(default)]
    pub template_path: Option<String>,

    /// Output token budget of the review call
    #[serde(default = "default_review_max_tokens")]
    pub max_tokens: u32,

    /// Prompt length above which a warning is shown
    #[serde(default = "default_prompt_soft_limit")]
    pub prompt_soft_limit: usize,

    /// Sanitization policy for document and search text
    #[serde(default)]
    pub sanitizer: SanitizePolicy,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            template: None,
            template_path: None,
            max_tokens: default_review_max_tokens(),
            prompt_soft_limit: default_prompt_soft_limit(),
            sanitizer: SanitizePolicy::default(),
        }
    }
}

/// Web search settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SearchConfig {
    /// Search API key; empty means TAVILY_API_KEY
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Search endpoint; empty means the public API
    #[serde(default = "String::new")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_search_timeout_secs")]
    pub timeout_secs: u64,

    /// Query and block settings, stored inline in the `search` object
    #[serde(flatten)]
    pub augment: AugmentSettings,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: String::new(),
            timeout_secs: default_search_timeout_secs(),
            augment: AugmentSettings::default(),
        }
    }
}

impl SearchConfig {
    /// Get the API key, falling back to the environment
    pub fn get_api_key(&self) -> String {
        if !self.api_key.is_empty() {
            return self.api_key.clone();
        }
        std::env::var("TAVILY_API_KEY").unwrap_or_default()
    }

    /// Whether search augmentation runs
    pub fn is_enabled(&self) -> bool {
        self.augment.enabled
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
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
    /// Matching `log` level filter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_lmstudio_timeout_secs() -> u64 {
    // Local models can be slow on long documents
    300
}

fn default_search_timeout_secs() -> u64 {
    30
}

fn default_review_max_tokens() -> u32 {
    DEFAULT_REVIEW_MAX_TOKENS
}

fn default_prompt_soft_limit() -> usize {
    DEFAULT_PROMPT_SOFT_LIMIT
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_anthropic_endpoint() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_lmstudio_endpoint() -> String {
    // LM Studio default server (OpenAI compatible) runs on port 1234 under /v1
    "http://localhost:1234/v1".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-5-sonnet-latest".to_string()
}

fn default_anthropic_keyword_model() -> String {
    "claude-3-5-haiku-latest".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o".to_string()
}

fn default_openai_keyword_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_lmstudio_model() -> String {
    // Placeholder; users should set to the loaded model name in LM Studio
    "local-model".to_string()
}

impl Config {
    /// Load a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        std::fs::write(path, json).with_context(|| format!("Failed to write config to file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let provider = self.model.provider;

        if provider.requires_api_key() && self.model.get_api_key().is_empty() {
            return Err(anyhow!(
                "API key is required for {} provider (set it in the config or {})",
                provider.display_name(),
                provider.api_key_env_var().unwrap_or_default()
            ));
        }

        if self.model.get_model().trim().is_empty() {
            return Err(anyhow!("Model name is empty for {} provider", provider.display_name()));
        }

        validate_endpoint(&self.model.get_endpoint())?;

        if !matches!(self.keywords.max_keywords, 3 | 5) {
            return Err(anyhow!(
                "keywords.max_keywords must be 3 or 5, got {}",
                self.keywords.max_keywords
            ));
        }

        if self.keywords.fallback.iter().all(|k| k.trim().is_empty()) {
            return Err(anyhow!("keywords.fallback must contain at least one keyword"));
        }

        let augment = &self.search.augment;
        if !(1..=MAX_SEARCH_QUERIES).contains(&augment.max_queries) {
            return Err(anyhow!(
                "search.max_queries must be between 1 and {}, got {}",
                MAX_SEARCH_QUERIES,
                augment.max_queries
            ));
        }

        if !matches!(augment.max_hits, 5 | 10) {
            return Err(anyhow!("search.max_hits must be 5 or 10, got {}", augment.max_hits));
        }

        if self.search.is_enabled() {
            validate_endpoint(&self.search.endpoint)?;
        }

        if let Some(template) = &self.review.template {
            crate::review::prompt::PromptTemplate::parse(template).context("Invalid review template")?;
        }

        Ok(())
    }

    /// Resolve the review template: inline override, then file, then built-in
    pub fn resolve_template(&self) -> Result<String> {
        if let Some(template) = &self.review.template {
            return Ok(template.clone());
        }
        if let Some(path) = &self.review.template_path {
            return std::fs::read_to_string(path).with_context(|| format!("Failed to read template file: {}", path));
        }
        Ok(DEFAULT_REVIEW_TEMPLATE.to_string())
    }

    /// Build the request-scoped settings for one review
    pub fn review_settings(&self) -> Result<ReviewSettings> {
        Ok(ReviewSettings {
            template: self.resolve_template()?,
            review_model: self.model.get_model(),
            keyword_model: self.model.get_keyword_model(),
            max_tokens: self.review.max_tokens,
            prompt_soft_limit: self.review.prompt_soft_limit,
            sanitizer: self.review.sanitizer,
            keywords: self.keywords.clone(),
            search: self.search.augment.clone(),
        })
    }
}

fn validate_endpoint(endpoint: &str) -> Result<()> {
    if endpoint.is_empty() {
        return Ok(());
    }
    Url::parse(endpoint).with_context(|| format!("Invalid endpoint URL: {}", endpoint))?;
    Ok(())
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            model: ModelConfig::default(),
            review: ReviewConfig::default(),
            keywords: KeywordSettings::default(),
            search: SearchConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl ModelConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &ModelProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers
            .iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Mutable access to the active provider configuration, created if missing
    pub fn active_provider_config_mut(&mut self) -> &mut ProviderConfig {
        let provider_str = self.provider.to_lowercase_string();
        let index = match self
            .available_providers
            .iter()
            .position(|p| p.provider_type == provider_str)
        {
            Some(index) => index,
            None => {
                self.available_providers.push(ProviderConfig::new(self.provider));
                self.available_providers.len() - 1
            }
        };
        &mut self.available_providers[index]
    }

    /// Get the review model for the active provider
    pub fn get_model(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.model.is_empty() {
                return provider_config.model.clone();
            }
        }

        match self.provider {
            ModelProvider::Anthropic => default_anthropic_model(),
            ModelProvider::OpenAI => default_openai_model(),
            ModelProvider::LMStudio => default_lmstudio_model(),
        }
    }

    /// Get the keyword model for the active provider, defaulting to the review model
    pub fn get_keyword_model(&self) -> String {
        match self.get_active_provider_config() {
            Some(provider_config) if !provider_config.keyword_model.is_empty() => {
                provider_config.keyword_model.clone()
            }
            _ => self.get_model(),
        }
    }

    /// Get the API key for the active provider, falling back to the environment
    pub fn get_api_key(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.api_key.is_empty() {
                return provider_config.api_key.clone();
            }
        }

        self.provider
            .api_key_env_var()
            .and_then(|var| std::env::var(var).ok())
            .unwrap_or_default()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.endpoint.is_empty() {
                return provider_config.endpoint.clone();
            }
        }

        match self.provider {
            ModelProvider::Anthropic => default_anthropic_endpoint(),
            ModelProvider::OpenAI => default_openai_endpoint(),
            ModelProvider::LMStudio => default_lmstudio_endpoint(),
        }
    }

    /// Get the request timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        self.get_active_provider_config()
            .map(|p| p.timeout_secs)
            .filter(|secs| *secs > 0)
            .unwrap_or_else(default_timeout_secs)
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: ModelProvider::default(),
            available_providers: vec![
                ProviderConfig::new(ModelProvider::Anthropic),
                ProviderConfig::new(ModelProvider::OpenAI),
                ProviderConfig::new(ModelProvider::LMStudio),
            ],
        }
    }
}
