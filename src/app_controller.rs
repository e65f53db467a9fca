use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::{Config, ModelProvider, SearchConfig};
use crate::document::{DocumentText, open_document};
use crate::errors::ReviewError;
use crate::file_utils::FileManager;
use crate::providers::Provider;
use crate::providers::anthropic::Anthropic;
use crate::providers::openai::OpenAI;
use crate::review::classifier::ErrorClassifier;
use crate::review::pipeline::{ReviewPipeline, ReviewReport, ReviewSettings};
use crate::review::streamer::ReviewOutcome;
use crate::search::SearchClient;
use crate::search::tavily::Tavily;

// @module: Application controller for document reviews

/// Per-document outcome counts of a folder run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FolderSummary {
    pub reviewed: usize,
    pub skipped: usize,
    /// Reviews whose stream failed after producing output
    pub partial: usize,
    pub failed: usize,
}

impl FolderSummary {
    /// Count the result of one `Controller::run`
    pub fn record(&mut self, result: &Result<Option<PathBuf>>) {
        match result {
            Ok(Some(_)) => self.reviewed += 1,
            Ok(None) => self.skipped += 1,
            Err(e) => match e.downcast_ref::<ReviewError>() {
                Some(ReviewError::Incomplete { .. }) => self.partial += 1,
                _ => self.failed += 1,
            },
        }
    }

    /// Every document was reviewed in full or skipped
    pub fn is_success(&self) -> bool {
        self.partial == 0 && self.failed == 0
    }
}

impl std::fmt::Display for FolderSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} reviewed, {} skipped, {} partial, {} failed",
            self.reviewed, self.skipped, self.partial, self.failed
        )
    }
}

/// Main application controller for document reviews
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Review model client, also used for the connection test
    provider: Arc<dyn Provider>,

    // @field: Review pipeline built from the configured clients
    pipeline: ReviewPipeline,
}

impl Controller {
    /// Create a new controller for test purposes with a local provider and no search
    pub fn new_for_test() -> Result<Self> {
        let mut config = Config::default();
        config.model.provider = ModelProvider::LMStudio;
        config.search.augment.enabled = false;
        Self::with_config(config)
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let provider = Self::build_provider(&config).context("Failed to initialize model client")?;
        let search_client = Self::build_search_client(&config.search).context("Failed to initialize search client")?;

        Ok(Self::from_parts(config, provider, search_client))
    }

    // @method: Create a controller from already constructed clients
    pub fn from_parts(
        config: Config,
        provider: Arc<dyn Provider>,
        search_client: Option<Arc<dyn SearchClient>>,
    ) -> Self {
        let pipeline = ReviewPipeline::new(provider.clone(), search_client);
        Self {
            config,
            provider,
            pipeline,
        }
    }

    /// Build the model client for the active provider
    pub fn build_provider(config: &Config) -> Result<Arc<dyn Provider>, ReviewError> {
        let model = &config.model;
        let api_key = model.get_api_key();

        if model.provider.requires_api_key() && api_key.is_empty() {
            return Err(ReviewError::ClientInit(format!(
                "no API key configured for {}",
                model.provider.display_name()
            )));
        }

        let provider: Arc<dyn Provider> = match model.provider {
            ModelProvider::Anthropic => Arc::new(Anthropic::with_timeout(
                api_key,
                model.get_endpoint(),
                model.get_timeout_secs(),
            )),
            ModelProvider::OpenAI | ModelProvider::LMStudio => Arc::new(OpenAI::new(
                api_key,
                model.get_endpoint(),
                model.get_timeout_secs(),
            )),
        };

        Ok(provider)
    }

    /// Build the search client; `None` when search is disabled or has no key
    pub fn build_search_client(config: &SearchConfig) -> Result<Option<Arc<dyn SearchClient>>, ReviewError> {
        if !config.is_enabled() {
            return Ok(None);
        }

        let api_key = config.get_api_key();
        if api_key.is_empty() {
            warn!("Search is enabled but no search API key is configured, reviewing without related information");
            return Ok(None);
        }

        let client = Tavily::new(api_key, config.endpoint.as_str(), config.timeout_secs)
            .map_err(|e| ReviewError::ClientInit(e.to_string()))?;
        Ok(Some(Arc::new(client)))
    }

    /// Whether reviews will be augmented with search results
    pub fn has_search(&self) -> bool {
        self.pipeline.has_search()
    }

    /// Review settings derived from the configuration
    pub fn review_settings(&self) -> Result<ReviewSettings> {
        self.config.review_settings()
    }

    /// Extract a document and return its preview text
    pub fn preview(input_file: &Path) -> Result<String> {
        Ok(Self::extract_document(input_file)?.preview())
    }

    /// Verify that the review model answers
    pub async fn test_connection(&self) -> Result<()> {
        let model = self.config.model.get_model();
        self.provider.test_connection(&model).await.map_err(|e| {
            let classified = ErrorClassifier::classify(&e);
            anyhow!("Connection test failed for {}: {}", model, classified)
        })
    }

    /// Review one document and write `review_<stem>.md` into `output_dir`
    ///
    /// Returns the written path, or `None` when the review already exists.
    /// A stream that fails after producing output still writes the partial
    /// review but returns `ReviewError::Incomplete`.
    pub async fn run(
        &self,
        input_file: PathBuf,
        output_dir: PathBuf,
        force_overwrite: bool,
        settings: &ReviewSettings,
    ) -> Result<Option<PathBuf>> {
        let start_time = std::time::Instant::now();

        if !FileManager::file_exists(&input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let output_path = FileManager::generate_output_path(&input_file, &output_dir);
        if output_path.exists() && !force_overwrite {
            warn!("Skipping file, review already exists (use -f to force overwrite)");
            return Ok(None);
        }

        let document = Self::extract_document(&input_file)?;
        info!(
            "Extracted {} characters from {}",
            document.char_count(),
            input_file.display()
        );

        let report = self.review_with_spinner(&input_file, &document, settings).await?;
        self.log_report(&report);

        FileManager::write_to_file(&output_path, report.text())?;

        if let ReviewOutcome::Partial { failure, .. } = report.outcome {
            return Err(ReviewError::Incomplete {
                path: output_path,
                failure,
            }
            .into());
        }

        info!(
            "Success: {} ({})",
            output_path.display(),
            Self::format_duration(start_time.elapsed())
        );

        Ok(Some(output_path))
    }

    /// Review every PDF in a directory; each review lands next to its document
    /// unless `output_dir` is given
    pub async fn run_folder(
        &self,
        input_dir: PathBuf,
        output_dir: Option<PathBuf>,
        force_overwrite: bool,
        settings: &ReviewSettings,
    ) -> Result<FolderSummary> {
        let start_time = std::time::Instant::now();

        if !FileManager::dir_exists(&input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let documents = FileManager::find_documents(&input_dir)?;
        if documents.is_empty() {
            return Err(anyhow!("No PDF files found in directory: {:?}", input_dir));
        }

        self.test_connection().await?;

        let mut summary = FolderSummary::default();

        for (index, document) in documents.iter().enumerate() {
            info!("[{}/{}] {}", index + 1, documents.len(), document.display());

            let target_dir = output_dir
                .clone()
                .or_else(|| document.parent().map(Path::to_path_buf))
                .unwrap_or_else(|| input_dir.clone());

            let result = self
                .run(document.clone(), target_dir, force_overwrite, settings)
                .await;
            if let Err(e) = &result {
                error!("Error processing {}: {}", document.display(), e);
            }
            summary.record(&result);
        }

        info!(
            "Finished {} documents in {}: {}",
            documents.len(),
            Self::format_duration(start_time.elapsed()),
            summary
        );

        Ok(summary)
    }

    fn extract_document(input_file: &Path) -> Result<DocumentText> {
        let source = open_document(input_file)?;
        let document = source.extract()?;
        if document.is_blank() {
            return Err(ReviewError::Extraction(format!(
                "No text could be extracted from {}",
                input_file.display()
            ))
            .into());
        }
        Ok(document)
    }

    async fn review_with_spinner(
        &self,
        input_file: &Path,
        document: &DocumentText,
        settings: &ReviewSettings,
    ) -> Result<ReviewReport> {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.set_message(format!(
            "Reviewing {} with {} - {}",
            input_file.file_name().map(|f| f.to_string_lossy()).unwrap_or_default(),
            self.config.model.provider.display_name(),
            settings.review_model
        ));
        spinner.enable_steady_tick(Duration::from_millis(100));

        let mut stdout = std::io::stdout();
        let result = self
            .pipeline
            .run(document.as_str(), settings, |delta| {
                if !spinner.is_finished() {
                    spinner.finish_and_clear();
                }
                let _ = write!(stdout, "{}", delta);
                let _ = stdout.flush();
            })
            .await;

        spinner.finish_and_clear();
        println!();

        result.map_err(|e| match e {
            ReviewError::Upstream(classified) => anyhow!("Review failed: {}", classified),
            other => anyhow::Error::new(other),
        })
    }

    fn log_report(&self, report: &ReviewReport) {
        if let Some(keywords) = &report.keywords {
            if keywords.is_fallback() {
                warn!("Keyword extraction fell back to: {}", keywords.keywords().join(", "));
            } else {
                info!("Search keywords: {}", keywords.keywords().join(", "));
            }
        }

        for failure in &report.augmentation.failures {
            warn!("Search skipped for '{}': {}", failure.keyword, failure.error.remedy());
        }

        if let Some(warning) = &report.prompt.warning {
            warn!("Large prompt: {}", warning);
        }
    }

    // Format duration in a human-readable format (HH:MM:SS)
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
