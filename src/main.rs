// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, warn};
use std::io::Write;
use std::path::{Path, PathBuf};

use bucho::app_config::{Config, LogLevel, ModelProvider};
use bucho::app_controller::Controller;
use bucho::review::prompt::DEFAULT_REVIEW_TEMPLATE;

/// CLI Wrapper for ModelProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliModelProvider {
    Anthropic,
    #[value(name = "openai")]
    OpenAI,
    #[value(name = "lmstudio")]
    LMStudio,
}

impl From<CliModelProvider> for ModelProvider {
    fn from(cli_provider: CliModelProvider) -> Self {
        match cli_provider {
            CliModelProvider::Anthropic => ModelProvider::Anthropic,
            CliModelProvider::OpenAI => ModelProvider::OpenAI,
            CliModelProvider::LMStudio => ModelProvider::LMStudio,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Review a document or every PDF in a directory (default command)
    #[command(alias = "r")]
    Review(ReviewArgs),

    /// Show the first characters of the text extracted from a document
    Preview {
        /// Document to extract
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Print the built-in review template
    Template,

    /// Generate shell completions for bucho
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone)]
struct ReviewArgs {
    /// Input PDF or text file, or a directory of PDFs
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Force overwrite of existing review files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Review without web search augmentation
    #[arg(long)]
    no_search: bool,

    /// Template file to use instead of the configured one
    #[arg(long, value_name = "FILE")]
    template: Option<PathBuf>,

    /// Model provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliModelProvider>,

    /// Model name to use for the review
    #[arg(short, long)]
    model: Option<String>,

    /// Directory for review files (defaults to each document's directory)
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// Bucho - AI review of approval documents
///
/// Reviews approval documents with an AI model, optionally enriched with
/// web search results, and streams the review as it is written.
#[derive(Parser, Debug)]
#[command(name = "bucho")]
#[command(version)]
#[command(about = "AI-powered approval document review tool")]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "Bucho extracts the text of approval documents and has an AI model review them.

EXAMPLES:
    bucho request.pdf                          # Review using default config
    bucho -f request.pdf                       # Force overwrite an existing review
    bucho -p openai -m gpt-4o request.pdf      # Use specific provider and model
    bucho --no-search request.pdf              # Skip web search augmentation
    bucho --template strict.txt request.pdf    # Use a custom review template
    bucho --log-level debug /approvals/        # Review a whole directory with debug logging
    bucho preview request.pdf                  # Show the extracted text
    bucho template > my_template.txt           # Start a custom template from the default
    bucho completions bash > bucho.bash        # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically. API keys may be left empty and supplied through
    ANTHROPIC_API_KEY, OPENAI_API_KEY and TAVILY_API_KEY.

SUPPORTED PROVIDERS:
    anthropic - Anthropic Claude API (requires API key)
    openai    - OpenAI API (requires API key)
    lmstudio  - LM Studio local server (OpenAI-compatible on http://localhost:1234/v1)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    review: ReviewArgs,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI colour for log level
    fn get_colour_for_level(level: Level) -> &'static str {
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
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {} {}\x1B[0m",
                Self::get_colour_for_level(record.level()),
                now,
                Self::get_emoji_for_level(record.level()),
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
    // Initialize the logger once with info level by default
    // The level is updated after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "bucho", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Template) => {
            println!("{}", DEFAULT_REVIEW_TEMPLATE);
            Ok(())
        }
        Some(Commands::Preview { file }) => {
            println!("{}", Controller::preview(&file)?);
            Ok(())
        }
        Some(Commands::Review(args)) => run_review(args).await,
        None => run_review(cli.review).await,
    }
}

/// Load the config file, creating it with defaults when missing
fn load_or_create_config(config_path: &str) -> Result<Config> {
    if Path::new(config_path).exists() {
        return Config::from_file(config_path);
    }

    warn!("Config file not found at '{}', creating default config.", config_path);
    let config = Config::default();
    config.save(config_path)?;
    Ok(config)
}

async fn run_review(options: ReviewArgs) -> Result<()> {
    let input_path = options
        .input_path
        .clone()
        .ok_or_else(|| anyhow!("INPUT_PATH is required"))?;

    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let level: LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = load_or_create_config(&options.config_path)?;

    // Override config with CLI options if provided
    if let Some(provider) = &options.provider {
        config.model.provider = provider.clone().into();
    }

    if let Some(model) = &options.model {
        config.model.active_provider_config_mut().model = model.clone();
    }

    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    if options.no_search {
        config.search.augment.enabled = false;
    }

    config.validate().context("Configuration validation failed")?;

    // If log level was not set via command line, update it from config now
    if options.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    let controller = Controller::with_config(config)?;

    let mut settings = controller.review_settings()?;
    if let Some(template_path) = &options.template {
        let template = std::fs::read_to_string(template_path)
            .with_context(|| format!("Failed to read template file: {}", template_path.display()))?;
        settings = settings.with_template(template);
    }

    if input_path.is_file() {
        let output_dir = options
            .output_dir
            .clone()
            .or_else(|| input_path.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        controller
            .run(input_path, output_dir, options.force_overwrite, &settings)
            .await?;
    } else if input_path.is_dir() {
        let summary = controller
            .run_folder(input_path, options.output_dir.clone(), options.force_overwrite, &settings)
            .await?;
        if !summary.is_success() {
            return Err(anyhow!("Not every document was fully reviewed: {}", summary));
        }
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", input_path));
    }

    Ok(())
}
