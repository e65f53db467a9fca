/*!
 * Common test utilities for the bucho test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use bucho::app_config::{Config, ModelProvider};
use bucho::search::SearchRecord;

/// Sample approval document used across tests
pub const SAMPLE_DOCUMENT: &str = "予算500万円のシステム導入";

/// Routes library log output through the test harness; safe to call repeatedly
pub fn init_test_logging() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Configuration for a local provider that needs no API key, with search off
pub fn local_config() -> Config {
    let mut config = Config::default();
    config.model.provider = ModelProvider::LMStudio;
    config.search.augment.enabled = false;
    config
}

/// A search record with predictable content
pub fn search_record(title: &str, content: &str, url: &str) -> SearchRecord {
    SearchRecord {
        title: title.to_string(),
        content: content.to_string(),
        url: url.to_string(),
    }
}

/// Owned keyword list from string slices
pub fn keywords(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}
