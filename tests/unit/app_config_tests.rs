/*!
 * Tests for app configuration
 */

use anyhow::Result;
use std::str::FromStr;

use bucho::app_config::{Config, LogLevel, ModelProvider, ProviderConfig};
use bucho::review::prompt::DEFAULT_REVIEW_TEMPLATE;
use bucho::review::sanitizer::SanitizePolicy;
use bucho::search::SearchDepth;

use crate::common;

fn config_with_key(provider: ModelProvider) -> Config {
    let mut config = Config::default();
    config.model.provider = provider;
    config.model.active_provider_config_mut().api_key = "test-key".to_string();
    config.search.augment.enabled = false;
    config
}

#[test]
fn test_default_config_shouldUseAnthropicWithDocumentedDefaults() {
    let config = Config::default();

    assert_eq!(config.model.provider, ModelProvider::Anthropic);
    assert_eq!(config.model.available_providers.len(), 3);
    assert_eq!(config.model.get_model(), "claude-3-5-sonnet-latest");
    assert_eq!(config.model.get_keyword_model(), "claude-3-5-haiku-latest");
    assert_eq!(config.review.max_tokens, 4000);
    assert_eq!(config.review.sanitizer, SanitizePolicy::AllowList);
    assert_eq!(config.keywords.max_keywords, 3);
    assert_eq!(config.search.augment.max_hits, 5);
    assert_eq!(config.search.augment.search_depth, SearchDepth::Basic);
    assert!(config.search.augment.enabled);
    assert_eq!(config.log_level, LogLevel::Info);
}

#[test]
fn test_model_provider_fromStr_shouldBeCaseInsensitive() -> Result<()> {
    assert_eq!(ModelProvider::from_str("OpenAI")?, ModelProvider::OpenAI);
    assert_eq!(ModelProvider::from_str("lmstudio")?, ModelProvider::LMStudio);
    assert_eq!(ModelProvider::from_str("ANTHROPIC")?, ModelProvider::Anthropic);
    assert!(ModelProvider::from_str("bedrock").is_err());
    Ok(())
}

#[test]
fn test_model_provider_requiresApiKey_shouldExemptLocalServer() {
    assert!(ModelProvider::Anthropic.requires_api_key());
    assert!(ModelProvider::OpenAI.requires_api_key());
    assert!(!ModelProvider::LMStudio.requires_api_key());
    assert_eq!(ModelProvider::OpenAI.api_key_env_var(), Some("OPENAI_API_KEY"));
}

#[test]
fn test_get_keyword_model_withEmptyKeywordModel_shouldUseReviewModel() {
    let config = common::local_config();
    assert_eq!(config.model.get_keyword_model(), config.model.get_model());
    assert_eq!(config.model.get_model(), "local-model");
}

#[test]
fn test_get_endpoint_withLocalProvider_shouldUseLmStudioDefault() {
    let config = common::local_config();
    assert_eq!(config.model.get_endpoint(), "http://localhost:1234/v1");
    assert_eq!(config.model.get_timeout_secs(), 300);
}

#[test]
fn test_active_provider_config_mut_withMissingEntry_shouldCreateDefaults() {
    let mut config = Config::default();
    config.model.available_providers.clear();
    config.model.provider = ModelProvider::OpenAI;

    config.model.active_provider_config_mut().model = "gpt-4.1".to_string();

    assert_eq!(config.model.available_providers.len(), 1);
    assert_eq!(config.model.get_model(), "gpt-4.1");
    assert_eq!(config.model.get_keyword_model(), "gpt-4o-mini");
}

#[test]
fn test_get_api_key_withConfiguredKey_shouldPreferConfig() {
    let config = config_with_key(ModelProvider::OpenAI);
    assert_eq!(config.model.get_api_key(), "test-key");
}

#[test]
fn test_validate_withLocalProvider_shouldPass() -> Result<()> {
    common::local_config().validate()
}

#[test]
fn test_validate_withHostedProviderAndKey_shouldPass() -> Result<()> {
    config_with_key(ModelProvider::Anthropic).validate()
}

#[test]
fn test_validate_withHostedProviderAndNoKey_shouldFail() {
    // Only meaningful when the environment does not provide a key
    if std::env::var("OPENAI_API_KEY").is_ok() {
        return;
    }
    let mut config = Config::default();
    config.model.provider = ModelProvider::OpenAI;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withUnsupportedKeywordCount_shouldFail() {
    let mut config = common::local_config();
    config.keywords.max_keywords = 5;
    assert!(config.validate().is_ok());

    config.keywords.max_keywords = 4;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withEmptyFallbackKeywords_shouldFail() {
    let mut config = common::local_config();
    config.keywords.fallback = vec!["  ".to_string()];
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withUnsupportedHitCount_shouldFail() {
    let mut config = common::local_config();
    config.search.augment.max_hits = 10;
    assert!(config.validate().is_ok());

    config.search.augment.max_hits = 7;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withSearchQueriesOutOfRange_shouldFail() {
    let mut config = common::local_config();
    config.search.augment.max_queries = 1;
    assert!(config.validate().is_ok());

    config.search.augment.max_queries = 0;
    assert!(config.validate().is_err());

    config.search.augment.max_queries = 4;
    let message = config.validate().expect_err("too many queries").to_string();
    assert!(message.contains("max_queries"));
}

#[test]
fn test_search_config_serialization_shouldKeepAugmentFieldsInline() -> Result<()> {
    let mut config = common::local_config();
    config.search.augment.max_hits = 10;
    config.search.augment.search_depth = SearchDepth::Advanced;

    let value = serde_json::to_value(&config.search)?;
    assert_eq!(value["max_hits"], 10);
    assert_eq!(value["search_depth"], "advanced");
    assert_eq!(value["enabled"], false);
    assert!(value.get("augment").is_none());

    let parsed: bucho::app_config::SearchConfig =
        serde_json::from_str(r#"{ "api_key": "k", "max_queries": 2, "title_chars": 50 }"#)?;
    assert_eq!(parsed.augment.max_queries, 2);
    assert_eq!(parsed.augment.title_chars, 50);
    assert_eq!(parsed.augment.content_chars, 300);
    assert!(parsed.is_enabled());
    assert_eq!(parsed.timeout_secs, 30);
    Ok(())
}

#[test]
fn test_validate_withBadEndpoint_shouldFail() {
    let mut config = common::local_config();
    config.model.active_provider_config_mut().endpoint = "not a url".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withMalformedTemplate_shouldFail() {
    let mut config = common::local_config();
    config.review.template = Some("no placeholder here".to_string());
    assert!(config.validate().is_err());

    config.review.template = Some("審査: {document_text}".to_string());
    assert!(config.validate().is_ok());
}

#[test]
fn test_resolve_template_shouldPreferInlineThenFileThenBuiltIn() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let template_file = common::create_test_file(temp_dir.path(), "t.txt", "file: {document_text}")?;

    let mut config = common::local_config();
    assert_eq!(config.resolve_template()?, DEFAULT_REVIEW_TEMPLATE);

    config.review.template_path = Some(template_file.to_string_lossy().to_string());
    assert_eq!(config.resolve_template()?, "file: {document_text}");

    config.review.template = Some("inline: {document_text}".to_string());
    assert_eq!(config.resolve_template()?, "inline: {document_text}");
    Ok(())
}

#[test]
fn test_review_settings_shouldCarryConfiguredValues() -> Result<()> {
    let mut config = common::local_config();
    config.review.max_tokens = 1234;
    config.review.sanitizer = SanitizePolicy::StripControl;
    config.search.augment.max_hits = 10;

    let settings = config.review_settings()?;

    assert_eq!(settings.review_model, "local-model");
    assert_eq!(settings.keyword_model, "local-model");
    assert_eq!(settings.max_tokens, 1234);
    assert_eq!(settings.sanitizer, SanitizePolicy::StripControl);
    assert_eq!(settings.search.max_hits, 10);
    assert!(!settings.search.enabled);
    assert_eq!(settings.template, DEFAULT_REVIEW_TEMPLATE);
    Ok(())
}

#[test]
fn test_save_and_from_file_shouldPreserveConfig() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let mut config = config_with_key(ModelProvider::OpenAI);
    config.search.augment.search_depth = SearchDepth::Advanced;
    config.log_level = LogLevel::Debug;
    config.save(&path)?;

    let loaded = Config::from_file(&path)?;
    assert_eq!(loaded, config);
    Ok(())
}

#[test]
fn test_from_file_withPartialJson_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "conf.json",
        r#"{
            "model": {
                "provider": "openai",
                "available_providers": [
                    { "type": "openai", "model": "gpt-4o", "api_key": "k" }
                ]
            },
            "review": { "sanitizer": "strip_control" },
            "search": { "enabled": false }
        }"#,
    )?;

    let config = Config::from_file(&path)?;

    assert_eq!(config.model.provider, ModelProvider::OpenAI);
    assert_eq!(config.model.get_endpoint(), "https://api.openai.com/v1");
    assert_eq!(config.model.get_timeout_secs(), 120);
    assert_eq!(config.review.sanitizer, SanitizePolicy::StripControl);
    assert_eq!(config.review.max_tokens, 4000);
    assert_eq!(config.keywords.max_keywords, 3);
    assert!(!config.search.augment.enabled);
    config.validate()?;
    Ok(())
}

#[test]
fn test_from_file_withInvalidJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "conf.json", "{ not json")?;
    assert!(Config::from_file(&path).is_err());
    Ok(())
}

#[test]
fn test_provider_config_new_shouldSerializeTypeField() -> Result<()> {
    let value = serde_json::to_value(ProviderConfig::new(ModelProvider::LMStudio))?;
    assert_eq!(value["type"], "lmstudio");
    assert_eq!(value["model"], "local-model");
    Ok(())
}

#[test]
fn test_log_level_toLevelFilter_shouldMapEachLevel() {
    assert_eq!(LogLevel::Error.to_level_filter(), log::LevelFilter::Error);
    assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
}
