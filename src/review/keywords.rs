/*!
 * Search keyword extraction.
 *
 * One non-streaming model call turns the head of the sanitized document into
 * a short ordered keyword list. Parsing is a tolerant line heuristic: a line
 * counts when it carries a keyword label and a `:`/`：` separator, and the
 * keyword is whatever follows the first separator.
 *
 * Extraction never fails outright. Call failures and empty parses produce the
 * configured fallback list, tagged so the caller can tell what happened.
 */

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::providers::{CompletionRequest, Provider};
use crate::review::classifier::{ClassifiedError, ErrorClassifier};

/// Labels that mark a keyword line, compared case-insensitively
const KEYWORD_LABELS: [&str; 2] = ["キーワード", "keyword"];

/// Separators between label and value
const SEPARATORS: [char; 2] = [':', '：'];

/// Settings for keyword extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordSettings {
    /// Maximum number of keywords to keep (3 or 5)
    #[serde(default = "default_max_keywords")]
    pub max_keywords: usize,

    /// Number of leading characters of the document sent to the model
    #[serde(default = "default_document_head_chars")]
    pub document_head_chars: usize,

    /// Output token budget of the extraction call
    #[serde(default = "default_keyword_max_tokens")]
    pub max_tokens: u32,

    /// Keywords used when extraction yields nothing
    #[serde(default = "default_fallback_keywords")]
    pub fallback: Vec<String>,
}

fn default_max_keywords() -> usize {
    3
}

fn default_document_head_chars() -> usize {
    1500
}

fn default_keyword_max_tokens() -> u32 {
    200
}

/// Fallback keywords used when the model gives nothing usable
pub fn default_fallback_keywords() -> Vec<String> {
    vec![
        "業務改善".to_string(),
        "コスト削減".to_string(),
        "リスク管理".to_string(),
    ]
}

impl Default for KeywordSettings {
    fn default() -> Self {
        Self {
            max_keywords: default_max_keywords(),
            document_head_chars: default_document_head_chars(),
            max_tokens: default_keyword_max_tokens(),
            fallback: default_fallback_keywords(),
        }
    }
}

/// Why the fallback list was used
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeywordFailure {
    /// The model call failed
    Upstream(ClassifiedError),
    /// The model answered but no line matched the keyword format
    NothingParsed,
}

/// Result of keyword extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeywordOutcome {
    /// Keywords parsed from the model response
    Extracted(Vec<String>),
    /// Fallback keywords, with the recoverable failure that caused them
    Fallback {
        keywords: Vec<String>,
        reason: KeywordFailure,
    },
}

impl KeywordOutcome {
    /// The keywords to search for, whichever way they were obtained
    pub fn keywords(&self) -> &[String] {
        match self {
            Self::Extracted(keywords) | Self::Fallback { keywords, .. } => keywords,
        }
    }

    /// Whether the fallback list was used
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Extracts search keywords with one model call
#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    provider: Arc<dyn Provider>,
    model: String,
    settings: KeywordSettings,
}

impl KeywordExtractor {
    /// Create an extractor that calls `model` through `provider`
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, settings: KeywordSettings) -> Self {
        Self {
            provider,
            model: model.into(),
            settings,
        }
    }

    /// Extract keywords from sanitized document text
    pub async fn extract(&self, sanitized_text: &str) -> KeywordOutcome {
        let prompt = build_keyword_prompt(sanitized_text, &self.settings);
        let request = CompletionRequest::new(self.model.as_str(), prompt, self.settings.max_tokens);

        let response = match self.provider.complete(request).await {
            Ok(response) => response,
            Err(e) => {
                let classified = ErrorClassifier::classify(&e);
                warn!("Keyword extraction failed, using fallback keywords: {}", classified);
                return self.fallback(KeywordFailure::Upstream(classified));
            }
        };

        debug!("Keyword model response: {} chars", response.chars().count());

        let keywords = parse_keywords(&response, self.settings.max_keywords);
        if keywords.is_empty() {
            warn!("No keyword lines found in model response, using fallback keywords");
            return self.fallback(KeywordFailure::NothingParsed);
        }

        info!("Extracted keywords: {}", keywords.join(", "));
        KeywordOutcome::Extracted(keywords)
    }

    fn fallback(&self, reason: KeywordFailure) -> KeywordOutcome {
        let mut keywords: Vec<String> = self
            .settings
            .fallback
            .iter()
            .take(self.settings.max_keywords)
            .cloned()
            .collect();
        if keywords.is_empty() {
            keywords = default_fallback_keywords();
            keywords.truncate(self.settings.max_keywords.max(1));
        }
        KeywordOutcome::Fallback { keywords, reason }
    }
}

/// Build the fixed extraction instruction around the document head
pub fn build_keyword_prompt(sanitized_text: &str, settings: &KeywordSettings) -> String {
    let head: String = sanitized_text.chars().take(settings.document_head_chars).collect();
    let format_lines: String = (1..=settings.max_keywords)
        .map(|n| format!("キーワード{}: ...\n", n))
        .collect();

    format!(
        "以下の文書の内容に関連する最新情報をWeb検索するためのキーワードを{}個抽出してください。\n\
         キーワードは短い名詞句とし、次の形式で1行に1つずつ出力してください。\n\
         {}\n\
         【文書】\n{}",
        settings.max_keywords, format_lines, head
    )
}

/// Parse keyword lines from a model response, keeping at most `max` in order
pub fn parse_keywords(response: &str, max: usize) -> Vec<String> {
    response
        .lines()
        .filter_map(parse_keyword_line)
        .take(max)
        .collect()
}

fn parse_keyword_line(line: &str) -> Option<String> {
    let lowered = line.to_lowercase();
    if !KEYWORD_LABELS.iter().any(|label| lowered.contains(label)) {
        return None;
    }

    let (_, value) = line.split_once(SEPARATORS)?;
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
