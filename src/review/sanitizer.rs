/*!
 * Text sanitization for untrusted document and search text.
 *
 * Everything that ends up inside a model prompt passes through here first.
 * Two policies are available:
 * - `AllowList`: keep word characters, whitespace, kana/kanji and a fixed
 *   punctuation set; collapse whitespace; cap at 8000 characters.
 * - `StripControl`: drop C0/C1 control characters and hard-wrap long lines.
 *
 * Both policies are idempotent.
 */

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum characters kept by the allow-list policy (marker excluded)
pub const MAX_SANITIZED_CHARS: usize = 8000;

/// Appended when the allow-list policy truncates
pub const TRUNCATION_MARKER: &str = "...(以下省略)";

/// Line width used by the strip-control policy
pub const WRAP_WIDTH: usize = 1000;

/// Hard cap used by the minimal fallback filter
pub const FALLBACK_MAX_CHARS: usize = 5000;

const LOG_PREVIEW_CHARS: usize = 100;

// Braces, angle brackets and backticks are deliberately absent.
static DISALLOWED_CHARS: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| {
    Regex::new(
        r#"[^\w\s\p{Hiragana}\p{Katakana}\p{Han}ー、。・「」『』（）【】〔〕［］〈〉《》！？：；，．％＆＠＃＋－＝／～…\-.,:;!?()\[\]'"/%&@#+=*~$¥￥]"#,
    )
});

static WHITESPACE_RUN: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| Regex::new(r"\s+"));

/// Sanitization policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SanitizePolicy {
    /// Allow-list characters, collapse whitespace, bounded length
    #[default]
    AllowList,
    /// Remove control characters and wrap long lines, unbounded length
    StripControl,
}

/// Internal fault that triggers the minimal fallback filter
#[derive(Debug, Error)]
#[error("sanitizer pattern unavailable: {0}")]
pub struct SanitizeFault(String);

/// Normalizes untrusted text before it is interpolated into a prompt
#[derive(Debug, Clone, Copy, Default)]
pub struct TextSanitizer {
    policy: SanitizePolicy,
}

impl TextSanitizer {
    /// Create a sanitizer with the given policy
    pub fn new(policy: SanitizePolicy) -> Self {
        Self { policy }
    }

    /// The active policy
    pub fn policy(&self) -> SanitizePolicy {
        self.policy
    }

    /// Sanitize text. Never fails: internal faults fall back to a minimal filter.
    pub fn sanitize(&self, text: &str) -> String {
        match self.try_sanitize(text) {
            Ok(sanitized) => sanitized,
            Err(e) => {
                warn!("Sanitizer falling back to minimal filter: {}", e);
                fallback_sanitize(text)
            }
        }
    }

    /// Sanitize text, surfacing internal faults instead of falling back
    pub fn try_sanitize(&self, text: &str) -> Result<String, SanitizeFault> {
        match self.policy {
            SanitizePolicy::AllowList => allow_list(text),
            SanitizePolicy::StripControl => Ok(strip_control(text)),
        }
    }
}

fn allow_list(text: &str) -> Result<String, SanitizeFault> {
    let disallowed = DISALLOWED_CHARS
        .as_ref()
        .map_err(|e| SanitizeFault(e.to_string()))?;
    let whitespace = WHITESPACE_RUN
        .as_ref()
        .map_err(|e| SanitizeFault(e.to_string()))?;

    let filtered = disallowed.replace_all(text, "");
    let collapsed = whitespace.replace_all(&filtered, " ");

    Ok(truncate_with_marker(collapsed.trim(), MAX_SANITIZED_CHARS))
}

fn truncate_with_marker(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            let mut truncated = String::with_capacity(byte_idx + TRUNCATION_MARKER.len());
            truncated.push_str(&text[..byte_idx]);
            truncated.push_str(TRUNCATION_MARKER);
            truncated
        }
        None => text.to_string(),
    }
}

fn strip_control(text: &str) -> String {
    let stripped: String = text
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect();

    stripped
        .split('\n')
        .map(|line| wrap_line(line, WRAP_WIDTH))
        .collect::<Vec<_>>()
        .join("\n")
}

fn wrap_line(line: &str, width: usize) -> String {
    if line.chars().count() <= width {
        return line.to_string();
    }

    let chars: Vec<char> = line.chars().collect();
    chars
        .chunks(width)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Minimal character-class filter with a hard cap
pub fn fallback_sanitize(text: &str) -> String {
    let kept: String = text
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .filter(|c| c.is_alphanumeric() || *c == ' ' || ".,:;!?()-、。".contains(*c))
        .collect();

    kept.split(' ')
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(FALLBACK_MAX_CHARS)
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// Short, redacted rendering of prompt text for log lines
pub fn preview_for_log(text: &str) -> String {
    let trimmed = text.trim();

    if trimmed.is_empty() {
        return String::from("[EMPTY]");
    }

    let total = trimmed.chars().count();
    let preview = if total > LOG_PREVIEW_CHARS {
        let head: String = trimmed.chars().take(LOG_PREVIEW_CHARS).collect();
        format!("{}... ({} chars total)", head, total)
    } else {
        trimmed.to_string()
    };

    redact_sensitive_patterns(&preview)
}

fn redact_sensitive_patterns(text: &str) -> String {
    let patterns = [
        ("Bearer ", "Bearer [REDACTED]"),
        ("x-api-key: ", "x-api-key: [REDACTED]"),
        ("api_key=", "api_key=[REDACTED]"),
        ("password=", "password=[REDACTED]"),
        ("token=", "token=[REDACTED]"),
    ];

    let mut result = text.to_string();
    for (pattern, replacement) in patterns {
        if let Some(idx) = result.find(pattern) {
            let value_start = idx + pattern.len();
            let end = result[value_start..]
                .find(|c: char| c.is_whitespace() || c == '&' || c == '"' || c == '\'')
                .map(|i| value_start + i)
                .unwrap_or(result.len());
            result = format!("{}{}{}", &result[..idx], replacement, &result[end..]);
        }
    }

    result
}
