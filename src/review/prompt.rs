/*!
 * Review prompt assembly.
 *
 * Templates use `{document_text}` as their single substitution point.
 * Literal braces are written `{{` and `}}`. Any other placeholder, a lone
 * brace, or a missing or repeated `{document_text}` is a `TemplateError`.
 *
 * Substituted text is never re-scanned, so braces inside the document cannot
 * create new placeholders.
 */

use log::{debug, warn};

use crate::errors::TemplateError;
use crate::review::sanitizer::{TextSanitizer, preview_for_log};

/// Name of the single supported placeholder
pub const DOCUMENT_PLACEHOLDER: &str = "document_text";

/// Default soft limit on prompt length, in characters
pub const DEFAULT_PROMPT_SOFT_LIMIT: usize = 180_000;

/// Built-in approval-document review template
pub const DEFAULT_REVIEW_TEMPLATE: &str = "あなたは製造業の経験豊富な上司として、以下の決裁書をレビューしてください。

【レビュー観点】
1. 申請理由の妥当性と明確性
2. 金額・数量・期間等の具体性と妥当性
3. 承認フローや必要書類の確認
4. リスク評価と対策の検討
5. 法規制・社内規定への適合性
6. 文書の記載漏れや不備

【決裁書内容】
{document_text}

【レビュー結果】
上記の観点から、具体的な指摘事項と改善提案を日本語で出力してください。
承認可能な場合はその旨も明記し、要改善点がある場合は優先度を付けて説明してください。";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Document,
}

/// A validated template with exactly one document placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
}

impl PromptTemplate {
    /// Parse and validate a template
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let chars: Vec<char> = template.chars().collect();
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut placeholders = 0;
        let mut i = 0;

        while i < chars.len() {
            match chars[i] {
                '{' if chars.get(i + 1) == Some(&'{') => {
                    literal.push('{');
                    i += 2;
                }
                '}' if chars.get(i + 1) == Some(&'}') => {
                    literal.push('}');
                    i += 2;
                }
                '{' => {
                    let close = chars[i + 1..]
                        .iter()
                        .position(|c| *c == '}')
                        .map(|offset| i + 1 + offset)
                        .ok_or(TemplateError::UnbalancedBrace { position: i })?;

                    let name: String = chars[i + 1..close].iter().collect();
                    if name.contains('{') {
                        return Err(TemplateError::UnbalancedBrace { position: i });
                    }
                    if name != DOCUMENT_PLACEHOLDER {
                        return Err(TemplateError::UnknownPlaceholder(name));
                    }

                    placeholders += 1;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Document);
                    i = close + 1;
                }
                '}' => return Err(TemplateError::UnbalancedBrace { position: i }),
                c => {
                    literal.push(c);
                    i += 1;
                }
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        match placeholders {
            0 => Err(TemplateError::MissingPlaceholder),
            1 => Ok(Self { segments }),
            count => Err(TemplateError::DuplicatePlaceholder { count }),
        }
    }

    /// Fill the placeholder with `document_text`
    pub fn render(&self, document_text: &str) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => text.as_str(),
                Segment::Document => document_text,
            })
            .collect()
    }
}

/// Raised when a prompt exceeds the soft limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptSizeWarning {
    /// Prompt length in characters
    pub chars: usize,
    /// Prompt length in UTF-8 bytes
    pub bytes: usize,
    /// The soft limit that was exceeded
    pub limit: usize,
}

impl std::fmt::Display for PromptSizeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "prompt is {} characters ({} bytes), above the soft limit of {}; consider shrinking the document or disabling search",
            self.chars, self.bytes, self.limit
        )
    }
}

/// The final prompt and an optional size warning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledPrompt {
    pub text: String,
    pub warning: Option<PromptSizeWarning>,
}

/// Merges document text, related information and a template
#[derive(Debug, Clone, Copy)]
pub struct PromptAssembler {
    sanitizer: TextSanitizer,
    soft_limit: usize,
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::new(TextSanitizer::default(), DEFAULT_PROMPT_SOFT_LIMIT)
    }
}

impl PromptAssembler {
    pub fn new(sanitizer: TextSanitizer, soft_limit: usize) -> Self {
        Self { sanitizer, soft_limit }
    }

    /// Build the final prompt
    ///
    /// # Arguments
    /// * `document_text` - Raw document text; sanitized here
    /// * `template` - Template with one `{document_text}` placeholder
    /// * `related_info` - Related information block; empty means none
    pub fn assemble(
        &self,
        document_text: &str,
        template: &str,
        related_info: &str,
    ) -> Result<AssembledPrompt, TemplateError> {
        let template = PromptTemplate::parse(template)?;

        let mut enhanced = self.sanitizer.sanitize(document_text);
        if !related_info.is_empty() {
            enhanced.push_str("\n\n");
            enhanced.push_str(&self.sanitizer.sanitize(related_info));
        }

        let text = template.render(&enhanced);
        let chars = text.chars().count();
        debug!("Assembled prompt ({} chars): {}", chars, preview_for_log(&text));

        let warning = (chars > self.soft_limit).then(|| PromptSizeWarning {
            chars,
            bytes: text.len(),
            limit: self.soft_limit,
        });
        if let Some(warning) = &warning {
            warn!("{}", warning);
        }

        Ok(AssembledPrompt { text, warning })
    }
}
