/*!
 * Document sources and extracted document text.
 *
 * A source yields raw text page by page. Pages are joined into a
 * `DocumentText`, each page followed by a newline. Extraction failure is
 * terminal for that document.
 */

use log::{debug, warn};
use lopdf::Document;
use std::path::{Path, PathBuf};

use crate::errors::ReviewError;

/// Characters shown by `DocumentText::preview`
pub const PREVIEW_CHARS: usize = 1000;

/// Supplies raw text for a document, one entry per page
pub trait DocumentSource {
    /// Display name of the document
    fn name(&self) -> &str;

    /// Raw text of every page, in page order
    fn pages(&self) -> Result<Vec<String>, ReviewError>;

    /// Extract the full document text
    fn extract(&self) -> Result<DocumentText, ReviewError> {
        let pages = self.pages()?;
        debug!("Extracted {} pages from {}", pages.len(), self.name());
        Ok(DocumentText::from_pages(&pages))
    }
}

/// Full raw text of one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentText(String);

impl DocumentText {
    /// Join pages, each followed by a newline
    pub fn from_pages<S: AsRef<str>>(pages: &[S]) -> Self {
        let mut text = String::new();
        for page in pages {
            text.push_str(page.as_ref());
            text.push('\n');
        }
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the document has no visible text
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Number of characters
    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }

    /// First `PREVIEW_CHARS` characters, with `...` when truncated
    pub fn preview(&self) -> String {
        match self.0.char_indices().nth(PREVIEW_CHARS) {
            Some((byte_idx, _)) => format!("{}...", &self.0[..byte_idx]),
            None => self.0.clone(),
        }
    }
}

impl std::fmt::Display for DocumentText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// PDF document read with lopdf
pub struct PdfDocument {
    name: String,
    document: Document,
}

impl std::fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDocument").field("name", &self.name).finish_non_exhaustive()
    }
}

impl PdfDocument {
    /// Load a PDF file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ReviewError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| ReviewError::Extraction(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_bytes(display_name(path), &bytes)
    }

    /// Parse a PDF held in memory
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Result<Self, ReviewError> {
        let name = name.into();
        let document = Document::load_mem(bytes)
            .map_err(|e| ReviewError::Extraction(format!("Failed to parse PDF {}: {}", name, e)))?;
        Ok(Self { name, document })
    }
}

impl DocumentSource for PdfDocument {
    fn name(&self) -> &str {
        &self.name
    }

    fn pages(&self) -> Result<Vec<String>, ReviewError> {
        if self.document.is_encrypted() {
            return Err(ReviewError::Extraction(format!("PDF {} is encrypted", self.name)));
        }

        self.document
            .get_pages()
            .keys()
            .map(|page_number| {
                self.document.extract_text(&[*page_number]).map_err(|e| {
                    warn!("Text extraction failed on page {} of {}: {}", page_number, self.name, e);
                    ReviewError::Extraction(format!(
                        "Failed to extract text from page {} of {}: {}",
                        page_number, self.name, e
                    ))
                })
            })
            .collect()
    }
}

/// Plain text file treated as a single page
#[derive(Debug, Clone)]
pub struct PlainTextDocument {
    name: String,
    text: String,
}

impl PlainTextDocument {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Load a UTF-8 text file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ReviewError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ReviewError::Extraction(format!("Failed to read {}: {}", path.display(), e)))?;
        Ok(Self::new(display_name(path), text))
    }
}

impl DocumentSource for PlainTextDocument {
    fn name(&self) -> &str {
        &self.name
    }

    fn pages(&self) -> Result<Vec<String>, ReviewError> {
        Ok(vec![self.text.clone()])
    }
}

/// Open a document by extension: PDF, or plain text for `.txt`/`.md`
pub fn open_document(path: &Path) -> Result<Box<dyn DocumentSource>, ReviewError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => Ok(Box::new(PdfDocument::open(path)?)),
        "txt" | "md" => Ok(Box::new(PlainTextDocument::open(path)?)),
        other => Err(ReviewError::Extraction(format!(
            "Unsupported document type '{}' for {}",
            other,
            path.display()
        ))),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| PathBuf::from(path).display().to_string())
}
