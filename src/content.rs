//! Values that flow through the pipeline: the document locator, the
//! extracted page text, and the model's reply.

use crate::error::AnalyzerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

const S3_SCHEME: &str = "s3://";

/// Where the source document lives.
///
/// Parsing only checks that a locator is present. Whether the document
/// exists, and whether Textract can read it, is for the service to decide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentRef {
    /// `s3://bucket/key`
    S3 { bucket: String, key: String },
    /// Anything else is treated as a local file path.
    Local(PathBuf),
}

impl DocumentRef {
    /// Parse a user-supplied locator string.
    pub fn parse(locator: &str) -> Result<Self, AnalyzerError> {
        let locator = locator.trim();
        if locator.is_empty() {
            return Err(AnalyzerError::EmptyLocator);
        }

        if let Some(rest) = locator.strip_prefix(S3_SCHEME) {
            return match rest.split_once('/') {
                Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => {
                    Ok(DocumentRef::S3 {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    })
                }
                _ => Err(AnalyzerError::InvalidLocator {
                    locator: locator.to_string(),
                }),
            };
        }

        Ok(DocumentRef::Local(PathBuf::from(locator)))
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentRef::S3 { bucket, key } => write!(f, "{S3_SCHEME}{bucket}/{key}"),
            DocumentRef::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Text Textract found on one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFragment {
    /// 1-indexed page number.
    pub page: usize,
    /// Lines in reading order, joined with `\n`.
    pub text: String,
}

/// The aggregate OCR output for a document, in page order.
///
/// The pipeline never looks inside it. It only renders it into the prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedContent {
    pub pages: Vec<PageFragment>,
}

impl ExtractedContent {
    /// Single-page content, mostly useful for stubs.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            pages: vec![PageFragment {
                page: 1,
                text: text.into(),
            }],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pages.iter().all(|p| p.text.trim().is_empty())
    }

    /// Total characters across all pages.
    pub fn char_count(&self) -> usize {
        self.pages.iter().map(|p| p.text.chars().count()).sum()
    }

    /// The form substituted into the prompt: pages separated by a blank line.
    pub fn as_prompt_text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Raw model output. Passed through as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelResponse(pub String);

impl ModelResponse {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ModelResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_s3_locator() {
        let doc = DocumentRef::parse("s3://bucket/plans/doc.pdf").unwrap();
        assert_eq!(
            doc,
            DocumentRef::S3 {
                bucket: "bucket".into(),
                key: "plans/doc.pdf".into()
            }
        );
        assert_eq!(doc.to_string(), "s3://bucket/plans/doc.pdf");
    }

    #[test]
    fn parse_trims_whitespace() {
        let doc = DocumentRef::parse("  s3://b/k.pdf\n").unwrap();
        assert_eq!(doc.to_string(), "s3://b/k.pdf");
    }

    #[test]
    fn parse_empty_is_empty_locator() {
        assert!(matches!(DocumentRef::parse("   "), Err(AnalyzerError::EmptyLocator)));
    }

    #[test]
    fn parse_s3_without_key_is_invalid() {
        for bad in ["s3://bucket", "s3://bucket/", "s3:///key"] {
            assert!(
                matches!(DocumentRef::parse(bad), Err(AnalyzerError::InvalidLocator { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn parse_other_strings_as_local_paths() {
        let doc = DocumentRef::parse("drawings/04-501.pdf").unwrap();
        assert_eq!(doc, DocumentRef::Local(PathBuf::from("drawings/04-501.pdf")));
    }

    #[test]
    fn prompt_text_joins_pages_in_order() {
        let content = ExtractedContent {
            pages: vec![
                PageFragment { page: 1, text: "Room A: 12x14 ft".into() },
                PageFragment { page: 2, text: "Room B: 10x10 ft".into() },
            ],
        };
        assert_eq!(content.as_prompt_text(), "Room A: 12x14 ft\n\nRoom B: 10x10 ft");
        assert!(!content.is_empty());
    }

    #[test]
    fn whitespace_only_pages_count_as_empty() {
        let content = ExtractedContent::from_text(" \n ");
        assert!(content.is_empty());
        assert!(ExtractedContent::default().is_empty());
    }
}
