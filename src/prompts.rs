//! Prompt templates for blueprint and drawing analysis.
//!
//! Each entry point has one fixed instruction template, and the OCR text is
//! substituted into it under [`DATA_VARIABLE`]. Callers can override the
//! template via [`crate::config::AnalysisConfig::prompt`]. The constants here
//! are the defaults.

use crate::content::ExtractedContent;
use crate::error::AnalyzerError;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Name of the placeholder the extracted content is substituted into.
pub const DATA_VARIABLE: &str = "data";

/// Default template for the interactive UI.
pub const ARCHITECTURAL_BLUEPRINT_TEMPLATE: &str = r#"You are an AI assistant specializing in extracting structured data from complex Architectural Blueprints. Your task is to analyze the provided TEXT data, which contains text, tables, and forms extracted from an Architectural Blueprints PDF document. It is CRITICAL that you extract information from it, like what the blueprints are about, distances, areas, locations, and any other possible information.

IMPORTANT INSTRUCTIONS:
1. Analyze EVERY SINGLE ELEMENT of the provided data: all text, every cell in every table, and all form fields.
2. If a table is detected, return it in proper tabular format.
3. Process ALL pages and ALL data in the document.

Here is the TEXT data extracted from the Architectural Blueprints PDF:
{data}"#;

/// Default template for the serverless handler.
pub const ENGINEERING_DRAWING_TEMPLATE: &str = r#"You are an AI assistant specializing in extracting structured data from complex engineering drawings. Your task is to analyze the provided TEXT data, which contains text, tables, and forms extracted from an engineering drawing PDF document. It is CRITICAL that you extract information from it, like what the drawings are about, distances, areas, locations, and any other possible information.

IMPORTANT INSTRUCTIONS:
1. Analyze EVERY SINGLE ELEMENT of the provided data: all text, every cell in every table, and all form fields.
2. If a table is detected, extract it in proper tabular format.
3. Process ALL pages and ALL data in the document.

Here is the TEXT data extracted from the engineering drawing PDF:
{data}"#;

/// Which built-in template to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentKind {
    #[default]
    ArchitecturalBlueprint,
    EngineeringDrawing,
}

/// A prompt template with `{name}` placeholders.
///
/// `{{` and `}}` produce literal braces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    text: Cow<'static, str>,
}

impl PromptTemplate {
    pub fn builtin(kind: DocumentKind) -> Self {
        let text = match kind {
            DocumentKind::ArchitecturalBlueprint => ARCHITECTURAL_BLUEPRINT_TEMPLATE,
            DocumentKind::EngineeringDrawing => ENGINEERING_DRAWING_TEMPLATE,
        };
        Self {
            text: Cow::Borrowed(text),
        }
    }

    /// A user-supplied template. It must reference [`DATA_VARIABLE`] and
    /// no other placeholder.
    pub fn custom(text: impl Into<String>) -> Result<Self, AnalyzerError> {
        let template = Self {
            text: Cow::Owned(text.into()),
        };
        let names = template.placeholders()?;
        if !names.iter().any(|n| n == DATA_VARIABLE) {
            return Err(AnalyzerError::InvalidPromptTemplate(format!(
                "template must contain a {{{DATA_VARIABLE}}} placeholder"
            )));
        }
        if let Some(other) = names.into_iter().find(|n| n != DATA_VARIABLE) {
            return Err(AnalyzerError::MissingPromptVariable { name: other });
        }
        Ok(template)
    }

    /// Placeholder names in order of appearance (duplicates kept).
    pub fn placeholders(&self) -> Result<Vec<String>, AnalyzerError> {
        let mut names = Vec::new();
        walk(&self.text, |segment| {
            if let Segment::Placeholder(name) = segment {
                names.push(name.to_string());
            }
            Ok(())
        })?;
        Ok(names)
    }

    /// Substitute every placeholder from `vars`.
    pub fn format(&self, vars: &[(&str, &str)]) -> Result<String, AnalyzerError> {
        let mut out = String::with_capacity(self.text.len());
        walk(&self.text, |segment| {
            match segment {
                Segment::Literal(s) => out.push_str(s),
                Segment::Placeholder(name) => {
                    let value = vars
                        .iter()
                        .find(|(k, _)| *k == name)
                        .map(|(_, v)| *v)
                        .ok_or_else(|| AnalyzerError::MissingPromptVariable {
                            name: name.to_string(),
                        })?;
                    out.push_str(value);
                }
            }
            Ok(())
        })?;
        Ok(out)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::builtin(DocumentKind::default())
    }
}

/// Render the prompt for a document's extracted content.
pub fn build_prompt(
    template: &PromptTemplate,
    content: &ExtractedContent,
) -> Result<String, AnalyzerError> {
    let data = content.as_prompt_text();
    template.format(&[(DATA_VARIABLE, &data)])
}

enum Segment<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

/// Split a template into literal runs and placeholders.
fn walk<'a, F>(text: &'a str, mut visit: F) -> Result<(), AnalyzerError>
where
    F: FnMut(Segment<'a>) -> Result<(), AnalyzerError>,
{
    let mut rest = text;
    while let Some(pos) = rest.find(['{', '}']) {
        if pos > 0 {
            visit(Segment::Literal(&rest[..pos]))?;
        }
        let tail = &rest[pos..];

        if tail.starts_with("{{") {
            visit(Segment::Literal("{"))?;
            rest = &tail[2..];
        } else if tail.starts_with("}}") {
            visit(Segment::Literal("}"))?;
            rest = &tail[2..];
        } else if tail.starts_with('}') {
            return Err(AnalyzerError::InvalidPromptTemplate(
                "unmatched '}' (use '}}' for a literal brace)".into(),
            ));
        } else {
            let end = tail.find('}').ok_or_else(|| {
                AnalyzerError::InvalidPromptTemplate(
                    "unterminated '{' (use '{{' for a literal brace)".into(),
                )
            })?;
            let name = tail[1..end].trim();
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(AnalyzerError::InvalidPromptTemplate(format!(
                    "invalid placeholder '{}'",
                    &tail[..=end]
                )));
            }
            visit(Segment::Placeholder(name))?;
            rest = &tail[end + 1..];
        }
    }
    if !rest.is_empty() {
        visit(Segment::Literal(rest))?;
    }
    Ok(())
}
