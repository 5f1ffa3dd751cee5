//! Error type for the blueprint-extract library.
//!
//! A single [`AnalyzerError`] covers every failure. The pipeline handles
//! one request at a time and has no partial results, so there is no
//! separate non-fatal error type.
//!
//! Service failures carry the original AWS SDK error as their
//! [`std::error::Error::source`], untouched. The `detail` string holds the
//! SDK's full error context (error code, message, request id), because an
//! `SdkError`'s own `Display` says only "service error".

use thiserror::Error;

/// Boxed error from an underlying service client.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// All errors returned by the blueprint-extract library.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The UI was submitted with an empty storage path.
    #[error("Please enter a valid S3 path.")]
    EmptyLocator,

    /// The serverless event has no usable `file_path` field.
    #[error("Event is missing a string `file_path` field")]
    MissingFilePath,

    /// An `s3://` locator that names no bucket or no object key.
    #[error("Invalid storage locator '{locator}': expected s3://<bucket>/<key>")]
    InvalidLocator { locator: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder or environment validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Prompt errors ─────────────────────────────────────────────────────
    /// The template references a placeholder no value was supplied for.
    #[error("Prompt template references '{{{name}}}' but no value was supplied")]
    MissingPromptVariable { name: String },

    /// The template text itself is malformed (e.g. an unterminated `{`).
    #[error("Invalid prompt template: {0}")]
    InvalidPromptTemplate(String),

    // ── Service errors ────────────────────────────────────────────────────
    /// The OCR service rejected or failed the extraction.
    #[error("Textract extraction failed for '{locator}': {detail}")]
    ExtractionFailed {
        locator: String,
        detail: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The asynchronous Textract job did not finish in time.
    #[error("Textract job {job_id} for '{locator}' did not finish within {secs}s")]
    ExtractionTimeout {
        locator: String,
        job_id: String,
        secs: u64,
    },

    /// The inference endpoint rejected or failed the request.
    #[error("Bedrock invocation of model '{model_id}' failed: {detail}")]
    InvocationFailed {
        model_id: String,
        detail: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl AnalyzerError {
    /// Wrap an SDK error from the extraction stage, keeping it as the source.
    pub fn extraction<E>(locator: impl Into<String>, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        AnalyzerError::ExtractionFailed {
            locator: locator.into(),
            detail: aws_sdk_textract::error::DisplayErrorContext(&err).to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// Wrap an SDK error from the inference stage, keeping it as the source.
    pub fn invocation<E>(model_id: impl Into<String>, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        AnalyzerError::InvocationFailed {
            model_id: model_id.into(),
            detail: aws_sdk_bedrockruntime::error::DisplayErrorContext(&err).to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// True for failures detected before any service call was attempted.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            AnalyzerError::EmptyLocator
                | AnalyzerError::MissingFilePath
                | AnalyzerError::InvalidLocator { .. }
        )
    }
}
