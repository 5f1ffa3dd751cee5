//! The shared analysis pipeline used by every entry point.
//!
//! [`Pipeline::run`] is the only place the three stages are composed. The
//! serverless handler and the UIs differ only in the
//! [`OutputSink`](crate::sink::OutputSink) they hand it.

use crate::config::{AnalysisConfig, DecodingParams};
use crate::content::DocumentRef;
use crate::error::AnalyzerError;
use crate::pipeline::clients::aws_sdk_config;
use crate::pipeline::{BedrockInvoker, DocumentLoader, ModelInvoker, TextractLoader};
use crate::prompts::{build_prompt, PromptTemplate};
use crate::sink::OutputSink;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

pub const STATUS_LOADING: &str = "Loading data from S3...";
pub const STATUS_PROCESSING: &str = "Processing data with LLM...";
pub const STATUS_DONE: &str = "Extracted Information:";
pub const WARNING_EMPTY_LOCATOR: &str = "Please enter a valid S3 path.";

/// Loader, invoker and the fixed request parameters.
///
/// Cheap to clone; the service clients are shared behind `Arc`.
#[derive(Clone)]
pub struct Pipeline {
    loader: Arc<dyn DocumentLoader>,
    invoker: Arc<dyn ModelInvoker>,
    prompt: PromptTemplate,
    decoding: DecodingParams,
    allow_local_files: bool,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("loader", &"<dyn DocumentLoader>")
            .field("invoker", &"<dyn ModelInvoker>")
            .field("decoding", &self.decoding)
            .field("allow_local_files", &self.allow_local_files)
            .finish()
    }
}

impl Pipeline {
    /// Assemble a pipeline from explicit stage implementations.
    pub fn new(
        loader: Arc<dyn DocumentLoader>,
        invoker: Arc<dyn ModelInvoker>,
        config: &AnalysisConfig,
    ) -> Self {
        Self {
            loader,
            invoker,
            prompt: config.prompt.clone(),
            decoding: config.decoding,
            allow_local_files: false,
        }
    }

    /// Accept local file paths as well as `s3://` locators.
    ///
    /// Off by default. Only the command-line `extract` path turns it on, so
    /// the web UI and the serverless handler never read the host filesystem.
    pub fn allow_local_files(mut self, allow: bool) -> Self {
        self.allow_local_files = allow;
        self
    }

    /// Build the production pipeline: one SDK config, a Textract loader and
    /// a Bedrock invoker.
    pub async fn from_config(config: &AnalysisConfig) -> Self {
        let sdk = aws_sdk_config(config).await;
        let loader = TextractLoader::from_sdk_config(&sdk, config);
        let invoker = BedrockInvoker::from_sdk_config(&sdk, config);
        info!("Pipeline ready: model={}", config.model_id);
        Self::new(Arc::new(loader), Arc::new(invoker), config)
    }

    /// Run the pipeline for one locator, reporting through `sink`.
    ///
    /// An empty locator sends [`WARNING_EMPTY_LOCATOR`] to the sink and
    /// returns [`AnalyzerError::EmptyLocator`] without calling any service.
    /// A local path is rejected as [`AnalyzerError::InvalidLocator`] unless
    /// [`Pipeline::allow_local_files`] was set.
    /// Service errors are returned as-is. There is no retry here beyond
    /// the SDK's own policy.
    pub async fn run<S: OutputSink>(
        &self,
        locator: &str,
        sink: S,
    ) -> Result<S::Output, AnalyzerError> {
        let start = Instant::now();

        let doc = match DocumentRef::parse(locator) {
            Ok(doc) => doc,
            Err(e @ AnalyzerError::EmptyLocator) => {
                sink.on_warning(WARNING_EMPTY_LOCATOR);
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        if matches!(doc, DocumentRef::Local(_)) && !self.allow_local_files {
            return Err(AnalyzerError::InvalidLocator {
                locator: locator.trim().to_string(),
            });
        }
        info!("Analysing {}", doc);

        // ── Step 1: OCR ──────────────────────────────────────────────────
        sink.on_status(STATUS_LOADING);
        let content = self.loader.load(&doc).await?;
        debug!("Loaded {} pages in {:?}", content.pages.len(), start.elapsed());

        // ── Step 2: Prompt ───────────────────────────────────────────────
        let prompt = build_prompt(&self.prompt, &content)?;
        debug!("Prompt is {} chars", prompt.len());

        // ── Step 3: Inference ────────────────────────────────────────────
        sink.on_status(STATUS_PROCESSING);
        let response = self.invoker.invoke(&prompt, &self.decoding).await?;

        info!("Analysis of {} complete in {:?}", doc, start.elapsed());
        sink.on_status(STATUS_DONE);
        Ok(sink.finish(response))
    }
}
