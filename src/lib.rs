//! # blueprint-extract
//!
//! Extract structured information from architectural blueprints and
//! engineering drawings with Amazon Textract (OCR) and Amazon Bedrock (LLM).
//!
//! ## Pipeline Overview
//!
//! ```text
//! s3://bucket/doc.pdf
//!  │
//!  ├─ 1. Load     Textract document analysis (text, tables, forms)
//!  ├─ 2. Prompt   substitute the page text into a fixed template
//!  ├─ 3. Invoke   Bedrock Converse (temperature 0.5, top-p 0.9)
//!  └─ 4. Output   sink: rendered in the UI, or returned as a response
//! ```
//!
//! Every entry point runs the same [`Pipeline`]. The service stages are the
//! [`DocumentLoader`] and [`ModelInvoker`] traits, so tests can inject stubs.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use blueprint_extract::{AnalysisConfig, Pipeline, ResponseSink, Surface};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads region_name, aws_access_key_id, aws_secret_access_key, BEDROCK_MODEL
//!     let config = AnalysisConfig::from_env(Surface::Serverless)?;
//!     let pipeline = Pipeline::from_config(&config).await;
//!     let response = pipeline.run("s3://bucket/doc.pdf", ResponseSink).await?;
//!     println!("{}", response.body);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`    | on  | The `blueprint` binary and the axum web UI ([`ui`]) |
//! | `lambda` | off | The `blueprint-lambda` binary (lambda_runtime) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod content;
pub mod error;
pub mod handler;
pub mod pipeline;
pub mod prompts;
pub mod sink;
#[cfg(feature = "cli")]
pub mod ui;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::Pipeline;
pub use config::{
    load_dotenv, AnalysisConfig, AnalysisConfigBuilder, DecodingParams, RetryMode, RetryPolicy,
    StaticCredentials, Surface,
};
pub use content::{DocumentRef, ExtractedContent, ModelResponse, PageFragment};
pub use error::AnalyzerError;
pub use handler::handle_event;
pub use pipeline::{BedrockInvoker, DocumentLoader, ModelInvoker, TextractLoader};
pub use prompts::{build_prompt, DocumentKind, PromptTemplate};
pub use sink::{HandlerResponse, HtmlSink, OutputSink, ResponseSink};
