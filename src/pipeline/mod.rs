//! Pipeline stages for blueprint analysis.
//!
//! Each submodule covers one step of the pipeline. The two service-facing
//! stages are traits, so the pipeline can run against stubs in tests and
//! against AWS in production.
//!
//! ## Data Flow
//!
//! ```text
//! loader ──▶ prompts::build_prompt ──▶ invoker
//! (Textract)      (template)           (Bedrock)
//! ```
//!
//! 1. [`loader`]  — run OCR on the document; [`blocks`] renders the
//!    returned lines, tables and form fields into per-page text
//! 2. [`crate::prompts`] — substitute the text into the fixed template
//! 3. [`invoker`] — send the prompt to the model and return its reply
//!
//! [`clients`] builds the shared AWS configuration both service stages use.

pub mod blocks;
pub mod clients;
pub mod invoker;
pub mod loader;

pub use invoker::{BedrockInvoker, ModelInvoker};
pub use loader::{DocumentLoader, TextractLoader};
