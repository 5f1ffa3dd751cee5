//! Serverless entry point logic.
//!
//! The runtime glue lives in the `blueprint-lambda` binary. This module only
//! turns an event into a [`HandlerResponse`], so it can be tested without a
//! Lambda runtime.

use crate::analyze::Pipeline;
use crate::error::AnalyzerError;
use crate::sink::{HandlerResponse, ResponseSink};
use serde_json::Value;
use tracing::info;

/// Event key holding the document locator.
pub const FILE_PATH_KEY: &str = "file_path";

/// Pull the locator out of an invocation event.
///
/// Fails with [`AnalyzerError::MissingFilePath`] when the key is absent,
/// not a string, or blank.
pub fn file_path(event: &Value) -> Result<&str, AnalyzerError> {
    event
        .get(FILE_PATH_KEY)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(AnalyzerError::MissingFilePath)
}

/// Handle one invocation.
///
/// Errors are returned to the runtime, which reports them as a failed
/// invocation. There is no error status code.
pub async fn handle_event(
    pipeline: &Pipeline,
    event: Value,
) -> Result<HandlerResponse, AnalyzerError> {
    let path = file_path(&event)?;
    info!("Invocation for {}", path);
    pipeline.run(path, ResponseSink).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn file_path_reads_string_field() {
        let event = json!({"file_path": "s3://bucket/doc.pdf"});
        assert_eq!(file_path(&event).unwrap(), "s3://bucket/doc.pdf");
    }

    #[test]
    fn file_path_rejects_missing_or_wrong_type() {
        for event in [
            json!({}),
            json!({"file_path": null}),
            json!({"file_path": 42}),
            json!({"file_path": "   "}),
            json!({"input": "s3://bucket/doc.pdf"}),
            json!("s3://bucket/doc.pdf"),
        ] {
            assert!(
                matches!(file_path(&event), Err(AnalyzerError::MissingFilePath)),
                "{event} should be rejected"
            );
        }
    }
}
