//! Output sinks: where each entry point sends pipeline progress and results.
//!
//! Both entry points run the same [`crate::analyze::Pipeline`]. They differ
//! only in the sink they pass it. The UI renders status text and the reply.
//! The serverless handler wraps the reply in a response payload.

use crate::content::ModelResponse;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Receives pipeline events and turns the final reply into the entry
/// point's output type.
pub trait OutputSink {
    type Output;

    /// A progress line, e.g. "Loading data from S3...".
    fn on_status(&self, message: &str) {
        let _ = message;
    }

    /// A user-facing warning. The pipeline stops after sending one.
    fn on_warning(&self, message: &str) {
        let _ = message;
    }

    /// Consume the sink with the model's reply.
    fn finish(self, response: ModelResponse) -> Self::Output;
}

// ── Serverless ───────────────────────────────────────────────────────────

/// Payload returned by the serverless handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

/// Sink that returns the reply as a `{statusCode: 200, body}` payload.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResponseSink;

impl OutputSink for ResponseSink {
    type Output = HandlerResponse;

    fn on_status(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn finish(self, response: ModelResponse) -> HandlerResponse {
        HandlerResponse {
            status_code: 200,
            body: response.into_string(),
        }
    }
}

// ── Web UI ───────────────────────────────────────────────────────────────

/// One line the UI shows above the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Status(String),
    Warning(String),
}

/// Everything the UI needs to render one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    pub notices: Vec<Notice>,
    pub result: Option<String>,
}

/// Sink that collects notices and the reply for HTML rendering.
///
/// Notices are kept even when the pipeline fails part-way, via
/// [`HtmlSink::notices`].
#[derive(Debug, Default)]
pub struct HtmlSink {
    notices: Mutex<Vec<Notice>>,
}

impl HtmlSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notices recorded so far.
    pub fn notices(&self) -> Vec<Notice> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Notice>> {
        // A poisoned lock only means a previous push panicked; the Vec is intact.
        self.notices.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl OutputSink for &HtmlSink {
    type Output = Rendered;

    fn on_status(&self, message: &str) {
        self.lock().push(Notice::Status(message.to_string()));
    }

    fn on_warning(&self, message: &str) {
        self.lock().push(Notice::Warning(message.to_string()));
    }

    fn finish(self, response: ModelResponse) -> Rendered {
        Rendered {
            notices: self.notices(),
            result: Some(response.into_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_sink_wraps_body() {
        let out = ResponseSink.finish(ModelResponse("Extracted: one room".into()));
        assert_eq!(out.status_code, 200);
        assert_eq!(out.body, "Extracted: one room");
    }

    #[test]
    fn handler_response_serialises_status_code_key() {
        let out = HandlerResponse {
            status_code: 200,
            body: "ok".into(),
        };
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json, serde_json::json!({"statusCode": 200, "body": "ok"}));
    }

    #[test]
    fn html_sink_collects_notices_in_order() {
        let sink = HtmlSink::new();
        (&sink).on_status("Loading data from S3...");
        (&sink).on_warning("careful");
        let rendered = (&sink).finish(ModelResponse("done".into()));
        assert_eq!(
            rendered.notices,
            vec![
                Notice::Status("Loading data from S3...".into()),
                Notice::Warning("careful".into()),
            ]
        );
        assert_eq!(rendered.result.as_deref(), Some("done"));
    }
}
