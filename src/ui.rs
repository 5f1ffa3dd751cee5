//! Web UI: one text input for the S3 path and an "Extract Data" button.
//!
//! Server-rendered HTML with no client-side script. Each submission runs
//! the shared pipeline through an [`HtmlSink`], then renders the collected
//! status lines and the reply as preformatted text.

use crate::analyze::Pipeline;
use crate::error::AnalyzerError;
use crate::sink::{HtmlSink, Notice, Rendered};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Form, Router};
use html_escape::{encode_double_quoted_attribute, encode_text};
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;

pub const TITLE: &str = "Architectural Blueprints Analysis";
const INTRO: &str =
    "Enter the S3 path to an Architectural Blueprints PDF document for data extraction and analysis.";

/// Shared state for the UI handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

/// The submitted form.
#[derive(Debug, Deserialize)]
pub struct ExtractForm {
    #[serde(default)]
    pub s3_path: String,
}

pub fn router(pipeline: Arc<Pipeline>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/extract", post(extract))
        .with_state(AppState { pipeline })
}

pub async fn index() -> Html<String> {
    Html(page("", &Rendered::default(), None))
}

pub async fn extract(
    State(state): State<AppState>,
    Form(form): Form<ExtractForm>,
) -> (StatusCode, Html<String>) {
    let sink = HtmlSink::new();
    match state.pipeline.run(&form.s3_path, &sink).await {
        Ok(rendered) => (StatusCode::OK, Html(page(&form.s3_path, &rendered, None))),
        Err(e) => {
            let rendered = Rendered {
                notices: sink.notices(),
                result: None,
            };
            if matches!(e, AnalyzerError::EmptyLocator) {
                // The warning is already in the notices.
                return (StatusCode::OK, Html(page(&form.s3_path, &rendered, None)));
            }
            let status = if e.is_input_error() {
                StatusCode::BAD_REQUEST
            } else {
                error!("Extraction failed for {}: {}", form.s3_path, e);
                StatusCode::INTERNAL_SERVER_ERROR
            };
            let msg = e.to_string();
            (status, Html(page(&form.s3_path, &rendered, Some(&msg))))
        }
    }
}

fn page(s3_path: &str, rendered: &Rendered, error: Option<&str>) -> String {
    let mut body = String::new();
    for notice in &rendered.notices {
        match notice {
            Notice::Status(s) => {
                body.push_str(&format!("<p class=\"status\">{}</p>\n", encode_text(s)))
            }
            Notice::Warning(s) => {
                body.push_str(&format!("<p class=\"warning\">{}</p>\n", encode_text(s)))
            }
        }
    }
    if let Some(result) = &rendered.result {
        body.push_str(&format!("<pre class=\"result\">{}</pre>\n", encode_text(result)));
    }
    if let Some(err) = error {
        body.push_str(&format!("<pre class=\"error\">{}</pre>\n", encode_text(err)));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; margin: 2rem; }}
input[type=text] {{ width: 60%; }}
.warning {{ color: #8a6d00; background: #fff8e1; padding: .5rem; }}
.error {{ color: #b00020; }}
pre {{ white-space: pre-wrap; }}
</style>
</head>
<body>
<h1>{title}</h1>
<p>{intro}</p>
<form method="post" action="/extract">
<label for="s3_path">Enter S3 Path</label>
<input type="text" id="s3_path" name="s3_path" value="{value}">
<button type="submit">Extract Data</button>
</form>
{body}</body>
</html>
"#,
        title = TITLE,
        intro = INTRO,
        value = encode_double_quoted_attribute(s3_path),
        body = body,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnalysisConfig, DecodingParams, Surface};
    use crate::content::{DocumentRef, ExtractedContent, ModelResponse};
    use crate::pipeline::{DocumentLoader, ModelInvoker};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[derive(Debug, thiserror::Error)]
    #[error("AccessDeniedException: not authorised")]
    struct AccessDenied;

    struct Loader {
        fail: bool,
    }

    #[async_trait]
    impl DocumentLoader for Loader {
        async fn load(&self, doc: &DocumentRef) -> Result<ExtractedContent, AnalyzerError> {
            if self.fail {
                return Err(AnalyzerError::extraction(doc.to_string(), AccessDenied));
            }
            Ok(ExtractedContent::from_text("Room A: 12x14 ft"))
        }
    }

    struct Invoker;

    #[async_trait]
    impl ModelInvoker for Invoker {
        async fn invoke(
            &self,
            _prompt: &str,
            _params: &DecodingParams,
        ) -> Result<ModelResponse, AnalyzerError> {
            Ok(ModelResponse("| Room | Size |\n| A | 12x14 <ft> |".into()))
        }
    }

    fn app(fail: bool) -> Router {
        let config = AnalysisConfig::builder(Surface::Interactive)
            .model_id("stub-model")
            .build()
            .unwrap();
        router(Arc::new(Pipeline::new(
            Arc::new(Loader { fail }),
            Arc::new(Invoker),
            &config,
        )))
    }

    async fn submit(app: Router, form: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("POST")
            .uri("/extract")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn index_serves_form() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app(false).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn extract_renders_reply() {
        let (status, html) = submit(app(false), "s3_path=s3%3A%2F%2Fbucket%2Fdoc.pdf").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("<p class=\"status\">Extracted Information:</p>"));
        assert!(html.contains("12x14 &lt;ft&gt;"));
    }

    #[tokio::test]
    async fn empty_path_is_a_warning_not_an_error() {
        let (status, html) = submit(app(false), "s3_path=++").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("<p class=\"warning\">Please enter a valid S3 path.</p>"));
        assert!(!html.contains("class=\"error\""));
    }

    #[tokio::test]
    async fn malformed_s3_path_is_bad_request() {
        let (status, html) = submit(app(false), "s3_path=s3%3A%2F%2Fbucket").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(html.contains("class=\"error\""));
        assert!(!html.contains("Loading data from S3..."));
    }

    #[tokio::test]
    async fn local_path_is_bad_request() {
        let (status, html) = submit(app(false), "s3_path=%2Fetc%2Fpasswd").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(html.contains("Invalid storage locator"));
    }

    #[tokio::test]
    async fn service_failure_is_server_error_with_progress() {
        let (status, html) = submit(app(true), "s3_path=s3%3A%2F%2Fbucket%2Fdoc.pdf").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(html.contains("<p class=\"status\">Loading data from S3...</p>"));
        assert!(html.contains("<pre class=\"error\">Textract extraction failed"));
        assert!(!html.contains("class=\"result\""));
    }

    #[test]
    fn path_value_is_attribute_escaped() {
        let html = page("s3://b/\"><script>", &Rendered::default(), None);
        assert!(html.contains("value=\"s3://b/&quot;&gt;&lt;script&gt;\""));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn page_renders_form_and_result() {
        let rendered = Rendered {
            notices: vec![Notice::Status("Loading data from S3...".into())],
            result: Some("| Room | Size |\n| A | 12x14 <ft> |".into()),
        };
        let html = page("s3://bucket/doc.pdf", &rendered, None);
        assert!(html.contains("Extract Data"));
        assert!(html.contains("value=\"s3://bucket/doc.pdf\""));
        assert!(html.contains("<p class=\"status\">Loading data from S3...</p>"));
        assert!(html.contains("12x14 &lt;ft&gt;"));
        assert!(!html.contains("class=\"error\""));
    }

    #[test]
    fn page_renders_warning() {
        let rendered = Rendered {
            notices: vec![Notice::Warning("Please enter a valid S3 path.".into())],
            result: None,
        };
        let html = page("", &rendered, None);
        assert!(html.contains("<p class=\"warning\">Please enter a valid S3 path.</p>"));
        assert!(!html.contains("class=\"result\""));
    }
}
