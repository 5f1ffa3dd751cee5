//! AWS Lambda binary for blueprint-extract.
//!
//! The clients and pipeline are built once per cold start and reused by
//! every invocation. The event must carry a `file_path`. The response is
//! `{"statusCode": 200, "body": "<model reply>"}`.

use anyhow::Context;
use blueprint_extract::{handle_event, load_dotenv, AnalysisConfig, Pipeline, Surface};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::Value;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // CloudWatch adds its own timestamps; colour codes would show up raw.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .without_time()
        .init();

    load_dotenv();
    let config = AnalysisConfig::from_env(Surface::Serverless).context("Invalid configuration")?;
    let pipeline = Arc::new(Pipeline::from_config(&config).await);

    run(service_fn(move |event: LambdaEvent<Value>| {
        let pipeline = Arc::clone(&pipeline);
        async move {
            let response = handle_event(&pipeline, event.payload).await?;
            Ok::<_, Error>(response)
        }
    }))
    .await
}
