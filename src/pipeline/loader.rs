//! Document loading: run Textract OCR and collect the text per page.
//!
//! S3 documents go through the asynchronous `StartDocumentAnalysis` /
//! `GetDocumentAnalysis` job API, which handles multi-page PDFs. Local files
//! are sent inline to the synchronous `AnalyzeDocument` call, which only
//! accepts single-page documents up to 10 MB.
//!
//! Both paths request the `TABLES` and `FORMS` features, and
//! [`assemble_pages`] renders the resulting table and form-field blocks
//! into the page text alongside the plain lines.

use crate::config::AnalysisConfig;
use crate::content::{DocumentRef, ExtractedContent};
use crate::error::AnalyzerError;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_textract::operation::get_document_analysis::GetDocumentAnalysisOutput;
use aws_sdk_textract::primitives::Blob;
use aws_sdk_textract::types::{Block, Document, DocumentLocation, FeatureType, JobStatus, S3Object};
use aws_sdk_textract::Client;
use std::future::Future;
use std::path::Path;
use tokio::time::{sleep, Duration, Instant};
use tracing::{debug, info, warn};

pub use super::blocks::assemble_pages;

/// The OCR stage of the pipeline.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Extract the content of `doc`. Service failures are returned with the
    /// original client error as their source.
    async fn load(&self, doc: &DocumentRef) -> Result<ExtractedContent, AnalyzerError>;
}

/// [`DocumentLoader`] backed by Amazon Textract.
#[derive(Debug, Clone)]
pub struct TextractLoader {
    client: Client,
    poll_interval: Duration,
    max_wait: Duration,
}

impl TextractLoader {
    pub fn new(client: Client, config: &AnalysisConfig) -> Self {
        Self {
            client,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            max_wait: Duration::from_secs(config.max_wait_secs),
        }
    }

    pub fn from_sdk_config(sdk: &SdkConfig, config: &AnalysisConfig) -> Self {
        Self::new(Client::new(sdk), config)
    }

    async fn analyze_s3(
        &self,
        locator: &str,
        bucket: &str,
        key: &str,
    ) -> Result<Vec<Block>, AnalyzerError> {
        let location = DocumentLocation::builder()
            .s3_object(S3Object::builder().bucket(bucket).name(key).build())
            .build();

        let started = self
            .client
            .start_document_analysis()
            .document_location(location)
            .feature_types(FeatureType::Tables)
            .feature_types(FeatureType::Forms)
            .send()
            .await
            .map_err(|e| AnalyzerError::extraction(locator, e))?;

        let job_id = started
            .job_id()
            .ok_or_else(|| AnalyzerError::ExtractionFailed {
                locator: locator.to_string(),
                detail: "StartDocumentAnalysis returned no JobId".into(),
                source: None,
            })?
            .to_string();
        info!("Textract job {} started for {}", job_id, locator);

        let client = &self.client;
        collect_job_blocks(locator, &job_id, self.poll_interval, self.max_wait, |token| {
            let request = client
                .get_document_analysis()
                .job_id(&job_id)
                .set_next_token(token);
            async move {
                request
                    .send()
                    .await
                    .map_err(|e| AnalyzerError::extraction(locator, e))
            }
        })
        .await
    }

    async fn analyze_local(&self, locator: &str, path: &Path) -> Result<Vec<Block>, AnalyzerError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AnalyzerError::extraction(locator, e))?;
        debug!("Read {} bytes from {}", bytes.len(), path.display());

        let output = self
            .client
            .analyze_document()
            .document(Document::builder().bytes(Blob::new(bytes)).build())
            .feature_types(FeatureType::Tables)
            .feature_types(FeatureType::Forms)
            .send()
            .await
            .map_err(|e| AnalyzerError::extraction(locator, e))?;

        Ok(output.blocks().to_vec())
    }
}

#[async_trait]
impl DocumentLoader for TextractLoader {
    async fn load(&self, doc: &DocumentRef) -> Result<ExtractedContent, AnalyzerError> {
        let locator = doc.to_string();
        let blocks = match doc {
            DocumentRef::S3 { bucket, key } => self.analyze_s3(&locator, bucket, key).await?,
            DocumentRef::Local(path) => self.analyze_local(&locator, path).await?,
        };

        let content = assemble_pages(&blocks);
        info!(
            "Extracted {} pages ({} chars) from {}",
            content.pages.len(),
            content.char_count(),
            locator
        );
        if content.is_empty() {
            warn!("Textract found no text in {}", locator);
        }
        Ok(content)
    }
}

/// Poll an analysis job until it finishes, then follow `NextToken` to
/// gather every block.
///
/// `fetch` issues one `GetDocumentAnalysis` call with the given pagination
/// token. A `max_wait` too large to add to the clock means no deadline.
async fn collect_job_blocks<F, Fut>(
    locator: &str,
    job_id: &str,
    poll_interval: Duration,
    max_wait: Duration,
    mut fetch: F,
) -> Result<Vec<Block>, AnalyzerError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<GetDocumentAnalysisOutput, AnalyzerError>>,
{
    let deadline = Instant::now().checked_add(max_wait);

    let first = loop {
        let page = fetch(None).await?;
        match page.job_status() {
            Some(JobStatus::Succeeded) => break page,
            Some(JobStatus::PartialSuccess) => {
                warn!(
                    "Textract job {} only partially succeeded: {}",
                    job_id,
                    page.status_message().unwrap_or("no status message")
                );
                break page;
            }
            Some(JobStatus::Failed) => {
                return Err(AnalyzerError::ExtractionFailed {
                    locator: locator.to_string(),
                    detail: format!(
                        "job {} failed: {}",
                        job_id,
                        page.status_message().unwrap_or("no status message")
                    ),
                    source: None,
                });
            }
            status => {
                let expired = deadline.is_some_and(|d| {
                    Instant::now()
                        .checked_add(poll_interval)
                        .map_or(true, |next| next > d)
                });
                if expired {
                    return Err(AnalyzerError::ExtractionTimeout {
                        locator: locator.to_string(),
                        job_id: job_id.to_string(),
                        secs: max_wait.as_secs(),
                    });
                }
                debug!("Textract job {} status {:?}; polling again", job_id, status);
                sleep(poll_interval).await;
            }
        }
    };

    let mut blocks = first.blocks().to_vec();
    let mut next_token = first.next_token().map(str::to_string);
    while let Some(token) = next_token {
        let page = fetch(Some(token)).await?;
        blocks.extend_from_slice(page.blocks());
        next_token = page.next_token().map(str::to_string);
    }
    debug!("Textract job {} returned {} blocks", job_id, blocks.len());

    Ok(blocks)
}
