//! Configuration for a blueprint analysis run.
//!
//! Everything the pipeline needs is in [`AnalysisConfig`]: the region,
//! credentials, model identifier, decoding parameters, the SDK retry policy
//! and the prompt template. It is built with [`AnalysisConfigBuilder`] or
//! read from the environment with [`AnalysisConfig::from_env`].
//!
//! # Environment
//!
//! | Variable | Field |
//! |----------|-------|
//! | `region_name` | [`AnalysisConfig::region`] |
//! | `aws_access_key_id` / `aws_secret_access_key` / `aws_session_token` | [`AnalysisConfig::credentials`] |
//! | `BEDROCK_MODEL` | [`AnalysisConfig::model_id`] (required) |
//!
//! Entry points call [`load_dotenv`] first so a local `.env` file can supply
//! any of these.

use crate::error::AnalyzerError;
use crate::prompts::{DocumentKind, PromptTemplate};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

pub const ENV_REGION: &str = "region_name";
pub const ENV_ACCESS_KEY_ID: &str = "aws_access_key_id";
pub const ENV_SECRET_ACCESS_KEY: &str = "aws_secret_access_key";
pub const ENV_SESSION_TOKEN: &str = "aws_session_token";
pub const ENV_MODEL: &str = "BEDROCK_MODEL";

/// Which entry point the configuration is for.
///
/// The two entry points start from slightly different defaults: the UI
/// caps output at 4096 tokens and analyses architectural blueprints, while
/// the serverless handler leaves the cap to the model and analyses
/// engineering drawings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Interactive,
    Serverless,
}

impl Surface {
    fn default_max_tokens(self) -> Option<u32> {
        match self {
            Surface::Interactive => Some(4096),
            Surface::Serverless => None,
        }
    }

    fn default_document_kind(self) -> DocumentKind {
        match self {
            Surface::Interactive => DocumentKind::ArchitecturalBlueprint,
            Surface::Serverless => DocumentKind::EngineeringDrawing,
        }
    }
}

/// Sampling controls sent with every inference request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecodingParams {
    /// Default: 0.5.
    pub temperature: f32,
    /// Default: 0.9.
    pub top_p: f32,
    /// `None` leaves the limit to the model.
    pub max_tokens: Option<u32>,
}

impl Default for DecodingParams {
    fn default() -> Self {
        Self {
            temperature: 0.5,
            top_p: 0.9,
            max_tokens: None,
        }
    }
}

/// AWS SDK retry mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetryMode {
    #[default]
    Standard,
    Adaptive,
}

/// The SDK's own retry policy. The pipeline adds no retries of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first. Default: 10.
    pub max_attempts: u32,
    pub mode: RetryMode,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            mode: RetryMode::Standard,
        }
    }
}

/// Explicit access keys. When absent the default AWS provider chain is used.
#[derive(Clone, PartialEq, Eq)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Configuration for one analysis pipeline.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// AWS region for both services. `None` defers to the SDK's region chain.
    pub region: Option<String>,

    pub credentials: Option<StaticCredentials>,

    /// Bedrock model identifier, e.g. `anthropic.claude-3-sonnet-20240229-v1:0`.
    pub model_id: String,

    pub decoding: DecodingParams,

    pub retry: RetryPolicy,

    pub prompt: PromptTemplate,

    /// Delay between polls of an asynchronous Textract job. Default: 1000.
    pub poll_interval_ms: u64,

    /// Give up on an asynchronous Textract job after this long. Default: 900.
    ///
    /// 900 s is the Lambda execution ceiling.
    pub max_wait_secs: u64,
}

impl AnalysisConfig {
    /// Create a builder seeded with the defaults for `surface`.
    pub fn builder(surface: Surface) -> AnalysisConfigBuilder {
        AnalysisConfigBuilder {
            region: None,
            credentials: None,
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            model_id: None,
            decoding: DecodingParams {
                max_tokens: surface.default_max_tokens(),
                ..DecodingParams::default()
            },
            retry: RetryPolicy::default(),
            prompt: PromptTemplate::builtin(surface.default_document_kind()),
            poll_interval_ms: 1000,
            max_wait_secs: 900,
        }
    }

    /// Read the configuration from the process environment.
    pub fn from_env(surface: Surface) -> Result<Self, AnalyzerError> {
        Self::from_lookup(surface, |key| std::env::var(key).ok())
    }

    /// Build a configuration from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(surface: Surface, lookup: F) -> Result<Self, AnalyzerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::env_builder(surface, lookup).build()
    }

    /// Like [`AnalysisConfig::from_lookup`] but stops before validation so
    /// callers can layer overrides (CLI flags) on top.
    pub fn env_builder<F>(surface: Surface, lookup: F) -> AnalysisConfigBuilder
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut builder = Self::builder(surface);
        builder.region = get(ENV_REGION);
        builder.access_key_id = get(ENV_ACCESS_KEY_ID);
        builder.secret_access_key = get(ENV_SECRET_ACCESS_KEY);
        builder.session_token = get(ENV_SESSION_TOKEN);
        builder.model_id = get(ENV_MODEL);
        builder
    }
}

/// Load a local `.env` settings file into the process environment, if present.
///
/// Variables already set in the environment win over the file.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded settings from {}", path.display()),
        Err(e) if e.not_found() => debug!("No .env file found"),
        Err(e) => tracing::warn!("Ignoring unreadable .env file: {}", e),
    }
}

/// Builder for [`AnalysisConfig`].
#[derive(Debug)]
pub struct AnalysisConfigBuilder {
    region: Option<String>,
    credentials: Option<StaticCredentials>,
    access_key_id: Option<String>,
    secret_access_key: Option<String>,
    session_token: Option<String>,
    model_id: Option<String>,
    decoding: DecodingParams,
    retry: RetryPolicy,
    prompt: PromptTemplate,
    poll_interval_ms: u64,
    max_wait_secs: u64,
}

impl AnalysisConfigBuilder {
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn credentials(mut self, credentials: StaticCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.decoding.temperature = t;
        self
    }

    pub fn top_p(mut self, p: f32) -> Self {
        self.decoding.top_p = p;
        self
    }

    pub fn max_tokens(mut self, n: Option<u32>) -> Self {
        self.decoding.max_tokens = n;
        self
    }

    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    pub fn prompt(mut self, template: PromptTemplate) -> Self {
        self.prompt = template;
        self
    }

    pub fn document_kind(mut self, kind: DocumentKind) -> Self {
        self.prompt = PromptTemplate::builtin(kind);
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    pub fn max_wait_secs(mut self, secs: u64) -> Self {
        self.max_wait_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalysisConfig, AnalyzerError> {
        let model_id = self
            .model_id
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| {
                AnalyzerError::InvalidConfig(format!(
                    "no Bedrock model identifier; set {ENV_MODEL}"
                ))
            })?;

        let credentials = match (self.credentials, self.access_key_id, self.secret_access_key) {
            (Some(c), _, _) => Some(c),
            (None, Some(access_key_id), Some(secret_access_key)) => Some(StaticCredentials {
                access_key_id,
                secret_access_key,
                session_token: self.session_token,
            }),
            (None, None, None) => None,
            (None, Some(_), None) | (None, None, Some(_)) => {
                return Err(AnalyzerError::InvalidConfig(format!(
                    "{ENV_ACCESS_KEY_ID} and {ENV_SECRET_ACCESS_KEY} must be set together"
                )));
            }
        };

        let d = &self.decoding;
        if !(0.0..=1.0).contains(&d.temperature) {
            return Err(AnalyzerError::InvalidConfig(format!(
                "temperature must be 0.0–1.0, got {}",
                d.temperature
            )));
        }
        if !(0.0..=1.0).contains(&d.top_p) {
            return Err(AnalyzerError::InvalidConfig(format!(
                "top_p must be 0.0–1.0, got {}",
                d.top_p
            )));
        }
        if d.max_tokens == Some(0) {
            return Err(AnalyzerError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(AnalyzerError::InvalidConfig("max_attempts must be ≥ 1".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(AnalyzerError::InvalidConfig("poll interval must be ≥ 1 ms".into()));
        }

        Ok(AnalysisConfig {
            region: self.region,
            credentials,
            model_id,
            decoding: self.decoding,
            retry: self.retry,
            prompt: self.prompt,
            poll_interval_ms: self.poll_interval_ms,
            max_wait_secs: self.max_wait_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn interactive_defaults() {
        let c = AnalysisConfig::builder(Surface::Interactive)
            .model_id("anthropic.claude-3-sonnet")
            .build()
            .unwrap();
        assert_eq!(c.decoding.temperature, 0.5);
        assert_eq!(c.decoding.top_p, 0.9);
        assert_eq!(c.decoding.max_tokens, Some(4096));
        assert_eq!(c.retry.max_attempts, 10);
        assert_eq!(c.retry.mode, RetryMode::Standard);
        assert_eq!(c.prompt, PromptTemplate::builtin(DocumentKind::ArchitecturalBlueprint));
    }

    #[test]
    fn serverless_defaults() {
        let c = AnalysisConfig::builder(Surface::Serverless)
            .model_id("m")
            .build()
            .unwrap();
        assert_eq!(c.decoding.max_tokens, None);
        assert_eq!(c.prompt, PromptTemplate::builtin(DocumentKind::EngineeringDrawing));
    }

    #[test]
    fn from_lookup_reads_all_fields() {
        let c = AnalysisConfig::from_lookup(
            Surface::Interactive,
            lookup(&[
                ("region_name", "us-west-2"),
                ("aws_access_key_id", "AKIDEXAMPLE"),
                ("aws_secret_access_key", "secret"),
                ("BEDROCK_MODEL", "anthropic.claude-3-haiku"),
            ]),
        )
        .unwrap();
        assert_eq!(c.region.as_deref(), Some("us-west-2"));
        assert_eq!(c.model_id, "anthropic.claude-3-haiku");
        let creds = c.credentials.unwrap();
        assert_eq!(creds.access_key_id, "AKIDEXAMPLE");
        assert_eq!(creds.secret_access_key, "secret");
        assert_eq!(creds.session_token, None);
    }

    #[test]
    fn missing_model_is_rejected() {
        let err = AnalysisConfig::from_lookup(Surface::Serverless, lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("BEDROCK_MODEL"), "got: {err}");
    }

    #[test]
    fn blank_model_is_rejected() {
        let err = AnalysisConfig::from_lookup(Surface::Serverless, lookup(&[("BEDROCK_MODEL", "  ")]))
            .unwrap_err();
        assert!(matches!(err, AnalyzerError::InvalidConfig(_)));
    }

    #[test]
    fn no_keys_means_default_chain() {
        let c = AnalysisConfig::from_lookup(Surface::Interactive, lookup(&[("BEDROCK_MODEL", "m")]))
            .unwrap();
        assert!(c.credentials.is_none());
        assert!(c.region.is_none());
    }

    #[test]
    fn half_a_key_pair_is_rejected() {
        let err = AnalysisConfig::from_lookup(
            Surface::Interactive,
            lookup(&[("BEDROCK_MODEL", "m"), ("aws_access_key_id", "AKID")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("must be set together"));
    }

    #[test]
    fn out_of_range_decoding_is_rejected() {
        let base = || AnalysisConfig::builder(Surface::Interactive).model_id("m");
        assert!(base().temperature(1.5).build().is_err());
        assert!(base().top_p(-0.1).build().is_err());
        assert!(base().max_tokens(Some(0)).build().is_err());
        assert!(base().max_tokens(None).build().is_ok());
    }

    #[test]
    fn debug_redacts_secret() {
        let creds = StaticCredentials {
            access_key_id: "AKID".into(),
            secret_access_key: "very-secret".into(),
            session_token: Some("token".into()),
        };
        let dbg = format!("{:?}", creds);
        assert!(dbg.contains("AKID"));
        assert!(!dbg.contains("very-secret"));
        assert!(!dbg.contains("token\""));
    }
}
