//! Shared AWS SDK configuration.
//!
//! One [`SdkConfig`] is built at start-up and both service clients are made
//! from it, so region, credentials and retry policy are set in one place.

use crate::config::{AnalysisConfig, RetryMode};
use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_textract::config::Credentials;
use tracing::debug;

const CREDENTIALS_PROVIDER_NAME: &str = "blueprint-extract";

/// The SDK retry configuration for a policy.
pub fn retry_config(config: &AnalysisConfig) -> RetryConfig {
    let base = match config.retry.mode {
        RetryMode::Standard => RetryConfig::standard(),
        RetryMode::Adaptive => RetryConfig::adaptive(),
    };
    base.with_max_attempts(config.retry.max_attempts)
}

/// Load the shared SDK configuration.
///
/// Static credentials replace the default provider chain only when the
/// configuration carries them.
pub async fn aws_sdk_config(config: &AnalysisConfig) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest()).retry_config(retry_config(config));

    if let Some(ref region) = config.region {
        loader = loader.region(Region::new(region.clone()));
    }

    if let Some(ref creds) = config.credentials {
        debug!("Using static credentials for {}", creds.access_key_id);
        loader = loader.credentials_provider(Credentials::new(
            creds.access_key_id.clone(),
            creds.secret_access_key.clone(),
            creds.session_token.clone(),
            None,
            CREDENTIALS_PROVIDER_NAME,
        ));
    }

    let sdk = loader.load().await;
    debug!(
        "AWS SDK configured: region={:?}, max_attempts={}",
        sdk.region().map(|r| r.as_ref().to_string()),
        config.retry.max_attempts
    );
    sdk
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RetryPolicy, Surface};

    #[test]
    fn retry_config_honours_policy() {
        let config = AnalysisConfig::builder(Surface::Interactive)
            .model_id("m")
            .build()
            .unwrap();
        let retry = retry_config(&config);
        assert_eq!(retry.max_attempts(), 10);
        assert_eq!(retry.mode(), aws_config::retry::RetryMode::Standard);

        let config = AnalysisConfig::builder(Surface::Interactive)
            .model_id("m")
            .retry(RetryPolicy {
                max_attempts: 3,
                mode: RetryMode::Adaptive,
            })
            .build()
            .unwrap();
        let retry = retry_config(&config);
        assert_eq!(retry.max_attempts(), 3);
        assert_eq!(retry.mode(), aws_config::retry::RetryMode::Adaptive);
    }
}
