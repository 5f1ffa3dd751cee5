//! Model invocation: send the prompt to Bedrock and return its reply.
//!
//! Uses the model-agnostic `Converse` API so any Bedrock text model works
//! with the same request shape. Only the decoding parameters in
//! [`DecodingParams`] are sent.

use crate::config::{AnalysisConfig, DecodingParams};
use crate::content::ModelResponse;
use crate::error::AnalyzerError;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_bedrockruntime::types::{
    ContentBlock, ConversationRole, ConverseOutput, InferenceConfiguration, Message, StopReason,
};
use aws_sdk_bedrockruntime::Client;
use tracing::{debug, info, warn};

/// The inference stage of the pipeline.
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    /// Generate a reply to `prompt` under `params`.
    async fn invoke(
        &self,
        prompt: &str,
        params: &DecodingParams,
    ) -> Result<ModelResponse, AnalyzerError>;
}

/// [`ModelInvoker`] backed by the Bedrock Runtime `Converse` API.
#[derive(Debug, Clone)]
pub struct BedrockInvoker {
    client: Client,
    model_id: String,
}

impl BedrockInvoker {
    pub fn new(client: Client, model_id: impl Into<String>) -> Self {
        Self {
            client,
            model_id: model_id.into(),
        }
    }

    pub fn from_sdk_config(sdk: &SdkConfig, config: &AnalysisConfig) -> Self {
        Self::new(Client::new(sdk), config.model_id.clone())
    }
}

#[async_trait]
impl ModelInvoker for BedrockInvoker {
    async fn invoke(
        &self,
        prompt: &str,
        params: &DecodingParams,
    ) -> Result<ModelResponse, AnalyzerError> {
        let message = Message::builder()
            .role(ConversationRole::User)
            .content(ContentBlock::Text(prompt.to_string()))
            .build()
            .map_err(|e| AnalyzerError::invocation(&self.model_id, e))?;

        let response = self
            .client
            .converse()
            .model_id(&self.model_id)
            .messages(message)
            .inference_config(inference_config(params))
            .send()
            .await
            .map_err(|e| AnalyzerError::invocation(&self.model_id, e))?;

        if let Some(usage) = response.usage() {
            debug!(
                "{}: {} input tokens, {} output tokens",
                self.model_id,
                usage.input_tokens(),
                usage.output_tokens()
            );
        }
        if *response.stop_reason() == StopReason::MaxTokens {
            warn!("{}: reply was cut off at the max_tokens limit", self.model_id);
        }

        let text = reply_text(response.output()).ok_or_else(|| AnalyzerError::InvocationFailed {
            model_id: self.model_id.clone(),
            detail: "response contained no text content".into(),
            source: None,
        })?;
        info!("{} replied with {} chars", self.model_id, text.len());

        Ok(ModelResponse(text))
    }
}

/// Map decoding parameters onto the Converse inference configuration.
pub fn inference_config(params: &DecodingParams) -> InferenceConfiguration {
    InferenceConfiguration::builder()
        .temperature(params.temperature)
        .top_p(params.top_p)
        .set_max_tokens(params.max_tokens.map(|n| i32::try_from(n).unwrap_or(i32::MAX)))
        .build()
}

/// Concatenate the text blocks of an assistant message.
///
/// `None` when the output is not a message or carries no text at all.
fn reply_text(output: Option<&ConverseOutput>) -> Option<String> {
    let message = output?.as_message().ok()?;
    let parts: Vec<&str> = message
        .content()
        .iter()
        .filter_map(|block| block.as_text().ok())
        .map(String::as_str)
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.concat())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assistant(blocks: Vec<ContentBlock>) -> ConverseOutput {
        let message = Message::builder()
            .role(ConversationRole::Assistant)
            .set_content(Some(blocks))
            .build()
            .unwrap();
        ConverseOutput::Message(message)
    }

    #[test]
    fn inference_config_carries_decoding_params() {
        let params = DecodingParams {
            temperature: 0.5,
            top_p: 0.9,
            max_tokens: Some(4096),
        };
        let cfg = inference_config(&params);
        assert_eq!(cfg.temperature(), Some(0.5));
        assert_eq!(cfg.top_p(), Some(0.9));
        assert_eq!(cfg.max_tokens(), Some(4096));
    }

    #[test]
    fn inference_config_omits_unset_max_tokens() {
        let cfg = inference_config(&DecodingParams::default());
        assert_eq!(cfg.max_tokens(), None);
    }

    #[test]
    fn reply_text_joins_text_blocks() {
        let output = assistant(vec![
            ContentBlock::Text("Extracted: ".into()),
            ContentBlock::Text("one room, 12x14 ft".into()),
        ]);
        assert_eq!(
            reply_text(Some(&output)).as_deref(),
            Some("Extracted: one room, 12x14 ft")
        );
    }

    #[test]
    fn reply_text_none_without_output() {
        assert_eq!(reply_text(None), None);
        assert_eq!(reply_text(Some(&assistant(vec![]))), None);
    }
}
