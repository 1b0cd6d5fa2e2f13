//! Remote completion-service port.
//!
//! The narrow contract the dispatch engine needs from any hosted
//! text-completion backend: submit one request carrying a batch of prompts,
//! get back one completion per prompt in the same order plus usage counters,
//! or a typed [`RemoteError`].

use async_trait::async_trait;

use crate::domain::Usage;
use crate::error::RemoteError;

/// The recognizable phrase in the service's batch-size rejection message.
///
/// Adapters classify a rejection containing this phrase as
/// [`RemoteError::SizeLimit`]; discovery parses the numeric limit out of the
/// message. Coupled to the service's current wording, which is why parsing
/// carries an explicit fallback.
pub const SIZE_LIMIT_MARKER: &str = "you can currently request up to at most a total of";

/// A single submission to the remote completion service.
///
/// Built once per batch and never mutated afterwards; temperature is clamped
/// to `[0.0, 1.0]` on construction.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    model: String,
    prompts: Vec<String>,
    max_tokens: u32,
    temperature: f64,
    api_key: String,
    organization: Option<String>,
}

impl CompletionRequest {
    pub fn new(
        model: impl Into<String>,
        prompts: Vec<String>,
        max_tokens: u32,
        temperature: f64,
        api_key: impl Into<String>,
        organization: Option<String>,
    ) -> Self {
        Self {
            model: model.into(),
            prompts,
            max_tokens,
            temperature: temperature.clamp(0.0, 1.0),
            api_key: api_key.into(),
            organization,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn organization(&self) -> Option<&str> {
        self.organization.as_deref()
    }
}

/// One batch's worth of completions.
#[derive(Debug, Clone, Default)]
pub struct BatchCompletion {
    /// Completion texts, one per input prompt, in prompt order.
    pub texts: Vec<String>,
    /// Token usage for this batch only.
    pub usage: Usage,
}

/// Client for batched text completion against a hosted service.
///
/// Implementations wrap a specific provider and handle transport,
/// authentication headers, and response parsing. They must classify failures
/// into [`RemoteError`] kinds; retry and batching policy live in the engine,
/// not here.
///
/// Implementations must be `Send + Sync`: the concurrent dispatcher shares
/// one service across in-flight batch submissions.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// The provider name, for logging.
    fn name(&self) -> &'static str;

    /// Submit one batch of prompts for completion.
    async fn submit(
        &self,
        request: &CompletionRequest,
    ) -> std::result::Result<BatchCompletion, RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temperature_is_clamped_into_unit_interval() {
        let low = CompletionRequest::new("m", vec![], 16, -0.5, "key", None);
        assert_eq!(low.temperature(), 0.0);

        let high = CompletionRequest::new("m", vec![], 16, 1.8, "key", None);
        assert_eq!(high.temperature(), 1.0);

        let mid = CompletionRequest::new("m", vec![], 16, 0.7, "key", None);
        assert_eq!(mid.temperature(), 0.7);
    }

    #[test]
    fn request_preserves_prompt_order() {
        let prompts = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let request = CompletionRequest::new("m", prompts.clone(), 16, 0.0, "key", None);
        assert_eq!(request.prompts(), prompts.as_slice());
    }
}
