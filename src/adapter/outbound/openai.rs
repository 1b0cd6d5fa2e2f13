//! OpenAI completion client.
//!
//! Implements [`CompletionService`] against the legacy Completions endpoint,
//! which accepts an array of prompts per request — the property the whole
//! batching engine is built on. Responsibilities end at transport,
//! authentication headers, response parsing, and classifying failures into
//! [`RemoteError`]; retry and batch policy live in the engine.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::domain::Usage;
use crate::error::RemoteError;
use crate::port::outbound::completion::{
    BatchCompletion, CompletionRequest, CompletionService, SIZE_LIMIT_MARKER,
};

/// OpenAI Completions API endpoint.
const API_URL: &str = "https://api.openai.com/v1/completions";

/// OpenAI API client.
#[derive(Debug)]
pub struct OpenAi {
    /// HTTP client for API requests.
    client: Client,
    /// Endpoint URL; constant in production, overridable for tests.
    url: String,
}

impl OpenAi {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            url: API_URL.to_string(),
        }
    }

    /// Point the client at a different endpoint (local proxies, tests).
    #[must_use]
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

impl Default for OpenAi {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct Request<'a> {
    model: &'a str,
    prompt: &'a [String],
    max_tokens: u32,
    temperature: f64,
}

#[derive(Deserialize)]
struct Response {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Deserialize)]
struct Choice {
    text: String,
    index: usize,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Pull the human-readable message out of an error payload, falling back to
/// the raw body when it is not the documented JSON shape.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) => body.to_string(),
    }
}

/// Classify an HTTP failure into the typed [`RemoteError`] kinds.
///
/// 429 is the rate ceiling; 5xx is transient; a 4xx carrying the size-limit
/// phrase is the discovery signal; every other 4xx is fatal.
fn classify(status: StatusCode, message: String) -> RemoteError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        RemoteError::RateLimited
    } else if status.is_server_error() {
        RemoteError::Transient(message)
    } else if message.contains(SIZE_LIMIT_MARKER) {
        RemoteError::SizeLimit { message }
    } else {
        RemoteError::Fatal(message)
    }
}

#[async_trait]
impl CompletionService for OpenAi {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn submit(
        &self,
        request: &CompletionRequest,
    ) -> Result<BatchCompletion, RemoteError> {
        let body = Request {
            model: request.model(),
            prompt: request.prompts(),
            max_tokens: request.max_tokens(),
            temperature: request.temperature(),
        };

        let mut http = self
            .client
            .post(&self.url)
            .bearer_auth(request.api_key())
            .json(&body);
        if let Some(organization) = request.organization() {
            http = http.header("OpenAI-Organization", organization);
        }

        // Transport failures (connect, timeout) are worth a retry.
        let response = http
            .send()
            .await
            .map_err(|e| RemoteError::Transient(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify(status, error_message(&body)));
        }

        let parsed: Response = response
            .json()
            .await
            .map_err(|e| RemoteError::Fatal(format!("malformed response body: {e}")))?;

        // Choices carry their prompt index; sort rather than trust payload
        // order.
        let mut choices = parsed.choices;
        choices.sort_by_key(|c| c.index);
        Ok(BatchCompletion {
            texts: choices.into_iter().map(|c| c.text).collect(),
            usage: parsed.usage,
        })
    }
}


/// Integration tests that require real API access.
/// Run with: `cargo test --features integration-tests -- --ignored`
#[cfg(all(test, feature = "integration-tests"))]
mod integration_tests {
    use super::*;

    #[tokio::test]
    #[ignore = "requires OPENAI_API_KEY and network access"]
    async fn batched_prompts_complete_in_order() {
        let Ok(api_key) = std::env::var("OPENAI_API_KEY") else {
            eprintln!("Skipping OpenAI integration test: no OPENAI_API_KEY");
            return;
        };

        let client = OpenAi::new();
        let request = CompletionRequest::new(
            "gpt-3.5-turbo-instruct",
            vec![
                "Say 'alpha' and nothing else.".into(),
                "Say 'beta' and nothing else.".into(),
            ],
            8,
            0.0,
            api_key,
            None,
        );

        let completion = client.submit(&request).await.expect("API call failed");
        assert_eq!(completion.texts.len(), 2);
        assert!(completion.texts[0].to_lowercase().contains("alpha"));
        assert!(completion.texts[1].to_lowercase().contains("beta"));
    }
}
