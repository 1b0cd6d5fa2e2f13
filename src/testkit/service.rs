//! Mock [`CompletionService`] implementations for testing.
//!
//! - [`ScriptedService`] — pre-loaded submit results popped in order, with
//!   an optional echo fallback once the script runs out. Best for: error
//!   handling, retry behavior, discovery.
//! - [`SizeLimitedService`] — behaves like the real service's batch
//!   ceiling: rejects oversized requests with the canonical size-limit
//!   message, echoes everything else. Best for: end-to-end discovery and
//!   dispatch ordering tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::Usage;
use crate::error::RemoteError;
use crate::port::outbound::completion::{BatchCompletion, CompletionRequest, CompletionService};

/// The canonical size-limit rejection message for a given limit.
pub fn size_limit_message(limit: usize) -> String {
    format!(
        "Too many inputs for this model. \
         However, you can currently request up to at most a total of {limit}). \
         Please reduce the batch size and retry."
    )
}

/// An echo completion: one `echo: <prompt>` text per prompt, with one
/// prompt token and one completion token counted per prompt.
pub fn echo_completion(prompts: &[&str]) -> BatchCompletion {
    let n = prompts.len() as u64;
    BatchCompletion {
        texts: prompts.iter().map(|p| format!("echo: {p}")).collect(),
        usage: Usage {
            prompt_tokens: n,
            completion_tokens: n,
            total_tokens: 2 * n,
        },
    }
}

fn echo_request(request: &CompletionRequest) -> BatchCompletion {
    let prompts: Vec<&str> = request.prompts().iter().map(String::as_str).collect();
    echo_completion(&prompts)
}

// ---------------------------------------------------------------------------
// ScriptedService
// ---------------------------------------------------------------------------

/// A mock service with scripted submit results and call recording.
///
/// Each `submit` pops the next scripted result. Once the script is
/// exhausted, [`ScriptedService::echoing`] echoes the request's prompts
/// while [`ScriptedService::new`] fails fatally (catches tests that submit
/// more than they scripted).
pub struct ScriptedService {
    results: Mutex<VecDeque<Result<BatchCompletion, RemoteError>>>,
    echo_when_exhausted: bool,
    submit_count: AtomicU32,
    requests: Mutex<Vec<Vec<String>>>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self {
            results: Mutex::new(VecDeque::new()),
            echo_when_exhausted: false,
            submit_count: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A service that echoes prompts whenever the script is exhausted.
    pub fn echoing() -> Self {
        Self {
            echo_when_exhausted: true,
            ..Self::new()
        }
    }

    pub fn with_results(self, results: Vec<Result<BatchCompletion, RemoteError>>) -> Self {
        *self.results.lock().unwrap() = results.into();
        self
    }

    /// How many times `submit` was called.
    pub fn submit_count(&self) -> u32 {
        self.submit_count.load(Ordering::SeqCst)
    }

    /// The prompt lists of every submitted request, in call order.
    pub fn seen_prompts(&self) -> Vec<Vec<String>> {
        self.requests.lock().unwrap().clone()
    }

    /// The largest prompt count seen in any single request.
    pub fn largest_request(&self) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(0)
    }
}

impl Default for ScriptedService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionService for ScriptedService {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn submit(
        &self,
        request: &CompletionRequest,
    ) -> Result<BatchCompletion, RemoteError> {
        self.submit_count.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap()
            .push(request.prompts().to_vec());

        if let Some(result) = self.results.lock().unwrap().pop_front() {
            return result;
        }
        if self.echo_when_exhausted {
            Ok(echo_request(request))
        } else {
            Err(RemoteError::Fatal("scripted results exhausted".into()))
        }
    }
}

// ---------------------------------------------------------------------------
// SizeLimitedService
// ---------------------------------------------------------------------------

/// A mock service that enforces a batch ceiling the way the real one does.
///
/// Requests with more than `limit` prompts are rejected with the canonical
/// size-limit message; everything else echoes. Optionally fails a chosen
/// submission (by call number, counting accepted and rejected alike) to
/// exercise abort semantics.
pub struct SizeLimitedService {
    limit: usize,
    fail_call: Option<(u32, RemoteError)>,
    submit_count: AtomicU32,
    requests: Mutex<Vec<Vec<String>>>,
}

impl SizeLimitedService {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            fail_call: None,
            submit_count: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fail the `call`-th submission (1-based) with `error`.
    pub fn failing_call(mut self, call: u32, error: RemoteError) -> Self {
        self.fail_call = Some((call, error));
        self
    }

    pub fn submit_count(&self) -> u32 {
        self.submit_count.load(Ordering::SeqCst)
    }

    pub fn seen_prompts(&self) -> Vec<Vec<String>> {
        self.requests.lock().unwrap().clone()
    }

    /// The largest prompt count seen in any single request.
    pub fn largest_request(&self) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(0)
    }
}

#[async_trait]
impl CompletionService for SizeLimitedService {
    fn name(&self) -> &'static str {
        "size-limited"
    }

    async fn submit(
        &self,
        request: &CompletionRequest,
    ) -> Result<BatchCompletion, RemoteError> {
        let call = self.submit_count.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests
            .lock()
            .unwrap()
            .push(request.prompts().to_vec());

        if let Some((fail_at, error)) = &self.fail_call {
            if call == *fail_at {
                return Err(error.clone());
            }
        }
        if request.prompts().len() > self.limit {
            return Err(RemoteError::SizeLimit {
                message: size_limit_message(self.limit),
            });
        }
        Ok(echo_request(request))
    }
}
