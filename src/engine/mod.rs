//! The prediction engine: discovery, retry, dispatch, assembly.
//!
//! [`CompletionEngine`] is the entry point. One `predict` call validates the
//! configuration, renders every row into a prompt, discovers the service's
//! batch ceiling, fans the batches out through the retrying dispatcher, and
//! reassembles the completions in row order. All dispatch state is local to
//! the call; limits are rediscovered every time because the service may
//! change them between calls.

pub mod discovery;
pub mod dispatch;
pub mod retry;

use std::sync::Arc;

use tracing::debug;

use crate::config::{Config, ExecutionPolicy};
use crate::domain::{build_prompts, plan, PromptMode, Table, Usage};
use crate::engine::discovery::Discovery;
use crate::engine::dispatch::Submission;
use crate::error::Result;
use crate::port::outbound::completion::{CompletionRequest, CompletionService};

/// The ordered outcome of one prediction call.
#[derive(Debug, Clone, Default)]
pub struct Prediction {
    /// One completion per input row, in row order.
    pub completions: Vec<String>,
    /// Token usage aggregated across every batch of the call.
    pub usage: Usage,
}

/// Batched, concurrent, retrying completion dispatch over a row table.
pub struct CompletionEngine {
    service: Arc<dyn CompletionService>,
    config: Config,
}

impl CompletionEngine {
    pub fn new(service: Arc<dyn CompletionService>, config: Config) -> Self {
        Self { service, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Complete every row of `table`.
    ///
    /// Configuration and credential problems are detected before any request
    /// is sent. Transient remote failures are absorbed by retry; a fatal
    /// remote failure aborts the whole call with no partial output.
    ///
    /// # Errors
    ///
    /// See [`Error`](crate::error::Error) for the full taxonomy. An empty
    /// table returns an empty prediction without contacting the service.
    pub async fn predict(&self, table: &dyn Table) -> Result<Prediction> {
        self.config.validate()?;
        let mode = PromptMode::from_config(&self.config.prompt)?;
        let api_key = self.config.resolve_api_key()?;

        let prompts = build_prompts(table, &mode)?;
        if prompts.is_empty() {
            return Ok(Prediction::default());
        }
        let total = prompts.len();

        let discovery = if self.config.dispatch.probe_limit {
            let probe = self.request_for(prompts.texts(), &api_key);
            discovery::discover(
                self.service.as_ref(),
                &probe,
                self.config.dispatch.default_batch_size,
            )
            .await?
        } else {
            Discovery::Limit(self.config.dispatch.default_batch_size)
        };

        let results = match discovery {
            Discovery::Completed(batch) => vec![(0, batch)],
            Discovery::Limit(limit) => {
                let submissions: Vec<Submission> = plan(&prompts, limit)
                    .iter()
                    .map(|batch| {
                        let texts = prompts.slice_texts(batch.start(), batch.len());
                        (batch.start(), self.request_for(texts, &api_key))
                    })
                    .collect();
                debug!(
                    batches = submissions.len(),
                    limit, total, "dispatching batches"
                );
                match self.config.dispatch.execution {
                    ExecutionPolicy::Sequential => {
                        dispatch::dispatch_sequential(
                            self.service.as_ref(),
                            &self.config.retry,
                            submissions,
                            total,
                        )
                        .await?
                    }
                    ExecutionPolicy::Concurrent => {
                        dispatch::dispatch_concurrent(
                            Arc::clone(&self.service),
                            self.config.retry.clone(),
                            self.config.dispatch.max_in_flight,
                            submissions,
                            total,
                        )
                        .await?
                    }
                }
            }
        };

        let (completions, usage) = dispatch::assemble(total, results)?;
        debug!(
            rows = total,
            total_tokens = usage.total_tokens,
            "prediction complete"
        );
        Ok(Prediction { completions, usage })
    }

    fn request_for(&self, prompts: Vec<String>, api_key: &str) -> CompletionRequest {
        let completion = &self.config.completion;
        CompletionRequest::new(
            completion.model.clone(),
            prompts,
            completion.max_tokens,
            completion.temperature,
            api_key,
            completion.organization.clone(),
        )
    }
}
