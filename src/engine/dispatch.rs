//! Batch dispatch and result assembly.
//!
//! Runs every planned batch through the retrying submitter, sequentially or
//! on a bounded worker pool, then merges the per-batch completions into one
//! ordered result. Each in-flight submission carries its batch start index
//! as data; output order is always index order, never completion order.
//!
//! Failure semantics are all-or-nothing: the first batch whose retries are
//! exhausted (or that fails fatally) aborts the call, and completed sibling
//! results are discarded. A missing prompt's completion cannot be recovered
//! after the fact, so partial output is never returned.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::debug;

use crate::config::RetryPolicy;
use crate::domain::Usage;
use crate::engine::retry;
use crate::error::{Error, Result};
use crate::port::outbound::completion::{BatchCompletion, CompletionRequest, CompletionService};

/// A planned batch submission: the batch's start index and its request.
pub type Submission = (usize, CompletionRequest);

/// Submit batches one at a time, in order.
pub async fn dispatch_sequential(
    service: &dyn CompletionService,
    policy: &RetryPolicy,
    submissions: Vec<Submission>,
    total: usize,
) -> Result<Vec<(usize, BatchCompletion)>> {
    let mut results = Vec::with_capacity(submissions.len());
    for (start, request) in submissions {
        debug!(
            start,
            end = start + request.prompts().len(),
            total,
            "submitting batch"
        );
        let completion = retry::retry(policy, || service.submit(&request)).await?;
        results.push((start, completion));
    }
    Ok(results)
}

/// Submit all batches to a bounded worker pool simultaneously.
///
/// The pool bound is for throughput only; it carries no ordering semantics.
/// Collection waits on every outstanding submission and sorts by start
/// index. On the first failure, remaining in-flight submissions are dropped
/// with the [`JoinSet`] and their results ignored.
pub async fn dispatch_concurrent(
    service: Arc<dyn CompletionService>,
    policy: RetryPolicy,
    max_in_flight: usize,
    submissions: Vec<Submission>,
    total: usize,
) -> Result<Vec<(usize, BatchCompletion)>> {
    let semaphore = Arc::new(Semaphore::new(max_in_flight.max(1)));
    let mut tasks = JoinSet::new();

    for (start, request) in submissions {
        let service = Arc::clone(&service);
        let policy = policy.clone();
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            // The semaphore is never closed while tasks hold it.
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|_| Error::Internal("dispatcher pool closed".into()))?;
            debug!(
                start,
                end = start + request.prompts().len(),
                total,
                "submitting batch"
            );
            let completion = retry::retry(&policy, || service.submit(&request)).await?;
            Ok::<_, Error>((start, completion))
        });
    }

    let mut results = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(tagged)) => results.push(tagged),
            // Dropping the JoinSet on return aborts still-running siblings;
            // their results are discarded, not surfaced.
            Ok(Err(err)) => return Err(err),
            Err(err) => return Err(Error::Internal(format!("batch task failed: {err}"))),
        }
    }
    results.sort_by_key(|(start, _)| *start);
    Ok(results)
}

/// Merge per-batch completions into one ordered result.
///
/// Texts are concatenated in ascending start-index order and tidied of
/// surrounding newlines; usage counters are summed elementwise.
///
/// # Errors
///
/// Returns [`Error::CompletionCountMismatch`] if the merged output length
/// differs from `expected` — a dispatcher bug, surfaced rather than
/// corrected.
pub fn assemble(
    expected: usize,
    mut results: Vec<(usize, BatchCompletion)>,
) -> Result<(Vec<String>, Usage)> {
    results.sort_by_key(|(start, _)| *start);

    let mut texts = Vec::with_capacity(expected);
    let mut usage = Usage::default();
    for (_, batch) in results {
        usage += batch.usage;
        texts.extend(batch.texts.into_iter().map(tidy));
    }

    if texts.len() != expected {
        return Err(Error::CompletionCountMismatch {
            expected,
            actual: texts.len(),
        });
    }
    Ok((texts, usage))
}

/// Strip the surrounding newlines the service pads completions with.
fn tidy(text: String) -> String {
    text.trim_matches('\n').to_string()
}
