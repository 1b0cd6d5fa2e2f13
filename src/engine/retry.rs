//! Bounded exponential-backoff retry for batch submissions.
//!
//! An explicit policy value plus a generic async [`retry`] function, so the
//! schedule is testable in isolation from the network layer. Only failures
//! the [`RemoteError`] classification marks retriable are retried; a remote
//! fatal error (or a size-limit rejection outside discovery) surfaces on the
//! first attempt.

use std::future::Future;
use std::time::{Duration, Instant};

use rand::Rng;
use tracing::warn;

use crate::config::RetryPolicy;
use crate::error::{Error, RemoteError, Result};

/// Run `operation` until it succeeds, fails fatally, or the retry budget
/// (attempts and total elapsed time) is exhausted.
///
/// Backoff sleeps belong to this submission only; concurrent submissions
/// each carry their own schedule.
///
/// # Errors
///
/// - The operation's error, unchanged, when it is not retriable.
/// - [`Error::RetriesExhausted`] wrapping the last retriable error once
///   `max_attempts` submissions have failed or `max_elapsed_ms` has passed.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, RemoteError>>,
{
    let started = Instant::now();
    let max_elapsed = Duration::from_millis(policy.max_elapsed_ms);
    let mut delay_ms = policy.initial_delay_ms;
    let mut attempt: u32 = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retriable() => {
                let budget_spent =
                    attempt >= policy.max_attempts || started.elapsed() >= max_elapsed;
                if budget_spent {
                    return Err(Error::RetriesExhausted {
                        attempts: attempt,
                        last: err,
                    });
                }

                let delay = jittered(policy, delay_ms);
                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient completion failure, backing off"
                );
                tokio::time::sleep(delay).await;

                // The sleep itself may cross the deadline; a new attempt is
                // only allowed while the elapsed budget holds.
                if started.elapsed() >= max_elapsed {
                    return Err(Error::RetriesExhausted {
                        attempts: attempt,
                        last: err,
                    });
                }

                delay_ms = ((delay_ms as f64) * policy.multiplier) as u64;
                delay_ms = delay_ms.min(policy.max_delay_ms);
                attempt += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }
}

/// Add up to 100% random jitter to the base delay.
///
/// Spreads out retries from submissions that failed together, so they do not
/// hit the rate limit in lockstep again.
fn jittered(policy: &RetryPolicy, base_ms: u64) -> Duration {
    if !policy.jitter || base_ms == 0 {
        return Duration::from_millis(base_ms);
    }
    let factor = 1.0 + rand::thread_rng().gen_range(0.0..1.0);
    Duration::from_millis((base_ms as f64 * factor) as u64)
}
