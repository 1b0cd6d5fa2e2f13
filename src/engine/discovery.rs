//! Batch-size discovery.
//!
//! The service's maximum prompts-per-request is not published; it is
//! discovered by submitting one request containing the entire prompt set.
//! If that probe succeeds no batching is needed at all. If the service
//! rejects it for size, the numeric limit is parsed out of the rejection
//! message, with an explicit fallback to the configured default because the
//! wording is owned by the service and may change.

use tracing::{debug, info};

use crate::error::{RemoteError, Result};
use crate::port::outbound::completion::{BatchCompletion, CompletionRequest, CompletionService};

/// Substring preceding the numeric limit in the rejection message.
const LIMIT_PATTERN: &str = "a total of";

/// Outcome of probing the service with the full prompt set.
#[derive(Debug)]
pub enum Discovery {
    /// The probe succeeded; the whole set completed as a single batch.
    Completed(BatchCompletion),
    /// The service's batch ceiling, parsed from its rejection or defaulted.
    Limit(usize),
}

/// Parse the batch limit from a size-limit rejection message.
///
/// The expected shape ends in `"... a total of N)."`; anything else returns
/// `None` and the caller falls back to its configured default.
pub fn parse_size_limit(message: &str) -> Option<usize> {
    let at = message.find(LIMIT_PATTERN)?;
    let tail = &message[at + LIMIT_PATTERN.len()..];
    let number = tail.split(").").next()?;
    number.trim().parse().ok()
}

/// Probe the service with the full-set `request`.
///
/// The probe itself is never retried: a size-limit rejection is the expected
/// discovery signal, and any other failure here propagates unchanged.
pub async fn discover(
    service: &dyn CompletionService,
    request: &CompletionRequest,
    default_limit: usize,
) -> Result<Discovery> {
    debug!(
        prompts = request.prompts().len(),
        service = service.name(),
        "probing batch size limit with full prompt set"
    );
    match service.submit(request).await {
        Ok(completion) => {
            debug!("probe succeeded, no batching needed");
            Ok(Discovery::Completed(completion))
        }
        Err(RemoteError::SizeLimit { message }) => {
            let limit = match parse_size_limit(&message) {
                Some(limit) => {
                    info!(limit, "discovered batch size limit");
                    limit
                }
                None => {
                    info!(
                        default_limit,
                        "size limit message did not match the expected shape, using default"
                    );
                    default_limit
                }
            };
            Ok(Discovery::Limit(limit))
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::testkit::service::{size_limit_message, ScriptedService};

    fn request(n: usize) -> CompletionRequest {
        let prompts = (0..n).map(|i| format!("prompt {i}")).collect();
        CompletionRequest::new("test-model", prompts, 16, 0.0, "test-key", None)
    }

    #[test]
    fn parses_limit_from_canonical_message() {
        let message = size_limit_message(20);
        assert_eq!(parse_size_limit(&message), Some(20));
    }

    #[test]
    fn parses_limit_from_raw_service_wording() {
        let message = "Too many inputs for this model. \
             However, you can currently request up to at most a total of 25). \
             Please reduce the batch size.";
        assert_eq!(parse_size_limit(message), Some(25));
    }

    #[test]
    fn unrecognized_message_parses_to_none() {
        assert_eq!(parse_size_limit("batch too large, try fewer prompts"), None);
        assert_eq!(parse_size_limit("a total of twenty)."), None);
        assert_eq!(parse_size_limit(""), None);
    }

    #[test]
    fn missing_terminator_parses_whole_tail() {
        // Without ")." the whole tail must be a number to parse.
        assert_eq!(parse_size_limit("a total of 12"), Some(12));
        assert_eq!(parse_size_limit("a total of 12 prompts"), None);
    }

    #[tokio::test]
    async fn successful_probe_short_circuits() {
        let service = ScriptedService::echoing();
        let discovery = discover(&service, &request(3), 20).await.unwrap();
        match discovery {
            Discovery::Completed(batch) => assert_eq!(batch.texts.len(), 3),
            Discovery::Limit(_) => panic!("expected Completed"),
        }
    }

    #[tokio::test]
    async fn size_limit_rejection_yields_parsed_limit() {
        let service = ScriptedService::new().with_results(vec![Err(RemoteError::SizeLimit {
            message: size_limit_message(7),
        })]);
        let discovery = discover(&service, &request(50), 20).await.unwrap();
        assert!(matches!(discovery, Discovery::Limit(7)));
    }

    #[tokio::test]
    async fn unparseable_rejection_falls_back_to_default() {
        let service = ScriptedService::new().with_results(vec![Err(RemoteError::SizeLimit {
            message: "your batch is too big".into(),
        })]);
        let discovery = discover(&service, &request(50), 20).await.unwrap();
        assert!(matches!(discovery, Discovery::Limit(20)));
    }

    #[tokio::test]
    async fn other_errors_propagate_without_retry() {
        let service = ScriptedService::new()
            .with_results(vec![Err(RemoteError::Fatal("invalid api key".into()))]);
        let err = discover(&service, &request(5), 20).await.unwrap_err();
        assert!(matches!(err, Error::Remote(RemoteError::Fatal(_))));
        assert_eq!(service.submit_count(), 1);
    }

    #[tokio::test]
    async fn transient_error_during_discovery_is_not_retried() {
        let service =
            ScriptedService::new().with_results(vec![Err(RemoteError::Transient("503".into()))]);
        let err = discover(&service, &request(5), 20).await.unwrap_err();
        assert!(matches!(err, Error::Remote(RemoteError::Transient(_))));
        assert_eq!(service.submit_count(), 1);
    }
}
