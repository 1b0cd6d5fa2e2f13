//! Canonical test configurations.

use std::sync::Once;

use crate::config::{Config, LoggingConfig, RetryPolicy};

/// Install the global tracing subscriber for test log output.
///
/// Safe to call from any number of tests in one binary; only the first call
/// installs.
pub fn init_test_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        LoggingConfig {
            level: "debug".into(),
            ..LoggingConfig::default()
        }
        .init();
    });
}

/// Retry policy with millisecond delays so tests run fast.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_delay_ms: 1,
        multiplier: 2.0,
        max_delay_ms: 4,
        max_elapsed_ms: 5_000,
        jitter: false,
    }
}

/// A question-column config with a fixed API key and fast retries.
pub fn question_config(column: &str) -> Config {
    let mut config = Config::default();
    config.prompt.question_column = Some(column.into());
    config.completion.api_key = Some("test-key".into());
    config.retry = fast_retry();
    config
}

/// A template config with a fixed API key and fast retries.
pub fn template_config(template: &str) -> Config {
    let mut config = Config::default();
    config.prompt.prompt_template = Some(template.into());
    config.completion.api_key = Some("test-key".into());
    config.retry = fast_retry();
    config
}
