//! Configuration loading tests.

use std::io::Write;

use promptfan::config::{Config, ExecutionPolicy};
use promptfan::error::{ConfigError, Error};

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn loads_a_complete_file() {
    let file = write_config(
        r#"
        [prompt]
        prompt_template = "Q: {{question}}\nA:"

        [completion]
        model = "text-davinci-003"
        max_tokens = 64
        temperature = 0.7
        organization = "org-123"

        [dispatch]
        execution = "sequential"
        max_in_flight = 4
        default_batch_size = 10
        probe_limit = false

        [retry]
        max_attempts = 5
        initial_delay_ms = 250

        [logging]
        level = "debug"
        format = "json"
        "#,
    );

    let config = Config::load(file.path()).unwrap();
    assert_eq!(
        config.prompt.prompt_template.as_deref(),
        Some("Q: {{question}}\nA:")
    );
    assert_eq!(config.completion.model, "text-davinci-003");
    assert_eq!(config.completion.max_tokens, 64);
    assert_eq!(config.completion.organization.as_deref(), Some("org-123"));
    assert_eq!(config.dispatch.execution, ExecutionPolicy::Sequential);
    assert_eq!(config.dispatch.max_in_flight, 4);
    assert_eq!(config.dispatch.default_batch_size, 10);
    assert!(!config.dispatch.probe_limit);
    assert_eq!(config.retry.max_attempts, 5);
    assert_eq!(config.retry.initial_delay_ms, 250);
    // Unspecified retry fields keep their defaults.
    assert_eq!(config.retry.multiplier, 2.0);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, "json");
}

#[test]
fn empty_file_loads_defaults() {
    let file = write_config("");
    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.completion.model, "text-davinci-002");
    assert_eq!(config.dispatch.default_batch_size, 20);
    assert_eq!(config.dispatch.execution, ExecutionPolicy::Concurrent);
}

#[test]
fn invalid_toml_is_a_parse_error() {
    let file = write_config("completion = not valid toml");
    let err = Config::load(file.path()).unwrap_err();
    assert!(matches!(err, Error::Config(ConfigError::Parse(_))));
}

#[test]
fn missing_file_is_a_read_error() {
    let err = Config::load("/nonexistent/promptfan.toml").unwrap_err();
    assert!(matches!(err, Error::Config(ConfigError::ReadFile(_))));
}

#[test]
fn invalid_values_fail_validation_on_load() {
    let file = write_config(
        r#"
        [retry]
        max_attempts = 0
        "#,
    );
    let err = Config::load(file.path()).unwrap_err();
    assert!(matches!(
        err,
        Error::Config(ConfigError::InvalidValue { field, .. }) if field == "retry.max_attempts"
    ));
}
