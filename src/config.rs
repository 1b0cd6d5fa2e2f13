//! Configuration loading from TOML files.
//!
//! Every field has a serde default so a partial (or empty) file works; the
//! defaults mirror the service's documented completion defaults. The API key
//! is deliberately resolvable from the environment as well as the file so
//! secrets can stay out of checked-in config.

use std::path::Path;

use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{ConfigError, Error, Result};

/// Environment variable consulted when `completion.api_key` is unset.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// How rows become prompts.
    #[serde(default)]
    pub prompt: PromptConfig,
    /// Model and sampling settings for the completion request.
    #[serde(default)]
    pub completion: CompletionConfig,
    /// Batching and execution-policy settings.
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Backoff schedule for transient failures.
    #[serde(default)]
    pub retry: RetryPolicy,
    /// Log filter and output format.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `"json"` for machine-readable output, anything else is human-readable.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl LoggingConfig {
    /// Install the global tracing subscriber with this configuration.
    ///
    /// `RUST_LOG` takes precedence over the configured level when set.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        match self.format.as_str() {
            "json" => {
                fmt().json().with_env_filter(filter).init();
            }
            _ => {
                fmt().with_env_filter(filter).init();
            }
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Prompt-mode selection.
///
/// Exactly one of `prompt_template` and `question_column` must be set;
/// `context_column` is only valid alongside `question_column`. Validated by
/// [`PromptMode::from_config`](crate::domain::PromptMode::from_config)
/// before any request is built.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromptConfig {
    /// Template with `{{column}}` placeholders, rendered per row.
    #[serde(default)]
    pub prompt_template: Option<String>,
    /// Column holding the question text.
    #[serde(default)]
    pub question_column: Option<String>,
    /// Column holding context to prepend to the question.
    #[serde(default)]
    pub context_column: Option<String>,
}

/// Completion request settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionConfig {
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// Maximum tokens to generate per completion.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Sampling temperature, clamped to `[0.0, 1.0]` at request build time.
    #[serde(default)]
    pub temperature: f64,
    /// API key; falls back to the `OPENAI_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Optional organization identifier sent with each request.
    #[serde(default)]
    pub organization: Option<String>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: 0.0,
            api_key: None,
            organization: None,
        }
    }
}

/// Execution policy for batch submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionPolicy {
    /// Submit batches one at a time, in order.
    Sequential,
    /// Submit all batches to a bounded worker pool simultaneously.
    #[default]
    Concurrent,
}

/// Batching and dispatch settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// Sequential or concurrent batch submission.
    #[serde(default)]
    pub execution: ExecutionPolicy,
    /// Upper bound on simultaneously in-flight batch submissions.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    /// Batch size used when the service's limit cannot be discovered.
    #[serde(default = "default_batch_size")]
    pub default_batch_size: usize,
    /// Whether to probe the service's batch limit with one full-size
    /// request. Disabling skips the probe (and its quota cost) and plans
    /// batches from `default_batch_size` directly.
    #[serde(default = "default_true")]
    pub probe_limit: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            execution: ExecutionPolicy::default(),
            max_in_flight: default_max_in_flight(),
            default_batch_size: default_batch_size(),
            probe_limit: true,
        }
    }
}

/// Backoff schedule for retrying transient remote failures.
///
/// Delays grow geometrically from `initial_delay_ms` by `multiplier`, capped
/// at `max_delay_ms`, with up to 100% randomized jitter added per sleep.
/// Retrying stops at `max_attempts` total attempts or once `max_elapsed_ms`
/// has passed, whichever comes first.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryPolicy {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_max_elapsed_ms")]
    pub max_elapsed_ms: u64,
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            multiplier: default_multiplier(),
            max_delay_ms: default_max_delay_ms(),
            max_elapsed_ms: default_max_elapsed_ms(),
            jitter: true,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Check field-level invariants.
    ///
    /// Prompt-mode exclusivity is validated separately when the mode is
    /// selected, where the error can name the offending combination.
    pub fn validate(&self) -> Result<()> {
        if self.completion.model.is_empty() {
            return Err(ConfigError::MissingField { field: "model" }.into());
        }
        if self.completion.temperature.is_nan() {
            return Err(ConfigError::InvalidValue {
                field: "temperature",
                reason: "must be a number".into(),
            }
            .into());
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retry.max_attempts",
                reason: "must be at least 1".into(),
            }
            .into());
        }
        if self.retry.multiplier < 1.0 || self.retry.multiplier.is_nan() {
            return Err(ConfigError::InvalidValue {
                field: "retry.multiplier",
                reason: "must be at least 1.0".into(),
            }
            .into());
        }
        if self.dispatch.default_batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "dispatch.default_batch_size",
                reason: "must be at least 1".into(),
            }
            .into());
        }
        Ok(())
    }

    /// Resolve the API key: config value first, then `OPENAI_API_KEY`.
    ///
    /// A local `.env` file is honored for the environment lookup, which only
    /// happens when the config carries no key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCredential`] if neither source has a key.
    pub fn resolve_api_key(&self) -> Result<String> {
        self.resolve_api_key_with(|name| {
            let _ = dotenvy::dotenv();
            std::env::var(name).ok()
        })
    }

    /// Resolve the API key with an explicit environment lookup.
    ///
    /// The configured key wins; `lookup` is consulted only when the config
    /// has none. Lets tests control the environment without mutating it.
    pub fn resolve_api_key_with<F>(&self, lookup: F) -> Result<String>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        if let Some(key) = &self.completion.api_key {
            return Ok(key.clone());
        }
        lookup(API_KEY_ENV).ok_or(Error::MissingCredential)
    }
}

fn default_model() -> String {
    "text-davinci-002".into()
}

const fn default_max_tokens() -> u32 {
    20
}

const fn default_max_in_flight() -> usize {
    8
}

const fn default_batch_size() -> usize {
    20
}

const fn default_max_attempts() -> u32 {
    10
}

const fn default_initial_delay_ms() -> u64 {
    1_000
}

fn default_multiplier() -> f64 {
    2.0
}

const fn default_max_delay_ms() -> u64 {
    60_000
}

const fn default_max_elapsed_ms() -> u64 {
    300_000
}

const fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}
