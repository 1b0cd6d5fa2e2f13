//! Promptfan - batched, concurrent, retrying text completion for tables.
//!
//! Turns a table of rows into natural-language completions from a hosted
//! text-completion service, under the three constraints such services
//! impose: a maximum number of prompts per request, a request-rate ceiling,
//! and transient failures that must be retried rather than surfaced. The
//! engine discovers the prompts-per-request ceiling at call time, fans
//! batches out concurrently, and guarantees the result is one completion
//! per row in row order — no prompt dropped, none duplicated, or the call
//! fails as a whole.
//!
//! # Architecture
//!
//! Hexagonal: pure domain logic behind ports, infrastructure in adapters.
//!
//! - [`domain`] - Templates, prompt building, batch planning, usage
//!   counters, and the [`Table`](domain::Table) trait rows come in through
//! - [`port`] - The [`CompletionService`](port::outbound::completion::CompletionService)
//!   contract the engine drives
//! - [`adapter`] - The OpenAI Completions implementation of that contract
//! - [`engine`] - Batch-size discovery, retry policy, the sequential and
//!   concurrent dispatchers, and result assembly
//! - [`config`] - TOML configuration with environment API-key fallback
//! - [`error`] - Error types for the crate
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use promptfan::adapter::outbound::openai::OpenAi;
//! use promptfan::config::Config;
//! use promptfan::domain::MemoryTable;
//! use promptfan::engine::CompletionEngine;
//!
//! # async fn run() -> promptfan::error::Result<()> {
//! let mut config = Config::default();
//! config.prompt.question_column = Some("question".into());
//!
//! let mut table = MemoryTable::new(["question"]);
//! table.push_row(["What is the airspeed velocity of an unladen swallow?"]);
//!
//! let engine = CompletionEngine::new(Arc::new(OpenAi::new()), config);
//! let prediction = engine.predict(&table).await?;
//! println!("{}", prediction.completions[0]);
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use config::Config;
pub use engine::{CompletionEngine, Prediction};
pub use error::{Error, Result};
