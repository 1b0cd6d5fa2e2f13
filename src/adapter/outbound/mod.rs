//! Outbound adapters for remote services.

pub mod openai;
