//! Ports: interfaces the engine depends on, implemented by adapters.

pub mod outbound;
