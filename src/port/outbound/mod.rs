//! Outbound ports (driven side): contracts for infrastructure dependencies.

pub mod completion;
