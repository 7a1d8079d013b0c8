//! Process bootstrap and resilience primitives.

pub mod bootstrap;
pub mod breaker;
pub mod retry;
