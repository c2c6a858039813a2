//! # Keystone Resilience
//!
//! Bounded retry with exponential backoff, used for store connects and
//! transient statement failures.

pub mod retry;

pub use retry::*;
