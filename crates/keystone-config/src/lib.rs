//! # Keystone Config
//!
//! Configuration management for Keystone.
//! Supports layered configuration from files, environment variables,
//! and runtime refresh.

mod app_config;
mod loader;
mod provider;
mod validation;

pub use app_config::*;
pub use loader::*;
pub use provider::*;
pub use validation::*;
