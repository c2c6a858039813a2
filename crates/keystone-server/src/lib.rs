//! # Keystone Server Library
//!
//! Composition root and startup utilities for the Keystone server.

pub mod di;
pub mod startup;
