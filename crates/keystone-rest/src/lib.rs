//! # Keystone REST
//!
//! REST API layer using Axum for Keystone.
//! Thin controllers over the service layer; every failure is translated to
//! the response envelope by [`responses::AppError`].

pub mod controllers;
pub mod extractors;
pub mod middleware;
pub mod responses;
pub mod router;
pub mod state;

pub use router::*;
pub use state::*;
