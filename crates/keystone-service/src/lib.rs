//! # Keystone Service
//!
//! Business logic layer for Keystone.
//! Generic CRUD services with cache-aside caching, plus the user service.

pub mod cache;
mod crud_service;
pub mod dto;
pub mod r#impl;
pub mod user_service;

pub use cache::*;
pub use crud_service::*;
pub use dto::*;
pub use r#impl::*;
pub use user_service::*;
