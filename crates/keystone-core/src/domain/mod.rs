//! Domain entities managed by Keystone.

pub mod user;

pub use user::*;
