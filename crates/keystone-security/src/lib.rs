//! # Keystone Security
//!
//! Secret hashing for Keystone. User passwords are stored only as
//! Argon2id hashes computed before insert.

pub mod password;

pub use password::*;
