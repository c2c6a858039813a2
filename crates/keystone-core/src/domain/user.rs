//! User entity.

use crate::{Entity, Record};
use serde::{Deserialize, Serialize};

/// User entity, the reference entity served by Keystone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Identity, timestamps and soft-delete flag.
    #[serde(flatten)]
    pub record: Record,

    /// Display name.
    pub username: String,

    /// Email address, unique across non-deleted users ignoring case.
    pub email: String,

    /// Hashed password (never exposed via API).
    pub password_hash: String,

    /// Whether the account is active.
    pub is_active: bool,
}

impl User {
    /// Creates a new, not yet persisted user.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            record: Record::new(),
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            is_active: false,
        }
    }

    /// Activates the account.
    pub fn activate(&mut self) {
        self.is_active = true;
        self.record.touch();
    }

    /// Deactivates the account.
    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.record.touch();
    }
}

impl Entity for User {
    const RESOURCE: &'static str = "user";

    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }
}
