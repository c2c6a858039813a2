//! `users` table mapping.

use crate::{ColumnValue, TableMapping};
use chrono::{DateTime, Utc};
use keystone_core::{EntityId, KeystoneResult, Record, User};
use sqlx::FromRow;

/// Database row representation of a user.
#[derive(Debug, FromRow)]
pub struct UserRow {
    id: i64,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    is_deleted: bool,
    username: String,
    email: String,
    password_hash: String,
    is_active: bool,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            record: Record {
                id: EntityId(row.id),
                created_at: row.created_at,
                updated_at: row.updated_at,
                is_deleted: row.is_deleted,
            },
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            is_active: row.is_active,
        }
    }
}

impl TableMapping for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] = &["username", "email", "password_hash", "is_active"];

    type Row = UserRow;

    fn from_row(row: UserRow) -> KeystoneResult<Self> {
        Ok(row.into())
    }

    fn column_values(&self) -> Vec<ColumnValue> {
        vec![
            ColumnValue::Text(self.username.clone()),
            ColumnValue::Text(self.email.clone()),
            ColumnValue::Text(self.password_hash.clone()),
            ColumnValue::Bool(self.is_active),
        ]
    }
}
