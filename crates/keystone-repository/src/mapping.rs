//! Entity-to-table mapping.

use crate::ColumnValue;
use keystone_core::{Entity, KeystoneError, KeystoneResult};
use sqlx::mysql::MySqlRow;
use sqlx::postgres::PgRow;
use sqlx::FromRow;

/// Columns every mapped table carries for the shared record.
pub const RECORD_COLUMNS: &[&str] = &["id", "created_at", "updated_at", "is_deleted"];

/// How `delete` removes a row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Remove the row.
    #[default]
    Hard,
    /// Set `is_deleted` and keep the row.
    Soft,
}

impl DeletePolicy {
    /// Maps the `soft_delete` configuration flag to a policy.
    #[must_use]
    pub const fn from_soft_delete(soft_delete: bool) -> Self {
        if soft_delete {
            Self::Soft
        } else {
            Self::Hard
        }
    }
}

/// Describes how an entity is stored in a table.
///
/// `COLUMNS` lists the entity's own columns (the record columns are implied)
/// and `column_values` yields their values in the same order.
pub trait TableMapping: Entity {
    /// Table name.
    const TABLE: &'static str;

    /// Entity-specific columns, in insert order.
    const COLUMNS: &'static [&'static str];

    /// Persisted row shape, decodable from both supported stores.
    type Row: for<'r> FromRow<'r, MySqlRow> + for<'r> FromRow<'r, PgRow> + Send + Unpin;

    /// Converts a stored row into the entity.
    fn from_row(row: Self::Row) -> KeystoneResult<Self>;

    /// Values of `COLUMNS`, in the same order.
    fn column_values(&self) -> Vec<ColumnValue>;

    /// Looks up the value of any mapped column, record columns included.
    fn value_of(&self, column: &str) -> Option<ColumnValue> {
        let record = self.record();
        match column {
            "id" => Some(ColumnValue::Int(record.id.into_inner())),
            "created_at" => Some(ColumnValue::Timestamp(Some(record.created_at))),
            "updated_at" => Some(ColumnValue::Timestamp(record.updated_at)),
            "is_deleted" => Some(ColumnValue::Bool(record.is_deleted)),
            _ => Self::COLUMNS
                .iter()
                .position(|c| *c == column)
                .and_then(|index| self.column_values().into_iter().nth(index)),
        }
    }

    /// Returns true if `column` belongs to the mapping.
    fn has_column(column: &str) -> bool {
        RECORD_COLUMNS.contains(&column) || Self::COLUMNS.contains(&column)
    }

    /// Comma-separated select list, record columns first.
    fn select_list() -> String {
        RECORD_COLUMNS
            .iter()
            .chain(Self::COLUMNS.iter())
            .copied()
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Rejects any column that does not belong to the entity's mapping.
pub fn validate_columns<'c, E: TableMapping>(
    columns: impl IntoIterator<Item = &'c str>,
) -> KeystoneResult<()> {
    for column in columns {
        if !E::has_column(column) {
            return Err(KeystoneError::validation(format!(
                "Unknown column '{}' for {}",
                column,
                E::TABLE
            )));
        }
    }
    Ok(())
}
