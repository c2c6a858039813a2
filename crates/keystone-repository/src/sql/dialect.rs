//! SQL generation per dialect.

use crate::{ColumnValue, Filter, Op, Query, SortDirection, TableMapping};
use chrono::{DateTime, Utc};
use keystone_core::EntityId;
use std::fmt::Write;

/// Largest LIMIT MySQL accepts; used when only an OFFSET is requested.
const MYSQL_MAX_LIMIT: u64 = u64::MAX;

/// SQL flavour of the connected store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    MySql,
    Postgres,
}

/// SQL text with its positional parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<ColumnValue>,
}

struct StatementBuilder {
    dialect: Dialect,
    sql: String,
    params: Vec<ColumnValue>,
}

impl StatementBuilder {
    fn new(dialect: Dialect, sql: impl Into<String>) -> Self {
        Self {
            dialect,
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    fn push(&mut self, sql: &str) -> &mut Self {
        self.sql.push_str(sql);
        self
    }

    fn push_param(&mut self, value: impl Into<ColumnValue>) -> &mut Self {
        self.params.push(value.into());
        match self.dialect {
            Dialect::MySql => self.sql.push('?'),
            Dialect::Postgres => {
                let _ = write!(self.sql, "${}", self.params.len());
            }
        }
        self
    }

    fn push_visible(&mut self, filter: &Filter) -> &mut Self {
        self.push(" WHERE is_deleted = FALSE");
        for condition in filter.conditions() {
            self.push(" AND ");
            if condition.op == Op::EqIgnoreCase {
                self.push("LOWER(")
                    .push(&condition.column)
                    .push(") = LOWER(")
                    .push_param(condition.value.clone())
                    .push(")");
            } else {
                // MySQL's default collation folds case; compare text bytewise.
                if self.dialect == Dialect::MySql && matches!(condition.value, ColumnValue::Text(_)) {
                    self.push("BINARY ");
                }
                self.push(&condition.column)
                    .push(" ")
                    .push(operator(condition.op))
                    .push(" ")
                    .push_param(condition.value.clone());
            }
        }
        self
    }

    fn finish(self) -> Statement {
        Statement {
            sql: self.sql,
            params: self.params,
        }
    }
}

const fn operator(op: Op) -> &'static str {
    match op {
        Op::Eq | Op::EqIgnoreCase => "=",
        Op::Ne => "<>",
        Op::Gt => ">",
        Op::Ge => ">=",
        Op::Lt => "<",
        Op::Le => "<=",
    }
}

impl Dialect {
    /// `SELECT` of one non-deleted row by id.
    #[must_use]
    pub fn select_by_id<E: TableMapping>(self, id: EntityId) -> Statement {
        let mut b = StatementBuilder::new(
            self,
            format!("SELECT {} FROM {}", E::select_list(), E::TABLE),
        );
        b.push_visible(&Filter::new()).push(" AND id = ").push_param(id);
        b.finish()
    }

    /// `SELECT` of non-deleted rows matching a query. Columns must be validated.
    #[must_use]
    pub fn select<E: TableMapping>(self, query: &Query) -> Statement {
        let mut b = StatementBuilder::new(
            self,
            format!("SELECT {} FROM {}", E::select_list(), E::TABLE),
        );
        b.push_visible(&query.filter);

        b.push(" ORDER BY ");
        if query.order_by.is_empty() {
            b.push("id ASC");
        } else {
            let terms = query
                .order_by
                .iter()
                .map(|term| {
                    let direction = match term.direction {
                        SortDirection::Asc => "ASC",
                        SortDirection::Desc => "DESC",
                    };
                    format!("{} {}", term.column, direction)
                })
                .collect::<Vec<_>>()
                .join(", ");
            b.push(&terms);
        }

        let limit = match (self, query.limit, query.offset) {
            (_, Some(limit), _) => Some(limit),
            (Self::MySql, None, Some(_)) => Some(MYSQL_MAX_LIMIT),
            _ => None,
        };
        if let Some(limit) = limit {
            b.push(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = query.offset {
            b.push(&format!(" OFFSET {offset}"));
        }
        b.finish()
    }

    /// `COUNT(*)` of non-deleted rows matching a filter.
    #[must_use]
    pub fn count<E: TableMapping>(self, filter: &Filter) -> Statement {
        let mut b = StatementBuilder::new(self, format!("SELECT COUNT(*) FROM {}", E::TABLE));
        b.push_visible(filter);
        b.finish()
    }

    /// `INSERT` of a new row. PostgreSQL returns the generated id.
    #[must_use]
    pub fn insert<E: TableMapping>(self, entity: &E) -> Statement {
        let record = entity.record();
        let columns = ["created_at", "updated_at", "is_deleted"]
            .iter()
            .chain(E::COLUMNS.iter())
            .copied()
            .collect::<Vec<_>>()
            .join(", ");

        let mut b = StatementBuilder::new(
            self,
            format!("INSERT INTO {} ({}) VALUES (", E::TABLE, columns),
        );
        b.push_param(record.created_at)
            .push(", ")
            .push_param(record.updated_at)
            .push(", ")
            .push_param(record.is_deleted);
        for value in entity.column_values() {
            b.push(", ").push_param(value);
        }
        b.push(")");
        if self == Self::Postgres {
            b.push(" RETURNING id");
        }
        b.finish()
    }

    /// `UPDATE` of the entity's columns on its non-deleted row.
    #[must_use]
    pub fn update<E: TableMapping>(self, entity: &E) -> Statement {
        let mut b = StatementBuilder::new(self, format!("UPDATE {} SET updated_at = ", E::TABLE));
        b.push_param(entity.record().updated_at);
        for (column, value) in E::COLUMNS.iter().zip(entity.column_values()) {
            b.push(", ").push(column).push(" = ").push_param(value);
        }
        b.push(" WHERE id = ")
            .push_param(entity.id())
            .push(" AND is_deleted = FALSE");
        b.finish()
    }

    /// Flags a non-deleted row as deleted.
    #[must_use]
    pub fn soft_delete<E: TableMapping>(self, id: EntityId, at: DateTime<Utc>) -> Statement {
        let mut b = StatementBuilder::new(
            self,
            format!("UPDATE {} SET is_deleted = TRUE, updated_at = ", E::TABLE),
        );
        b.push_param(at)
            .push(" WHERE id = ")
            .push_param(id)
            .push(" AND is_deleted = FALSE");
        b.finish()
    }

    /// Removes a row.
    #[must_use]
    pub fn hard_delete<E: TableMapping>(self, id: EntityId) -> Statement {
        let mut b = StatementBuilder::new(self, format!("DELETE FROM {} WHERE id = ", E::TABLE));
        b.push_param(id);
        b.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystone_core::User;

    const SELECT: &str =
        "SELECT id, created_at, updated_at, is_deleted, username, email, password_hash, is_active FROM users";

    #[test]
    fn test_select_by_id_placeholders() {
        let mysql = Dialect::MySql.select_by_id::<User>(EntityId(3));
        assert_eq!(mysql.sql, format!("{SELECT} WHERE is_deleted = FALSE AND id = ?"));
        assert_eq!(mysql.params, vec![ColumnValue::Int(3)]);

        let pg = Dialect::Postgres.select_by_id::<User>(EntityId(3));
        assert_eq!(pg.sql, format!("{SELECT} WHERE is_deleted = FALSE AND id = $1"));
    }

    #[test]
    fn test_select_with_filter_order_and_paging() {
        let query = Query {
            filter: Filter::new().eq_ignore_case("email", "A@X.COM").eq("is_active", true),
            order_by: vec![crate::OrderBy {
                column: "created_at".to_string(),
                direction: SortDirection::Desc,
            }],
            limit: Some(10),
            offset: Some(20),
        };

        let pg = Dialect::Postgres.select::<User>(&query);
        assert_eq!(
            pg.sql,
            format!(
                "{SELECT} WHERE is_deleted = FALSE AND LOWER(email) = LOWER($1) AND is_active = $2 ORDER BY created_at DESC LIMIT 10 OFFSET 20"
            )
        );
        assert_eq!(pg.params.len(), 2);
    }

    #[test]
    fn test_mysql_offset_without_limit() {
        let query = Query {
            offset: Some(5),
            ..Query::default()
        };
        let mysql = Dialect::MySql.select::<User>(&query);
        assert!(mysql
            .sql
            .ends_with("ORDER BY id ASC LIMIT 18446744073709551615 OFFSET 5"));

        let pg = Dialect::Postgres.select::<User>(&query);
        assert!(pg.sql.ends_with("ORDER BY id ASC OFFSET 5"));
    }

    #[test]
    fn test_count() {
        let statement = Dialect::MySql.count::<User>(&Filter::new().ne("username", "root"));
        assert_eq!(
            statement.sql,
            "SELECT COUNT(*) FROM users WHERE is_deleted = FALSE AND BINARY username <> ?"
        );
    }

    #[test]
    fn test_text_equality_is_case_sensitive_on_both_dialects() {
        let filter = Filter::new().eq("email", "Alice@x.com").eq("is_active", true);

        let mysql = Dialect::MySql.count::<User>(&filter);
        assert_eq!(
            mysql.sql,
            "SELECT COUNT(*) FROM users WHERE is_deleted = FALSE AND BINARY email = ? AND is_active = ?"
        );

        let pg = Dialect::Postgres.count::<User>(&filter);
        assert_eq!(
            pg.sql,
            "SELECT COUNT(*) FROM users WHERE is_deleted = FALSE AND email = $1 AND is_active = $2"
        );
    }

    #[test]
    fn test_ignore_case_stays_folded_on_mysql() {
        let mysql = Dialect::MySql.count::<User>(&Filter::new().eq_ignore_case("email", "A@X.COM"));
        assert_eq!(
            mysql.sql,
            "SELECT COUNT(*) FROM users WHERE is_deleted = FALSE AND LOWER(email) = LOWER(?)"
        );
    }

    #[test]
    fn test_insert() {
        let user = User::new("alice", "alice@x.com", "hash");

        let mysql = Dialect::MySql.insert(&user);
        assert_eq!(
            mysql.sql,
            "INSERT INTO users (created_at, updated_at, is_deleted, username, email, password_hash, is_active) VALUES (?, ?, ?, ?, ?, ?, ?)"
        );
        assert_eq!(mysql.params.len(), 7);

        let pg = Dialect::Postgres.insert(&user);
        assert!(pg.sql.ends_with("VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id"));
    }

    #[test]
    fn test_update() {
        let mut user = User::new("alice", "alice@x.com", "hash");
        user.record.id = EntityId(8);

        let pg = Dialect::Postgres.update(&user);
        assert_eq!(
            pg.sql,
            "UPDATE users SET updated_at = $1, username = $2, email = $3, password_hash = $4, is_active = $5 WHERE id = $6 AND is_deleted = FALSE"
        );
        assert_eq!(pg.params.last(), Some(&ColumnValue::Int(8)));
    }

    #[test]
    fn test_deletes() {
        let soft = Dialect::MySql.soft_delete::<User>(EntityId(2), Utc::now());
        assert_eq!(
            soft.sql,
            "UPDATE users SET is_deleted = TRUE, updated_at = ? WHERE id = ? AND is_deleted = FALSE"
        );

        let hard = Dialect::Postgres.hard_delete::<User>(EntityId(2));
        assert_eq!(hard.sql, "DELETE FROM users WHERE id = $1");
    }
}
