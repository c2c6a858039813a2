//! Column filters and query descriptions.
//!
//! A [`Filter`] is a pure conjunction of column conditions. It is evaluated
//! either by generating SQL or directly against entity values in memory, so
//! both stores agree on what matches.

use chrono::{DateTime, Utc};
use keystone_core::EntityId;
use std::cmp::Ordering;

/// A typed value of a mapped column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnValue {
    Int(i64),
    Text(String),
    Bool(bool),
    Timestamp(Option<DateTime<Utc>>),
}

impl ColumnValue {
    /// Compares two values of the same kind. NULL never compares.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Timestamp(Some(a)), Self::Timestamp(Some(b))) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl From<i64> for ColumnValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for ColumnValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<EntityId> for ColumnValue {
    fn from(value: EntityId) -> Self {
        Self::Int(value.into_inner())
    }
}

impl From<&str> for ColumnValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ColumnValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for ColumnValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<DateTime<Utc>> for ColumnValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(Some(value))
    }
}

impl From<Option<DateTime<Utc>>> for ColumnValue {
    fn from(value: Option<DateTime<Utc>>) -> Self {
        Self::Timestamp(value)
    }
}

/// Comparison operator of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    /// Text equality ignoring case.
    EqIgnoreCase,
}

/// A single `column <op> value` condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub column: String,
    pub op: Op,
    pub value: ColumnValue,
}

impl Condition {
    /// Evaluates the condition against an actual column value.
    #[must_use]
    pub fn matches(&self, actual: &ColumnValue) -> bool {
        if self.op == Op::EqIgnoreCase {
            return match (actual, &self.value) {
                (ColumnValue::Text(a), ColumnValue::Text(b)) => a.to_lowercase() == b.to_lowercase(),
                _ => false,
            };
        }

        let Some(ordering) = actual.compare(&self.value) else {
            return false;
        };
        match self.op {
            Op::Eq => ordering == Ordering::Equal,
            Op::Ne => ordering != Ordering::Equal,
            Op::Gt => ordering == Ordering::Greater,
            Op::Ge => ordering != Ordering::Less,
            Op::Lt => ordering == Ordering::Less,
            Op::Le => ordering != Ordering::Greater,
            Op::EqIgnoreCase => false,
        }
    }
}

/// Conjunction of column conditions. An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    /// Creates an empty filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a condition.
    #[must_use]
    pub fn and(mut self, column: impl Into<String>, op: Op, value: impl Into<ColumnValue>) -> Self {
        self.conditions.push(Condition {
            column: column.into(),
            op,
            value: value.into(),
        });
        self
    }

    /// Exact equality. Text compares case-sensitively on every store.
    #[must_use]
    pub fn eq(self, column: impl Into<String>, value: impl Into<ColumnValue>) -> Self {
        self.and(column, Op::Eq, value)
    }

    #[must_use]
    pub fn ne(self, column: impl Into<String>, value: impl Into<ColumnValue>) -> Self {
        self.and(column, Op::Ne, value)
    }

    #[must_use]
    pub fn gt(self, column: impl Into<String>, value: impl Into<ColumnValue>) -> Self {
        self.and(column, Op::Gt, value)
    }

    #[must_use]
    pub fn ge(self, column: impl Into<String>, value: impl Into<ColumnValue>) -> Self {
        self.and(column, Op::Ge, value)
    }

    #[must_use]
    pub fn lt(self, column: impl Into<String>, value: impl Into<ColumnValue>) -> Self {
        self.and(column, Op::Lt, value)
    }

    #[must_use]
    pub fn le(self, column: impl Into<String>, value: impl Into<ColumnValue>) -> Self {
        self.and(column, Op::Le, value)
    }

    #[must_use]
    pub fn eq_ignore_case(self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.and(column, Op::EqIgnoreCase, ColumnValue::Text(value.into()))
    }

    /// Appends every condition of another filter.
    #[must_use]
    pub fn merge(mut self, other: Filter) -> Self {
        self.conditions.extend(other.conditions);
        self
    }

    /// Returns the conditions in insertion order.
    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Evaluates the filter with a column lookup. Unknown columns never match.
    pub fn matches<F>(&self, lookup: F) -> bool
    where
        F: Fn(&str) -> Option<ColumnValue>,
    {
        self.conditions
            .iter()
            .all(|c| lookup(&c.column).is_some_and(|actual| c.matches(&actual)))
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// One ordering term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: SortDirection,
}

/// Filter plus ordering and paging. Without ordering, results are sorted by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub filter: Filter,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Query {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every column the query refers to.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.filter
            .conditions()
            .iter()
            .map(|c| c.column.as_str())
            .chain(self.order_by.iter().map(|o| o.column.as_str()))
    }
}

impl From<Filter> for Query {
    fn from(filter: Filter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(column: &str) -> Option<ColumnValue> {
        match column {
            "id" => Some(ColumnValue::Int(5)),
            "email" => Some(ColumnValue::Text("Alice@X.com".to_string())),
            "is_active" => Some(ColumnValue::Bool(true)),
            "updated_at" => Some(ColumnValue::Timestamp(None)),
            _ => None,
        }
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(Filter::new().matches(lookup));
    }

    #[test]
    fn test_comparison_operators() {
        assert!(Filter::new().eq("id", 5).matches(lookup));
        assert!(Filter::new().ne("id", 4).matches(lookup));
        assert!(Filter::new().gt("id", 4).matches(lookup));
        assert!(Filter::new().ge("id", 5).matches(lookup));
        assert!(Filter::new().lt("id", 6).matches(lookup));
        assert!(Filter::new().le("id", 5).matches(lookup));
        assert!(!Filter::new().gt("id", 5).matches(lookup));
    }

    #[test]
    fn test_conditions_are_conjunctive() {
        assert!(Filter::new().eq("id", 5).eq("is_active", true).matches(lookup));
        assert!(!Filter::new().eq("id", 5).eq("is_active", false).matches(lookup));
    }

    #[test]
    fn test_eq_ignore_case() {
        assert!(Filter::new().eq_ignore_case("email", "alice@x.COM").matches(lookup));
        assert!(!Filter::new().eq("email", "alice@x.com").matches(lookup));
    }

    #[test]
    fn test_null_and_unknown_columns_never_match() {
        assert!(!Filter::new().eq("updated_at", None::<DateTime<Utc>>).matches(lookup));
        assert!(!Filter::new().ne("updated_at", Utc::now()).matches(lookup));
        assert!(!Filter::new().eq("missing", 1).matches(lookup));
    }

    #[test]
    fn test_mismatched_kinds_never_match() {
        assert!(!Filter::new().eq("id", "5").matches(lookup));
    }

    #[test]
    fn test_query_columns() {
        let query = Query {
            filter: Filter::new().eq("email", "a@b.c"),
            order_by: vec![OrderBy {
                column: "created_at".to_string(),
                direction: SortDirection::Desc,
            }],
            ..Query::default()
        };
        let columns: Vec<&str> = query.columns().collect();
        assert_eq!(columns, vec!["email", "created_at"]);
    }
}
