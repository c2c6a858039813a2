//! Persistence provider selection.

use keystone_core::KeystoneError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Relational store backing the repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseProvider {
    /// MySQL / MariaDB.
    #[default]
    MySql,
    /// PostgreSQL.
    Postgres,
}

impl DatabaseProvider {
    /// Names accepted in configuration.
    pub const SUPPORTED: &'static [&'static str] = &["mysql", "postgres"];

    /// Returns the canonical configuration name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::Postgres => "postgres",
        }
    }

    /// Returns true if the connection string uses this provider's scheme.
    #[must_use]
    pub fn matches_scheme(&self, connection_string: &str) -> bool {
        match self {
            Self::MySql => connection_string.starts_with("mysql://"),
            Self::Postgres => {
                connection_string.starts_with("postgres://")
                    || connection_string.starts_with("postgresql://")
            }
        }
    }
}

impl fmt::Display for DatabaseProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatabaseProvider {
    type Err = KeystoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mysql" => Ok(Self::MySql),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => Err(KeystoneError::Configuration(format!(
                "Unsupported database provider: {}. Supported providers are: {}",
                other,
                Self::SUPPORTED.join(", ")
            ))),
        }
    }
}
