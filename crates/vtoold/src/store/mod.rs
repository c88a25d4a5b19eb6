//! Persisted configuration store.
//!
//! The store holds name/value rows in a handful of tables. Two backends are
//! provided:
//!
//! | Backend | Transport | Quoting |
//! |---------|-----------|---------|
//! | [`SqliteStore`] | in-process SQLite via `sqlx` | bound parameters |
//! | [`Sqlite3CliStore`] | the `sqlite3` binary | [`sql_quote`] on every literal |
//!
//! Table names cannot be bound as parameters, so they are validated once by
//! [`TableName::new`] and always emitted double-quoted.

mod cli;
mod sqlite;

use std::fmt;

use async_trait::async_trait;
use vtool_common::{VtoolError, VtoolResult};

pub use cli::Sqlite3CliStore;
pub use sqlite::SqliteStore;

/// A validated SQL table identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(String);

impl TableName {
    /// Accepts `[A-Za-z_][A-Za-z0-9_]*`.
    pub fn new(name: impl Into<String>) -> VtoolResult<Self> {
        let name = name.into();
        let mut chars = name.chars();
        let valid = match chars.next() {
            Some(first) => {
                (first.is_ascii_alphabetic() || first == '_')
                    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            None => false,
        };

        if valid {
            Ok(TableName(name))
        } else {
            Err(VtoolError::invalid_argument(
                "table",
                format!("'{}' is not a plain SQL identifier", name),
            ))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identifier wrapped in double quotes, ready for SQL text.
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One upsert destined for the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreWrite {
    pub table: TableName,
    pub key: String,
    pub value: String,
}

impl StoreWrite {
    pub fn new(table: &TableName, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            table: table.clone(),
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Rejects empty attribute keys.
pub fn validate_key(key: &str) -> VtoolResult<()> {
    if key.is_empty() {
        return Err(VtoolError::invalid_argument("key", "must not be empty"));
    }
    Ok(())
}

/// Renders `s` as a single-quoted SQL string literal.
///
/// Embedded single quotes are doubled. NUL cannot be represented in the
/// text handed to `sqlite3` and is rejected.
pub fn sql_quote(s: &str) -> VtoolResult<String> {
    if s.contains('\0') {
        return Err(VtoolError::invalid_argument(
            "value",
            "NUL bytes cannot be stored",
        ));
    }
    Ok(format!("'{}'", s.replace('\'', "''")))
}

/// Name/value configuration storage.
///
/// `set` is an upsert: after it returns there is exactly one row for `key`
/// holding `value`, whatever the table's constraints.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Reads the value stored under `key`.
    async fn get(&self, table: &TableName, key: &str) -> VtoolResult<String>;

    /// Inserts or replaces the value stored under `key`.
    async fn set(&self, table: &TableName, key: &str, value: &str) -> VtoolResult<()>;

    /// Applies several upserts. Backends apply them in one transaction.
    async fn set_batch(&self, writes: &[StoreWrite]) -> VtoolResult<()> {
        for write in writes {
            self.set(&write.table, &write.key, &write.value).await?;
        }
        Ok(())
    }

    /// Creates `table` if it does not exist yet.
    async fn ensure_table(&self, table: &TableName) -> VtoolResult<()>;
}

/// Schema used when a table has to be created.
pub(crate) fn create_table_sql(table: &TableName) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} (name TEXT PRIMARY KEY NOT NULL, value TEXT NOT NULL, rw INTEGER NOT NULL DEFAULT 0)",
        table.quoted()
    )
}
