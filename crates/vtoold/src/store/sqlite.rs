//! In-process SQLite backend.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::SqliteConnection;
use tracing::{debug, instrument};
use vtool_common::{VtoolError, VtoolResult};

use super::{create_table_sql, validate_key, ConfigStore, StoreWrite, TableName};

/// Configuration store backed by an SQLite database file.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    path: PathBuf,
}

impl SqliteStore {
    /// Opens the database at `path`.
    ///
    /// With `create_if_missing` unset a missing file is reported as
    /// `StoreUnavailable` instead of silently starting an empty store.
    pub async fn open(path: &Path, create_if_missing: bool) -> VtoolResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(create_if_missing);

        // A single connection keeps writers serialized on small devices.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| VtoolError::store("open", format!("{}: {}", path.display(), e)))?;

        debug!(path = %path.display(), "Opened configuration store");

        Ok(Self {
            pool,
            path: path.to_path_buf(),
        })
    }

    /// Path of the backing database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Closes the pool, waiting for in-flight queries.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Update-then-insert so the row stays unique even without a key constraint.
async fn upsert(conn: &mut SqliteConnection, write: &StoreWrite) -> Result<(), sqlx::Error> {
    let update = format!("UPDATE {} SET value = ? WHERE name = ?", write.table.quoted());
    let updated = sqlx::query(&update)
        .bind(&write.value)
        .bind(&write.key)
        .execute(&mut *conn)
        .await?;

    if updated.rows_affected() == 0 {
        let insert = format!(
            "INSERT INTO {} (name, value) VALUES (?, ?)",
            write.table.quoted()
        );
        sqlx::query(&insert)
            .bind(&write.key)
            .bind(&write.value)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

#[async_trait]
impl ConfigStore for SqliteStore {
    #[instrument(skip(self, table), fields(table = %table))]
    async fn get(&self, table: &TableName, key: &str) -> VtoolResult<String> {
        validate_key(key)?;

        let sql = format!("SELECT value FROM {} WHERE name = ? LIMIT 1", table.quoted());
        let value: Option<Option<String>> = sqlx::query_scalar(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| VtoolError::store("get", e.to_string()))?;

        value
            .flatten()
            .ok_or_else(|| VtoolError::not_found(format!("{}:{}", table, key)))
    }

    #[instrument(skip(self, table, value), fields(table = %table))]
    async fn set(&self, table: &TableName, key: &str, value: &str) -> VtoolResult<()> {
        self.set_batch(&[StoreWrite::new(table, key, value)]).await
    }

    async fn set_batch(&self, writes: &[StoreWrite]) -> VtoolResult<()> {
        for write in writes {
            validate_key(&write.key)?;
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| VtoolError::store("set", e.to_string()))?;

        for write in writes {
            upsert(&mut *tx, write)
                .await
                .map_err(|e| VtoolError::store("set", format!("{}:{}: {}", write.table, write.key, e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| VtoolError::store("set", e.to_string()))?;

        debug!(rows = writes.len(), "Stored configuration rows");
        Ok(())
    }

    async fn ensure_table(&self, table: &TableName) -> VtoolResult<()> {
        sqlx::query(&create_table_sql(table))
            .execute(&self.pool)
            .await
            .map_err(|e| VtoolError::store("create table", format!("{}: {}", table, e)))?;
        Ok(())
    }
}
