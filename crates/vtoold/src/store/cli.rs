//! Backend that drives the `sqlite3` command-line shell.
//!
//! Used on images that ship the `sqlite3` binary but where the database is
//! shared with other tools expecting to own the file. SQL text is passed as a
//! single argument (no shell involved) and every literal goes through
//! [`sql_quote`].

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};
use vtool_common::{CommandLine, CommandRunner, VtoolError, VtoolResult};

use super::{create_table_sql, sql_quote, validate_key, ConfigStore, StoreWrite, TableName};
use crate::parser::{parse_store_row, STORE_ROW_TAG};

/// Configuration store reached through the `sqlite3` binary.
pub struct Sqlite3CliStore {
    runner: Arc<dyn CommandRunner>,
    sqlite3: String,
    db_path: PathBuf,
}

impl Sqlite3CliStore {
    pub fn new(runner: Arc<dyn CommandRunner>, sqlite3: impl Into<String>, db_path: PathBuf) -> Self {
        Self {
            runner,
            sqlite3: sqlite3.into(),
            db_path,
        }
    }

    /// Runs one SQL script, stopping at the first failing statement.
    async fn run_sql(&self, operation: &str, sql: &str) -> VtoolResult<String> {
        let cmd = CommandLine::new(&self.sqlite3)
            .arg("-bail")
            .arg(self.db_path.display().to_string())
            .arg(sql);

        let result = self
            .runner
            .run(&cmd)
            .await
            .map_err(|e| VtoolError::store(operation, e.to_string()))?;

        // Older sqlite3 builds report some errors with exit status 0.
        if !result.success() || result.stderr.starts_with("Error") {
            return Err(VtoolError::store(operation, result.combined_output()));
        }

        Ok(result.stdout)
    }
}

/// Update-then-insert; `changes()` is 0 when the UPDATE matched nothing.
fn upsert_sql(write: &StoreWrite) -> VtoolResult<String> {
    let key = sql_quote(&write.key)?;
    let value = sql_quote(&write.value)?;
    let table = write.table.quoted();
    Ok(format!(
        "UPDATE {table} SET value = {value} WHERE name = {key}; \
         INSERT INTO {table} (name, value) SELECT {key}, {value} WHERE changes() = 0;"
    ))
}

#[async_trait]
impl ConfigStore for Sqlite3CliStore {
    /// Values are read back hex-encoded behind a tag so that whitespace and
    /// empty strings survive the shell's line-oriented output.
    #[instrument(skip(self, table), fields(table = %table))]
    async fn get(&self, table: &TableName, key: &str) -> VtoolResult<String> {
        validate_key(key)?;
        let sql = format!(
            "SELECT '{}' || hex(value) FROM {} WHERE name = {} AND value IS NOT NULL LIMIT 1;",
            STORE_ROW_TAG,
            table.quoted(),
            sql_quote(key)?
        );

        let output = self.run_sql("get", &sql).await?;
        parse_store_row(&output).map_err(|e| match e {
            VtoolError::NotFound { .. } => VtoolError::not_found(format!("{}:{}", table, key)),
            other => other,
        })
    }

    #[instrument(skip(self, table, value), fields(table = %table))]
    async fn set(&self, table: &TableName, key: &str, value: &str) -> VtoolResult<()> {
        validate_key(key)?;
        let sql = upsert_sql(&StoreWrite::new(table, key, value))?;
        self.run_sql("set", &sql).await?;
        Ok(())
    }

    async fn set_batch(&self, writes: &[StoreWrite]) -> VtoolResult<()> {
        let mut script = String::from("BEGIN; ");
        for write in writes {
            validate_key(&write.key)?;
            script.push_str(&upsert_sql(write)?);
            script.push(' ');
        }
        script.push_str("COMMIT;");

        self.run_sql("set", &script).await?;
        debug!(rows = writes.len(), "Stored configuration rows");
        Ok(())
    }

    async fn ensure_table(&self, table: &TableName) -> VtoolResult<()> {
        self.run_sql("create table", &format!("{};", create_table_sql(table)))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use vtool_common::testing::{fail, ok, ScriptedRunner};
    use vtool_common::ErrorKind;

    fn cli_store(runner: Arc<ScriptedRunner>) -> Sqlite3CliStore {
        Sqlite3CliStore::new(runner, "sqlite3", PathBuf::from("/data/configuration.sqlite3"))
    }

    fn table() -> TableName {
        TableName::new("base_info").unwrap()
    }

    #[tokio::test]
    async fn test_get_decodes_full_value() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.on("hex(value)", ok("x56542D313030207265762042\n"));
        let store = cli_store(runner.clone());

        assert_eq!(store.get(&table(), "model").await.unwrap(), "VT-100 rev B");

        let call = &runner.invocations()[0];
        assert_eq!(call.program, "sqlite3");
        assert_eq!(call.args[0], "-bail");
        assert_eq!(call.args[1], "/data/configuration.sqlite3");
        assert_eq!(
            call.args[2],
            "SELECT 'x' || hex(value) FROM \"base_info\" WHERE name = 'model' AND value IS NOT NULL LIMIT 1;"
        );
    }

    #[tokio::test]
    async fn test_get_empty_value_is_found() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.on("hex(value)", ok("x"));
        let store = cli_store(runner);
        assert_eq!(store.get(&table(), "comment").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_get_no_output_is_not_found() {
        let runner = Arc::new(ScriptedRunner::new());
        let store = cli_store(runner);
        let err = store.get(&table(), "serial").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("base_info:serial"));
    }

    #[tokio::test]
    async fn test_set_escapes_hostile_value() {
        let runner = Arc::new(ScriptedRunner::new());
        let store = cli_store(runner.clone());

        store
            .set(&table(), "label", "x'); DROP TABLE base_info; --")
            .await
            .unwrap();

        let sql = &runner.invocations()[0].args[2];
        assert!(sql.contains("SET value = 'x''); DROP TABLE base_info; --' WHERE name = 'label'"));
        assert!(sql.contains("WHERE changes() = 0;"));
    }

    #[tokio::test]
    async fn test_set_batch_is_one_transaction() {
        let runner = Arc::new(ScriptedRunner::new());
        let store = cli_store(runner.clone());
        let network = TableName::new("network").unwrap();

        store
            .set_batch(&[
                StoreWrite::new(&network, "method", "static"),
                StoreWrite::new(&table(), "hostname", "vt-lab-3"),
            ])
            .await
            .unwrap();

        let calls = runner.invocations();
        assert_eq!(calls.len(), 1);
        let sql = &calls[0].args[2];
        assert!(sql.starts_with("BEGIN; "));
        assert!(sql.ends_with("COMMIT;"));
        assert!(sql.contains("UPDATE \"network\" SET value = 'static' WHERE name = 'method'"));
    }

    #[tokio::test]
    async fn test_failures_map_to_store_unavailable() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.on("sqlite3", fail(1, "Error: unable to open database file"));
        let store = cli_store(runner);
        let err = store.set(&table(), "k", "v").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StoreUnavailable);

        let runner = Arc::new(ScriptedRunner::new());
        runner.on_spawn_error("sqlite3");
        let store = cli_store(runner);
        let err = store.get(&table(), "k").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
    }

    #[tokio::test]
    async fn test_nul_value_rejected_before_running() {
        let runner = Arc::new(ScriptedRunner::new());
        let store = cli_store(runner.clone());
        let err = store.set(&table(), "k", "a\0b").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(runner.calls().is_empty());
    }

    /// Locates `sqlite3` on `PATH`.
    fn find_sqlite3() -> Option<PathBuf> {
        let path = std::env::var_os("PATH")?;
        std::env::split_paths(&path)
            .map(|dir| dir.join("sqlite3"))
            .find(|candidate| candidate.is_file())
    }

    async fn real_store(dir: &Path) -> Option<Sqlite3CliStore> {
        let Some(binary) = find_sqlite3() else {
            eprintln!("skipping: sqlite3 not found on PATH");
            return None;
        };

        let runner = Arc::new(vtool_common::SystemRunner::default());
        let store = Sqlite3CliStore::new(
            runner,
            binary.display().to_string(),
            dir.join("cfg.sqlite3"),
        );
        store.ensure_table(&table()).await.unwrap();
        Some(store)
    }

    #[tokio::test]
    async fn test_against_real_sqlite3_binary() {
        let dir = tempfile::tempdir().unwrap();
        let Some(store) = real_store(dir.path()).await else {
            return;
        };
        let table = table();

        store.set(&table, "quote", "it's").await.unwrap();
        store.set(&table, "quote", "still'here").await.unwrap();
        assert_eq!(store.get(&table, "quote").await.unwrap(), "still'here");

        let err = store.get(&table, "missing").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_real_sqlite3_returns_values_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let Some(store) = real_store(dir.path()).await else {
            return;
        };
        let table = table();

        for value in ["VT-100 rev B", "", "  padded  ", "two\nlines", "caf\u{e9}"] {
            store.set(&table, "model", value).await.unwrap();
            assert_eq!(store.get(&table, "model").await.unwrap(), value);
        }
    }

    #[tokio::test]
    async fn test_device_attributes_over_real_sqlite3() {
        let dir = tempfile::tempdir().unwrap();
        let Some(store) = real_store(dir.path()).await else {
            return;
        };
        let device = crate::device::DeviceAttributes::new(Arc::new(store), table());

        device.set_attribute("model", "VT-100 rev B").await.unwrap();
        assert_eq!(device.get_attribute("model").await.unwrap(), "VT-100 rev B");

        device.set_attribute("empty", "").await.unwrap();
        assert_eq!(device.get_attribute("empty").await.unwrap(), "");
    }
}
