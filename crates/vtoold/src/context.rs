//! Wiring of runner, store and accessors from configuration.

use std::sync::Arc;

use tracing::info;
use vtool_common::{CommandRunner, SystemRunner, VtoolResult};

use crate::config::{StoreBackend, VtoolConfig};
use crate::device::DeviceAttributes;
use crate::reconciler::NetworkReconciler;
use crate::store::{ConfigStore, Sqlite3CliStore, SqliteStore};
use crate::system::SystemControl;

/// All operations, sharing one command runner and one store.
pub struct Vtool {
    pub network: NetworkReconciler,
    pub device: DeviceAttributes,
    pub system: SystemControl,
}

impl Vtool {
    /// Builds every component from `config` using the host's programs.
    pub async fn from_config(config: &VtoolConfig) -> VtoolResult<Self> {
        let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner::new(config.timeout()));
        Self::with_runner(config, runner).await
    }

    /// Builds every component around an existing runner.
    pub async fn with_runner(
        config: &VtoolConfig,
        runner: Arc<dyn CommandRunner>,
    ) -> VtoolResult<Self> {
        config.validate()?;
        let tables = config.tables()?;
        let db_path = &config.store.database_path;

        let store: Arc<dyn ConfigStore> = match config.store.backend {
            StoreBackend::Sqlite => {
                Arc::new(SqliteStore::open(db_path, config.store.create_if_missing).await?)
            }
            StoreBackend::Sqlite3Cli => Arc::new(Sqlite3CliStore::new(
                runner.clone(),
                config.commands.sqlite3.as_str(),
                db_path.clone(),
            )),
        };

        if config.store.initialize_schema {
            for table in tables.all() {
                store.ensure_table(table).await?;
            }
            info!(path = %db_path.display(), "Store schema initialized");
        }

        Ok(Self {
            network: NetworkReconciler::new(
                runner.clone(),
                store.clone(),
                config.commands.clone(),
                tables.clone(),
            ),
            device: DeviceAttributes::new(store, tables.device),
            system: SystemControl::new(runner, config.commands.clone()),
        })
    }
}
