//! Device attribute access.

use std::sync::Arc;

use tracing::{debug, instrument};
use vtool_common::VtoolResult;

use crate::store::{validate_key, ConfigStore, TableName};

/// Reads and writes device attributes (serial number, model, ...).
pub struct DeviceAttributes {
    store: Arc<dyn ConfigStore>,
    table: TableName,
}

impl DeviceAttributes {
    pub fn new(store: Arc<dyn ConfigStore>, table: TableName) -> Self {
        Self { store, table }
    }

    #[instrument(skip(self))]
    pub async fn get_attribute(&self, key: &str) -> VtoolResult<String> {
        validate_key(key)?;
        self.store.get(&self.table, key).await
    }

    #[instrument(skip(self, value))]
    pub async fn set_attribute(&self, key: &str, value: &str) -> VtoolResult<()> {
        validate_key(key)?;
        self.store.set(&self.table, key, value).await?;
        debug!("Device attribute updated");
        Ok(())
    }
}
