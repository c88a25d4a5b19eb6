//! Configuration file support for vtoold
//!
//! Loads and validates configuration from TOML files.
//! Default location: /etc/vtool/vtoold.toml

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use vtool_common::{VtoolError, VtoolResult};

use crate::store::TableName;
use crate::tables;

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/vtool/vtoold.toml";

/// Which store backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreBackend {
    /// In-process SQLite.
    #[default]
    Sqlite,
    /// The `sqlite3` command-line shell.
    Sqlite3Cli,
}

/// Table names inside the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TablesConfig {
    /// Device attributes
    #[serde(default = "default_device_table")]
    pub device: String,

    /// Addressing method
    #[serde(default = "default_network_table")]
    pub network: String,

    /// Static address, netmask and gateway
    #[serde(default = "default_network_static_table")]
    pub network_static: String,
}

/// Persisted store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Path to the SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Create the database file when it does not exist
    #[serde(default)]
    pub create_if_missing: bool,

    /// Create missing tables on startup
    #[serde(default)]
    pub initialize_schema: bool,

    #[serde(default)]
    pub tables: TablesConfig,
}

/// External program locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandsConfig {
    #[serde(default = "default_ip")]
    pub ip: String,
    #[serde(default = "default_ifconfig")]
    pub ifconfig: String,
    #[serde(default = "default_fw_printenv")]
    pub fw_printenv: String,
    #[serde(default = "default_fw_setenv")]
    pub fw_setenv: String,
    #[serde(default = "default_sqlite3")]
    pub sqlite3: String,
    #[serde(default = "default_hard_reset")]
    pub hard_reset: String,
    #[serde(default = "default_soft_reset")]
    pub soft_reset: String,
    #[serde(default = "default_reboot")]
    pub reboot: String,
}

/// Process execution configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecConfig {
    /// Seconds before an external program is killed
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Complete vtoold configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VtoolConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub commands: CommandsConfig,

    #[serde(default)]
    pub exec: ExecConfig,
}

// Default functions
fn default_device_table() -> String {
    tables::DEVICE_TABLE.to_string()
}

fn default_network_table() -> String {
    tables::NETWORK_TABLE.to_string()
}

fn default_network_static_table() -> String {
    tables::NETWORK_STATIC_TABLE.to_string()
}

fn default_database_path() -> PathBuf {
    PathBuf::from(tables::DEFAULT_DATABASE_PATH)
}

fn default_ip() -> String {
    tables::IP_CMD.to_string()
}

fn default_ifconfig() -> String {
    tables::IFCONFIG_CMD.to_string()
}

fn default_fw_printenv() -> String {
    tables::FW_PRINTENV_CMD.to_string()
}

fn default_fw_setenv() -> String {
    tables::FW_SETENV_CMD.to_string()
}

fn default_sqlite3() -> String {
    tables::SQLITE3_CMD.to_string()
}

fn default_hard_reset() -> String {
    tables::HARD_RESET_CMD.to_string()
}

fn default_soft_reset() -> String {
    tables::SOFT_RESET_CMD.to_string()
}

fn default_reboot() -> String {
    tables::REBOOT_CMD.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

// Default implementations
impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            device: default_device_table(),
            network: default_network_table(),
            network_static: default_network_static_table(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            database_path: default_database_path(),
            create_if_missing: false,
            initialize_schema: false,
            tables: TablesConfig::default(),
        }
    }
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            ip: default_ip(),
            ifconfig: default_ifconfig(),
            fw_printenv: default_fw_printenv(),
            fw_setenv: default_fw_setenv(),
            sqlite3: default_sqlite3(),
            hard_reset: default_hard_reset(),
            soft_reset: default_soft_reset(),
            reboot: default_reboot(),
        }
    }
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Validated table names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreTables {
    pub device: TableName,
    pub network: TableName,
    pub network_static: TableName,
}

impl StoreTables {
    pub fn from_config(config: &TablesConfig) -> VtoolResult<Self> {
        Ok(Self {
            device: TableName::new(config.device.as_str())?,
            network: TableName::new(config.network.as_str())?,
            network_static: TableName::new(config.network_static.as_str())?,
        })
    }

    /// All tables, for schema initialization.
    pub fn all(&self) -> [&TableName; 3] {
        [&self.device, &self.network, &self.network_static]
    }
}

impl VtoolConfig {
    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> VtoolResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| VtoolError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> VtoolResult<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content).map_err(|e| match e {
                VtoolError::Config(msg) => VtoolError::Config(format!("{}: {}", path.display(), msg)),
                other => other,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "Config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(VtoolError::Config(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Load from default location or defaults
    pub fn load() -> VtoolResult<Self> {
        Self::load_or_default(DEFAULT_CONFIG_PATH)
    }

    /// Get command timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.exec.timeout_secs)
    }

    /// Get validated table names
    pub fn tables(&self) -> VtoolResult<StoreTables> {
        StoreTables::from_config(&self.store.tables)
    }

    /// Validate configuration
    pub fn validate(&self) -> VtoolResult<()> {
        if self.exec.timeout_secs == 0 {
            return Err(VtoolError::Config(
                "exec.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.store.database_path.as_os_str().is_empty() {
            return Err(VtoolError::Config(
                "store.database_path must not be empty".to_string(),
            ));
        }

        self.tables()
            .map_err(|e| VtoolError::Config(format!("store.tables: {}", e)))?;

        Ok(())
    }
}
