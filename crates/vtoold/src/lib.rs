//! Device network identity and attribute management.
//!
//! vtoold keeps a device's hardware address, IPv4 address, netmask and
//! default gateway consistent between the live system and a persisted
//! SQLite configuration store, and gives access to device attributes kept
//! in the same store.
//!
//! # Sources of truth
//!
//! | Setting | Read from | Written to |
//! |---------|-----------|------------|
//! | hardware address | firmware (`fw_printenv`) | firmware (`fw_setenv`) |
//! | IPv4 address | interface (`ip addr`) | interface (`ifconfig`), then store |
//! | gateway | routing table, else store | store, then routing table |
//! | device attributes | store | store |
//!
//! # Example
//!
//! ```ignore
//! use vtoold::{config::VtoolConfig, Vtool};
//!
//! let config = VtoolConfig::load()?;
//! let vtool = Vtool::from_config(&config).await?;
//! let gw = vtool.network.get_gateway("eth0").await?;
//! ```

pub mod commands;
pub mod config;
pub mod context;
pub mod device;
pub mod netmask;
pub mod parser;
pub mod reconciler;
pub mod store;
pub mod system;
pub mod tables;
pub mod types;

pub use context::Vtool;
pub use device::DeviceAttributes;
pub use reconciler::{NetworkReconciler, StepOutcome, WriteOutcome};
pub use store::{ConfigStore, Sqlite3CliStore, SqliteStore, StoreWrite, TableName};
pub use system::{SystemAction, SystemControl};
pub use types::{InterfaceAddress, InterfaceIdentity, MacAddress, RouteTarget};
