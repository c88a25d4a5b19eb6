//! Table, field and command constants

// Persisted store tables
pub const DEVICE_TABLE: &str = "base_info";
pub const NETWORK_TABLE: &str = "network";
pub const NETWORK_STATIC_TABLE: &str = "network_static";

// network table field names
pub mod network_fields {
    pub const METHOD: &str = "method";
}

// network_static table field names
pub mod static_fields {
    pub const IPADDR: &str = "ipaddr";
    pub const NETMASK: &str = "netmask";
    pub const GATEWAY: &str = "gateway";
}

// Addressing methods
pub const METHOD_STATIC: &str = "static";

// Firmware environment
pub const FW_HWADDR_VAR: &str = "ethaddr";

// Default store location
pub const DEFAULT_DATABASE_PATH: &str = "/data/configuration.sqlite3";

// Default command paths
pub const IP_CMD: &str = "/sbin/ip";
pub const IFCONFIG_CMD: &str = "/sbin/ifconfig";
pub const FW_PRINTENV_CMD: &str = "/usr/sbin/fw_printenv";
pub const FW_SETENV_CMD: &str = "/usr/sbin/fw_setenv";
pub const SQLITE3_CMD: &str = "/usr/bin/sqlite3";
pub const HARD_RESET_CMD: &str = "/apps/iconfig/hard-reset.sh";
pub const SOFT_RESET_CMD: &str = "/apps/iconfig/soft-reset.sh";
pub const REBOOT_CMD: &str = "/sbin/reboot";

// `ip route del default` stderr when there is no default route
pub const NO_SUCH_ROUTE: &str = "No such process";
