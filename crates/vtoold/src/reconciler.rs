//! Network state reconciliation between the live system and the store.
//!
//! | Setting | Read | Write |
//! |---------|------|-------|
//! | hardware address | firmware only | firmware only |
//! | IPv4 address / netmask | live only | live, then store |
//! | default gateway | live, falling back to store | store, then live |
//!
//! Hardware address and IPv4 address reads have no persisted fallback; live
//! state is authoritative for them. Writes never span a transaction: each
//! step is attempted and reported on its own in a [`WriteOutcome`], and a
//! step that succeeded is never rolled back.

use std::fmt;
use std::net::Ipv4Addr;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use vtool_common::exec::run_checked;
use vtool_common::{CommandRunner, VtoolError, VtoolResult};

use crate::commands;
use crate::config::{CommandsConfig, StoreTables};
use crate::netmask::prefix_from_netmask;
use crate::parser::{parse_default_route, parse_firmware_hwaddr, parse_interface_address};
use crate::store::{ConfigStore, StoreWrite};
use crate::tables::{network_fields, static_fields, FW_HWADDR_VAR, METHOD_STATIC, NO_SUCH_ROUTE};
use crate::types::{validate_ifname, InterfaceAddress, InterfaceIdentity, MacAddress};

/// Result of one step of a write.
#[derive(Debug)]
pub enum StepOutcome {
    /// The step ran and succeeded.
    Applied,
    /// The step ran and failed.
    Failed(VtoolError),
    /// The step was not attempted.
    Skipped,
}

impl StepOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, StepOutcome::Applied)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StepOutcome::Failed(_))
    }

    pub fn error(&self) -> Option<&VtoolError> {
        match self {
            StepOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}

impl From<VtoolResult<()>> for StepOutcome {
    fn from(result: VtoolResult<()>) -> Self {
        match result {
            Ok(()) => StepOutcome::Applied,
            Err(e) => StepOutcome::Failed(e),
        }
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepOutcome::Applied => f.write_str("applied"),
            StepOutcome::Failed(e) => write!(f, "failed: {}", e),
            StepOutcome::Skipped => f.write_str("skipped"),
        }
    }
}

/// Outcome of a write touching live state and/or the persisted store.
#[derive(Debug)]
pub struct WriteOutcome {
    pub live: StepOutcome,
    pub persisted: StepOutcome,
}

impl WriteOutcome {
    /// True when no attempted step failed.
    pub fn is_complete(&self) -> bool {
        !self.live.is_failed() && !self.persisted.is_failed()
    }

    /// Collapses the outcome into a plain result; a live failure is reported
    /// in preference to a persisted one.
    pub fn into_result(self) -> VtoolResult<()> {
        match (self.live, self.persisted) {
            (StepOutcome::Failed(e), _) | (_, StepOutcome::Failed(e)) => Err(e),
            _ => Ok(()),
        }
    }
}

/// Reads and writes network settings against live state and the store.
pub struct NetworkReconciler {
    runner: Arc<dyn CommandRunner>,
    store: Arc<dyn ConfigStore>,
    commands: CommandsConfig,
    tables: StoreTables,
}

impl NetworkReconciler {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        store: Arc<dyn ConfigStore>,
        commands: CommandsConfig,
        tables: StoreTables,
    ) -> Self {
        Self {
            runner,
            store,
            commands,
            tables,
        }
    }

    /// Reads the hardware address from the firmware environment.
    ///
    /// The firmware holds a single `ethaddr`; `ifname` only labels the result.
    #[instrument(skip(self))]
    pub async fn get_hardware_address(&self, ifname: &str) -> VtoolResult<InterfaceIdentity> {
        validate_ifname(ifname)?;

        let cmd = commands::build_fw_get_hwaddr_cmd(&self.commands);
        let output = run_checked(self.runner.as_ref(), &cmd).await?;
        let hwaddr = parse_firmware_hwaddr(&output, FW_HWADDR_VAR)?;

        debug!(%hwaddr, "Read hardware address from firmware");
        Ok(InterfaceIdentity {
            ifname: ifname.to_string(),
            hwaddr,
        })
    }

    /// Reads the live IPv4 address of `ifname`.
    #[instrument(skip(self))]
    pub async fn get_address(&self, ifname: &str) -> VtoolResult<InterfaceAddress> {
        validate_ifname(ifname)?;

        let cmd = commands::build_show_addr_cmd(&self.commands, ifname);
        let output = run_checked(self.runner.as_ref(), &cmd).await?;

        parse_interface_address(&output).map_err(|e| {
            if e.is_not_found() {
                VtoolError::not_found(format!("IPv4 address on {}", ifname))
            } else {
                e
            }
        })
    }

    /// Reads the default gateway, preferring the live routing table.
    ///
    /// The first default route wins regardless of its device. The persisted
    /// `gateway` is consulted only when the routing table has no default
    /// route; a failing route query is returned as is.
    #[instrument(skip(self))]
    pub async fn get_gateway(&self, ifname: &str) -> VtoolResult<Ipv4Addr> {
        validate_ifname(ifname)?;

        let cmd = commands::build_show_routes_cmd(&self.commands);
        let output = run_checked(self.runner.as_ref(), &cmd).await?;

        match parse_default_route(&output) {
            Ok(route) => {
                debug!(gateway = %route.gateway, dev = ?route.ifname, "Found live default route");
                return Ok(route.gateway);
            }
            Err(e) if e.is_not_found() => {
                debug!("No live default route, reading persisted gateway");
            }
            Err(e) => return Err(e),
        }

        let value = self
            .store
            .get(&self.tables.network_static, static_fields::GATEWAY)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    VtoolError::not_found("default route or persisted gateway")
                } else {
                    e
                }
            })?;

        value
            .trim()
            .parse()
            .map_err(|_| VtoolError::parse("persisted IPv4 gateway", &value))
    }

    /// Writes the hardware address into the firmware environment.
    ///
    /// Neither the running interface nor the store is touched; the new
    /// address takes effect on the next boot.
    #[instrument(skip(self))]
    pub async fn set_hardware_address(
        &self,
        ifname: &str,
        hwaddr: &MacAddress,
    ) -> VtoolResult<WriteOutcome> {
        validate_ifname(ifname)?;

        let cmd = commands::build_fw_set_hwaddr_cmd(&self.commands, hwaddr);
        let live = StepOutcome::from(run_checked(self.runner.as_ref(), &cmd).await.map(|_| ()));

        match &live {
            StepOutcome::Applied => info!(%hwaddr, "Stored hardware address in firmware"),
            other => warn!(%hwaddr, outcome = %other, "Failed to store hardware address"),
        }

        Ok(WriteOutcome {
            live,
            persisted: StepOutcome::Skipped,
        })
    }

    /// Applies an IPv4 address to `ifname`, then records it as static config.
    ///
    /// The store is updated even when the live change failed.
    #[instrument(skip(self))]
    pub async fn set_address(
        &self,
        ifname: &str,
        ip: Ipv4Addr,
        netmask: Option<Ipv4Addr>,
    ) -> VtoolResult<WriteOutcome> {
        validate_ifname(ifname)?;
        if let Some(mask) = netmask {
            prefix_from_netmask(mask)?;
        }

        let cmd = commands::build_set_addr_cmd(&self.commands, ifname, ip, netmask);
        let live = StepOutcome::from(run_checked(self.runner.as_ref(), &cmd).await.map(|_| ()));
        if let StepOutcome::Failed(e) = &live {
            warn!(error = %e, "Live address change failed, persisting anyway");
        }

        let mut writes = vec![
            StoreWrite::new(&self.tables.network, network_fields::METHOD, METHOD_STATIC),
            StoreWrite::new(&self.tables.network_static, static_fields::IPADDR, ip.to_string()),
        ];
        if let Some(mask) = netmask {
            writes.push(StoreWrite::new(
                &self.tables.network_static,
                static_fields::NETMASK,
                mask.to_string(),
            ));
        }
        let persisted = StepOutcome::from(self.store.set_batch(&writes).await);

        info!(live = %live, persisted = %persisted, "Address update finished");
        Ok(WriteOutcome { live, persisted })
    }

    /// Records a new gateway, then replaces the live default route.
    ///
    /// The store is written first; if that fails the routing table is left
    /// alone. A failing route change does not undo the stored value.
    #[instrument(skip(self))]
    pub async fn set_gateway(&self, ifname: &str, gateway: Ipv4Addr) -> VtoolResult<WriteOutcome> {
        validate_ifname(ifname)?;

        let persisted = StepOutcome::from(
            self.store
                .set(
                    &self.tables.network_static,
                    static_fields::GATEWAY,
                    &gateway.to_string(),
                )
                .await,
        );

        let live = if persisted.is_failed() {
            warn!(outcome = %persisted, "Gateway not persisted, leaving routes untouched");
            StepOutcome::Skipped
        } else {
            StepOutcome::from(self.replace_default_route(ifname, gateway).await)
        };

        info!(live = %live, persisted = %persisted, "Gateway update finished");
        Ok(WriteOutcome { live, persisted })
    }

    async fn replace_default_route(&self, ifname: &str, gateway: Ipv4Addr) -> VtoolResult<()> {
        let del = commands::build_del_default_route_cmd(&self.commands);
        let result = self.runner.run(&del).await?;
        if !result.success() {
            if result.stderr.contains(NO_SUCH_ROUTE) {
                debug!("No default route to delete");
            } else {
                result.check(&del)?;
            }
        }

        let add = commands::build_add_default_route_cmd(&self.commands, gateway, ifname);
        run_checked(self.runner.as_ref(), &add).await?;
        Ok(())
    }
}
