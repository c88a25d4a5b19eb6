//! Command builders for interface, route and firmware operations

use std::net::Ipv4Addr;

use vtool_common::CommandLine;

use crate::config::CommandsConfig;
use crate::tables::FW_HWADDR_VAR;
use crate::types::MacAddress;

/// Build live IPv4 address query
///
/// One line per address, `-o` keeps each record on a single line
pub fn build_show_addr_cmd(cmds: &CommandsConfig, ifname: &str) -> CommandLine {
    CommandLine::new(&cmds.ip).args(["-o", "-4", "addr", "show", "dev", ifname])
}

/// Build live IPv4 address apply command
pub fn build_set_addr_cmd(
    cmds: &CommandsConfig,
    ifname: &str,
    ip: Ipv4Addr,
    netmask: Option<Ipv4Addr>,
) -> CommandLine {
    let cmd = CommandLine::new(&cmds.ifconfig)
        .arg(ifname)
        .arg(ip.to_string());
    match netmask {
        Some(mask) => cmd.arg("netmask").arg(mask.to_string()),
        None => cmd,
    }
}

/// Build routing table query
pub fn build_show_routes_cmd(cmds: &CommandsConfig) -> CommandLine {
    CommandLine::new(&cmds.ip).args(["route", "show"])
}

/// Build default route deletion command
pub fn build_del_default_route_cmd(cmds: &CommandsConfig) -> CommandLine {
    CommandLine::new(&cmds.ip).args(["route", "del", "default"])
}

/// Build default route creation command
pub fn build_add_default_route_cmd(cmds: &CommandsConfig, gateway: Ipv4Addr, ifname: &str) -> CommandLine {
    CommandLine::new(&cmds.ip)
        .args(["route", "add", "default", "via"])
        .arg(gateway.to_string())
        .args(["dev", ifname])
}

/// Build firmware hardware address query
pub fn build_fw_get_hwaddr_cmd(cmds: &CommandsConfig) -> CommandLine {
    CommandLine::new(&cmds.fw_printenv).arg(FW_HWADDR_VAR)
}

/// Build firmware hardware address update
pub fn build_fw_set_hwaddr_cmd(cmds: &CommandsConfig, hwaddr: &MacAddress) -> CommandLine {
    CommandLine::new(&cmds.fw_setenv)
        .arg(FW_HWADDR_VAR)
        .arg(hwaddr.to_string())
}
