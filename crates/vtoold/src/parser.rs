//! Parsers for the textual output of system utilities.
//!
//! Each parser is locked to one known output format. Anything that does not
//! match is reported as a parse error instead of being guessed at.

use std::net::Ipv4Addr;

use once_cell::sync::Lazy;
use regex::Regex;
use vtool_common::{VtoolError, VtoolResult};

use crate::netmask::MAX_PREFIX_LEN;
use crate::types::{InterfaceAddress, MacAddress, RouteTarget};

/// `2: eth0    inet 192.168.10.15/24 brd 192.168.10.255 scope global eth0`
static INET_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\d+:\s+(\S+)\s+inet\s+([^\s/]+)/(\d+)(?:\s+brd\s+\S+)?")
        .expect("Invalid regex pattern")
});

/// `default via 192.168.1.1 dev wlan0  proto static  metric 1024`
static DEFAULT_ROUTE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^default\s+via\s+(\S+)(?:.*?\sdev\s+(\S+))?").expect("Invalid regex pattern")
});

/// Parses one line of `ip -o -4 addr show dev <ifname>`.
///
/// Only the first non-empty line is considered; an interface with several
/// IPv4 addresses reports its primary one.
pub fn parse_interface_address(output: &str) -> VtoolResult<InterfaceAddress> {
    let line = output
        .lines()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| VtoolError::not_found("IPv4 address on interface"))?;

    let caps = INET_LINE_RE
        .captures(line)
        .ok_or_else(|| VtoolError::parse("interface address line", line))?;

    let ip: Ipv4Addr = caps[2]
        .parse()
        .map_err(|_| VtoolError::parse("IPv4 address", &caps[2]))?;

    let prefix_len: u32 = caps[3]
        .parse()
        .map_err(|_| VtoolError::parse("prefix length", &caps[3]))?;
    if prefix_len > MAX_PREFIX_LEN {
        return Err(VtoolError::parse("prefix length", &caps[3]));
    }

    Ok(InterfaceAddress {
        ifname: caps[1].to_string(),
        ip,
        prefix_len,
    })
}

/// Finds the first default route in `ip route show` output.
pub fn parse_default_route(output: &str) -> VtoolResult<RouteTarget> {
    let caps = output
        .lines()
        .find_map(|line| DEFAULT_ROUTE_RE.captures(line.trim_start()))
        .ok_or_else(|| VtoolError::not_found("default route"))?;

    let gateway: Ipv4Addr = caps[1]
        .parse()
        .map_err(|_| VtoolError::parse("IPv4 gateway", &caps[1]))?;

    Ok(RouteTarget {
        gateway,
        ifname: caps.get(2).map(|m| m.as_str().to_string()),
    })
}

/// Reads a hardware address from `fw_printenv <var>` output.
///
/// Accepts both `ethaddr=00:11:22:33:44:55` and the bare value.
pub fn parse_firmware_hwaddr(output: &str, var: &str) -> VtoolResult<MacAddress> {
    let output = output.trim_start();
    let value = match output.split_once('=') {
        Some((name, value)) if name == var => value,
        Some(_) => return Err(VtoolError::parse("firmware variable", output)),
        None => output,
    };

    let token = value
        .get(..MacAddress::TEXT_LEN)
        .ok_or_else(|| VtoolError::parse("17-character hardware address", value))?;

    token.parse()
}

/// Returns the first whitespace-delimited token of a store query result.
pub fn parse_store_value(output: &str) -> VtoolResult<String> {
    output
        .split_whitespace()
        .next()
        .map(str::to_string)
        .ok_or_else(|| VtoolError::not_found("store row"))
}

/// Marker prepended to hex-encoded store values so an empty value still
/// prints a non-empty row.
pub const STORE_ROW_TAG: char = 'x';

/// Decodes a `'x' || hex(value)` row printed by the `sqlite3` shell.
///
/// Returns the exact stored text, whitespace included. No output means no
/// row.
pub fn parse_store_row(output: &str) -> VtoolResult<String> {
    let line = match output.lines().next().map(str::trim) {
        Some(line) if !line.is_empty() => line,
        _ => return Err(VtoolError::not_found("store row")),
    };

    let hex = line
        .strip_prefix(STORE_ROW_TAG)
        .ok_or_else(|| VtoolError::parse("hex-encoded store row", line))?;
    if hex.len() % 2 != 0 || !hex.is_ascii() {
        return Err(VtoolError::parse("hex-encoded store row", line));
    }

    let bytes = (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16))
        .collect::<Result<Vec<u8>, _>>()
        .map_err(|_| VtoolError::parse("hex-encoded store row", line))?;

    String::from_utf8(bytes).map_err(|_| VtoolError::parse("UTF-8 store value", line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vtool_common::ErrorKind;

    #[test]
    fn test_parse_interface_address() {
        let line = "2: eth0    inet 192.168.10.15/24 brd 192.168.10.255 scope global eth0";
        let addr = parse_interface_address(line).unwrap();
        assert_eq!(
            addr,
            InterfaceAddress {
                ifname: "eth0".to_string(),
                ip: Ipv4Addr::new(192, 168, 10, 15),
                prefix_len: 24,
            }
        );
    }

    #[test]
    fn test_parse_interface_address_with_continuation() {
        let out = "3: wlan0    inet 10.0.0.7/16 brd 10.0.255.255 scope global dynamic wlan0\\       valid_lft 85787sec preferred_lft 85787sec\n\
                   3: wlan0    inet 10.1.0.7/16 brd 10.1.255.255 scope global secondary wlan0\n";
        let addr = parse_interface_address(out).unwrap();
        assert_eq!(addr.ip, Ipv4Addr::new(10, 0, 0, 7));
        assert_eq!(addr.prefix_len, 16);
    }

    #[test]
    fn test_parse_interface_address_without_broadcast() {
        let addr = parse_interface_address("1: lo    inet 127.0.0.1/8 scope host lo").unwrap();
        assert_eq!(addr.ip, Ipv4Addr::LOCALHOST);
        assert_eq!(addr.prefix_len, 8);
    }

    #[test]
    fn test_parse_interface_address_no_inet() {
        let err = parse_interface_address("2: eth0    inet6 fe80::1/64 scope link").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError);
    }

    #[test]
    fn test_parse_interface_address_empty_output() {
        let err = parse_interface_address("\n  \n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_parse_interface_address_bad_values() {
        let bad_ip = "2: eth0    inet 192.168.10.999/24 brd 192.168.10.255 scope global eth0";
        assert_eq!(
            parse_interface_address(bad_ip).unwrap_err().kind(),
            ErrorKind::ParseError
        );

        let bad_prefix = "2: eth0    inet 192.168.10.15/33 brd 192.168.10.255 scope global eth0";
        assert_eq!(
            parse_interface_address(bad_prefix).unwrap_err().kind(),
            ErrorKind::ParseError
        );
    }

    #[test]
    fn test_parse_default_route() {
        let out = "default via 192.168.1.1 dev wlan0  proto static  metric 1024\n\
                   192.168.1.0/24 dev wlan0  proto kernel  scope link  src 192.168.1.20\n";
        let route = parse_default_route(out).unwrap();
        assert_eq!(route.gateway, Ipv4Addr::new(192, 168, 1, 1));
        assert_eq!(route.ifname.as_deref(), Some("wlan0"));
    }

    #[test]
    fn test_parse_default_route_first_match_wins() {
        let out = "10.0.0.0/8 dev eth1 scope link\n\
                   default via 10.0.0.1 dev eth1 metric 100\n\
                   default via 192.168.1.1 dev eth0 metric 200\n";
        let route = parse_default_route(out).unwrap();
        assert_eq!(route.gateway, Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(route.ifname.as_deref(), Some("eth1"));
    }

    #[test]
    fn test_parse_default_route_without_dev() {
        let route = parse_default_route("default via 172.16.0.1").unwrap();
        assert_eq!(route.gateway, Ipv4Addr::new(172, 16, 0, 1));
        assert_eq!(route.ifname, None);
    }

    #[test]
    fn test_parse_default_route_missing() {
        let out = "192.168.1.0/24 dev wlan0  proto kernel  scope link  src 192.168.1.20\n";
        assert_eq!(parse_default_route(out).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(parse_default_route("").unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_parse_firmware_hwaddr() {
        let mac = parse_firmware_hwaddr("ethaddr=00:1a:2b:3c:4d:5e\n", "ethaddr").unwrap();
        assert_eq!(mac.to_string(), "00:1a:2b:3c:4d:5e");

        let bare = parse_firmware_hwaddr("00:1A:2B:3C:4D:5E", "ethaddr").unwrap();
        assert_eq!(bare, mac);
    }

    #[test]
    fn test_parse_firmware_hwaddr_short() {
        let err = parse_firmware_hwaddr("ethaddr=00:1a:2b:3c", "ethaddr").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError);
        let err = parse_firmware_hwaddr("", "ethaddr").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError);
    }

    #[test]
    fn test_parse_firmware_hwaddr_other_variable() {
        let err = parse_firmware_hwaddr("eth1addr=00:1a:2b:3c:4d:5e", "ethaddr").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError);
    }

    #[test]
    fn test_parse_store_value() {
        assert_eq!(parse_store_value("static\n").unwrap(), "static");
        assert_eq!(parse_store_value("  v1.2 trailing").unwrap(), "v1.2");
        assert_eq!(parse_store_value("").unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_parse_store_row_keeps_whitespace() {
        assert_eq!(parse_store_row("x56542D313030207265762042").unwrap(), "VT-100 rev B");
        assert_eq!(parse_store_row("x2020").unwrap(), "  ");
        assert_eq!(parse_store_row("x610A62\n").unwrap(), "a\nb");
    }

    #[test]
    fn test_parse_store_row_empty_value() {
        assert_eq!(parse_store_row("x").unwrap(), "");
        assert_eq!(parse_store_row("x\n").unwrap(), "");
    }

    #[test]
    fn test_parse_store_row_no_row() {
        assert_eq!(parse_store_row("").unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(parse_store_row("\n").unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_parse_store_row_rejects_untagged() {
        assert_eq!(parse_store_row("VT100").unwrap_err().kind(), ErrorKind::ParseError);
        assert_eq!(parse_store_row("xFFFE").unwrap_err().kind(), ErrorKind::ParseError);
        assert_eq!(parse_store_row("xZZ").unwrap_err().kind(), ErrorKind::ParseError);
    }
}
