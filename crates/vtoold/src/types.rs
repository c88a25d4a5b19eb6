//! Network identity value types.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use vtool_common::{VtoolError, VtoolResult};

use crate::netmask;

/// Longest interface name the kernel accepts (IFNAMSIZ - 1).
pub const MAX_IFNAME_LEN: usize = 15;

/// Checks that `ifname` can be handed to `ip`/`ifconfig` as a device name.
pub fn validate_ifname(ifname: &str) -> VtoolResult<()> {
    if ifname.is_empty() {
        return Err(VtoolError::invalid_argument("ifname", "must not be empty"));
    }
    if ifname.len() > MAX_IFNAME_LEN {
        return Err(VtoolError::invalid_argument(
            "ifname",
            format!("'{}' is longer than {} bytes", ifname, MAX_IFNAME_LEN),
        ));
    }
    if ifname.chars().any(|c| c.is_whitespace() || c == '/') {
        return Err(VtoolError::invalid_argument(
            "ifname",
            format!("'{}' contains whitespace or '/'", ifname),
        ));
    }
    Ok(())
}

/// A 48-bit Ethernet hardware address.
///
/// ```
/// use vtoold::MacAddress;
///
/// let mac: MacAddress = "00:11:22:AA:BB:CC".parse().unwrap();
/// assert_eq!(mac.to_string(), "00:11:22:aa:bb:cc");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// Length of the textual `xx:xx:xx:xx:xx:xx` form.
    pub const TEXT_LEN: usize = 17;

    /// Creates a hardware address from raw bytes.
    pub const fn new(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }

    /// Returns the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    /// Returns true if the multicast bit of the first octet is set.
    pub const fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl FromStr for MacAddress {
    type Err = VtoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Support both colon and hyphen separators
        let separator = if s.contains(':') { ':' } else { '-' };

        let parts: Vec<&str> = s.split(separator).collect();
        if parts.len() != 6 {
            return Err(VtoolError::parse("hardware address", s));
        }

        let mut bytes = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            if part.len() != 2 {
                return Err(VtoolError::parse("hardware address", s));
            }
            bytes[i] =
                u8::from_str_radix(part, 16).map_err(|_| VtoolError::parse("hardware address", s))?;
        }

        Ok(MacAddress(bytes))
    }
}

/// An interface name paired with its hardware address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceIdentity {
    pub ifname: String,
    pub hwaddr: MacAddress,
}

/// The IPv4 address currently assigned to an interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceAddress {
    pub ifname: String,
    pub ip: Ipv4Addr,
    /// Always within 0..=32.
    pub prefix_len: u32,
}

impl InterfaceAddress {
    /// Returns the dotted-decimal netmask for this address's prefix length.
    pub fn netmask(&self) -> Ipv4Addr {
        // prefix_len is range-checked by every constructor in this crate
        netmask::netmask_from_prefix(self.prefix_len).unwrap_or(Ipv4Addr::UNSPECIFIED)
    }
}

impl fmt::Display for InterfaceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.ip, self.prefix_len)
    }
}

/// A default route: gateway plus the interface it leaves through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTarget {
    pub gateway: Ipv4Addr,
    /// `None` when the route line did not name a device.
    pub ifname: Option<String>,
}
