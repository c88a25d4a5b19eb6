//! Prefix length / dotted-decimal netmask conversion.

use std::net::Ipv4Addr;

use vtool_common::{VtoolError, VtoolResult};

/// Largest valid IPv4 prefix length.
pub const MAX_PREFIX_LEN: u32 = 32;

/// Returns the subnet mask with the top `prefix_len` bits set.
///
/// ```
/// use std::net::Ipv4Addr;
/// use vtoold::netmask::netmask_from_prefix;
///
/// assert_eq!(netmask_from_prefix(24).unwrap(), Ipv4Addr::new(255, 255, 255, 0));
/// assert!(netmask_from_prefix(33).is_err());
/// ```
pub fn netmask_from_prefix(prefix_len: u32) -> VtoolResult<Ipv4Addr> {
    if prefix_len > MAX_PREFIX_LEN {
        return Err(VtoolError::invalid_argument(
            "prefix_len",
            format!("{} is outside 0..={}", prefix_len, MAX_PREFIX_LEN),
        ));
    }

    // Shifting a u32 by 32 overflows, so /0 is special-cased.
    let bits = match prefix_len {
        0 => 0,
        n => u32::MAX << (32 - n),
    };

    Ok(Ipv4Addr::from(bits.to_be_bytes()))
}

/// Returns the prefix length of a contiguous netmask.
pub fn prefix_from_netmask(mask: Ipv4Addr) -> VtoolResult<u32> {
    let bits = u32::from_be_bytes(mask.octets());
    let prefix_len = bits.leading_ones();

    if bits.count_ones() != prefix_len {
        return Err(VtoolError::invalid_argument(
            "netmask",
            format!("{} is not a contiguous mask", mask),
        ));
    }

    Ok(prefix_len)
}
