//! Family-uniform CIDR arithmetic.
//!
//! All address math is done on `u128` integers so IPv4 (low 32 bits) and
//! IPv6 share one code path. Sizes are exact up to /128; the single
//! degenerate case, an IPv6 `/0`, saturates to `u128::MAX`.

use ipnet::IpNet;
use std::error::Error;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Address family of a pool, segment request, or prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Family {
    V4,
    V6,
}

impl Family {
    /// Width of the address space in bits.
    pub const fn bits(self) -> u8 {
        match self {
            Family::V4 => 32,
            Family::V6 => 128,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Family::V4 => "ipv4",
            Family::V6 => "ipv6",
        }
    }

    /// Family of a parsed prefix.
    pub fn of(net: &IpNet) -> Family {
        match net {
            IpNet::V4(_) => Family::V4,
            IpNet::V6(_) => Family::V6,
        }
    }

    /// Normalize a free-form family string; anything but "ipv6" means IPv4.
    pub fn normalize(raw: &str) -> Family {
        if raw.trim().eq_ignore_ascii_case("ipv6") {
            Family::V6
        } else {
            Family::V4
        }
    }
}

impl std::fmt::Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a CIDR string (e.g., "10.0.0.0/24" or "fd00::/48").
///
/// The prefix is returned as written; callers mask with [`IpNet::trunc`]
/// where the network form is needed.
pub fn parse_cidr(raw: &str) -> Result<IpNet, Box<dyn Error>> {
    let raw = raw.trim();
    raw.parse::<IpNet>()
        .map_err(|e| format!("invalid CIDR {raw}: {e}").into())
}

/// Number of addresses covered by a prefix.
///
/// Exact for every real prefix; an IPv6 /0 saturates to `u128::MAX`.
pub fn prefix_size(net: &IpNet) -> u128 {
    let host_bits = net.max_prefix_len() - net.prefix_len();
    if host_bits >= 128 {
        u128::MAX
    } else {
        1u128 << host_bits
    }
}

/// First address of the masked prefix, as an integer.
pub fn first_addr(net: &IpNet) -> u128 {
    addr_to_u128(net.network())
}

/// Last address of the masked prefix, as an integer.
pub fn last_addr(net: &IpNet) -> u128 {
    addr_to_u128(net.broadcast())
}

pub fn addr_to_u128(addr: IpAddr) -> u128 {
    match addr {
        IpAddr::V4(v4) => u128::from(u32::from(v4)),
        IpAddr::V6(v6) => u128::from(v6),
    }
}

/// Convert an integer back to an address of the given family.
pub fn u128_to_addr(value: u128, family: Family) -> Option<IpAddr> {
    match family {
        Family::V4 => {
            let v = u32::try_from(value).ok()?;
            Some(IpAddr::V4(Ipv4Addr::from(v)))
        }
        Family::V6 => Some(IpAddr::V6(Ipv6Addr::from(value))),
    }
}

/// Build the masked prefix starting at `start` with the given length.
pub fn net_from_start(start: u128, len: u8, family: Family) -> Option<IpNet> {
    if len > family.bits() {
        return None;
    }
    let addr = u128_to_addr(start, family)?;
    IpNet::new(addr, len).ok().map(|n| n.trunc())
}

/// True if `inner` lies entirely inside `outer`. Families must match.
pub fn within(outer: &IpNet, inner: &IpNet) -> bool {
    if Family::of(outer) != Family::of(inner) {
        return false;
    }
    outer.contains(&inner.network()) && outer.contains(&inner.broadcast())
}

/// True if two prefixes of the same family share any address.
pub fn overlaps(a: &IpNet, b: &IpNet) -> bool {
    if Family::of(a) != Family::of(b) {
        return false;
    }
    a.contains(&b.network()) || b.contains(&a.network())
}

/// Smallest multiple of `step` that is >= `n`; `None` on overflow.
pub fn align_up(n: u128, step: u128) -> Option<u128> {
    if step == 0 {
        return Some(n);
    }
    let mut q = n / step;
    if n % step != 0 {
        q += 1;
    }
    q.checked_mul(step)
}

/// Prefix length needed for an IPv4 segment of `hosts` hosts.
///
/// The block must hold hosts + 3 addresses (network, gateway, broadcast);
/// the numerically largest length that still fits wins.
pub fn hosts_to_prefix_v4(hosts: i64) -> u8 {
    let need = hosts.saturating_add(3).max(1) as u128;
    for len in (1..=32u8).rev() {
        if 1u128 << (32 - len) >= need {
            return len;
        }
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cidr() {
        let net = parse_cidr(" 10.0.0.0/24 ").unwrap();
        assert_eq!(net.to_string(), "10.0.0.0/24");
        assert_eq!(Family::of(&net), Family::V4);

        let net6 = parse_cidr("fd00:1234::/48").unwrap();
        assert_eq!(Family::of(&net6), Family::V6);

        assert!(parse_cidr("10.0.0.0").is_err());
        assert!(parse_cidr("10.0.0.0/33").is_err());
        assert!(parse_cidr("not-a-cidr/8").is_err());
    }

    #[test]
    fn test_prefix_size() {
        assert_eq!(prefix_size(&parse_cidr("10.0.0.0/24").unwrap()), 256);
        assert_eq!(prefix_size(&parse_cidr("10.0.0.0/32").unwrap()), 1);
        assert_eq!(prefix_size(&parse_cidr("0.0.0.0/0").unwrap()), 1 << 32);
        assert_eq!(
            prefix_size(&parse_cidr("fd00::/64").unwrap()),
            1u128 << 64
        );
        assert_eq!(prefix_size(&parse_cidr("fd00::1/128").unwrap()), 1);
        assert_eq!(prefix_size(&parse_cidr("::/0").unwrap()), u128::MAX);
    }

    #[test]
    fn test_first_last_addr() {
        let net = parse_cidr("10.0.0.64/26").unwrap();
        assert_eq!(
            u128_to_addr(first_addr(&net), Family::V4).unwrap().to_string(),
            "10.0.0.64"
        );
        assert_eq!(
            u128_to_addr(last_addr(&net), Family::V4).unwrap().to_string(),
            "10.0.0.127"
        );

        let net6 = parse_cidr("fd00::/127").unwrap();
        assert_eq!(last_addr(&net6) - first_addr(&net6), 1);
    }

    #[test]
    fn test_within() {
        let pool = parse_cidr("10.30.0.0/24").unwrap();
        assert!(within(&pool, &parse_cidr("10.30.0.64/26").unwrap()));
        assert!(within(&pool, &pool));
        assert!(!within(&pool, &parse_cidr("10.30.1.0/26").unwrap()));
        assert!(!within(&pool, &parse_cidr("10.30.0.0/23").unwrap()));
        assert!(!within(&pool, &parse_cidr("fd00::/64").unwrap()));
    }

    #[test]
    fn test_overlaps() {
        let a = parse_cidr("10.0.0.0/24").unwrap();
        let b = parse_cidr("10.0.0.128/25").unwrap();
        let c = parse_cidr("10.0.1.0/24").unwrap();
        assert!(overlaps(&a, &b));
        assert!(overlaps(&b, &a));
        assert!(!overlaps(&a, &c));
        assert!(!overlaps(&a, &parse_cidr("fd00::/8").unwrap()));
    }

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0, 16), Some(0));
        assert_eq!(align_up(1, 16), Some(16));
        assert_eq!(align_up(16, 16), Some(16));
        assert_eq!(align_up(17, 16), Some(32));
        assert_eq!(align_up(5, 0), Some(5));
        assert_eq!(align_up(u128::MAX, 2), None);
    }

    #[test]
    fn test_hosts_to_prefix_v4() {
        assert_eq!(hosts_to_prefix_v4(1), 30);
        assert_eq!(hosts_to_prefix_v4(60), 26);
        // power-of-two boundary: 253 + 3 = 256 fits a /24, 254 + 3 does not
        assert_eq!(hosts_to_prefix_v4(253), 24);
        assert_eq!(hosts_to_prefix_v4(254), 23);
        assert_eq!(hosts_to_prefix_v4(1 << 30), 1);
    }

    #[test]
    fn test_hosts_to_prefix_v4_minimality() {
        for hosts in [1i64, 5, 29, 61, 100, 253, 254, 1000, 65533] {
            let len = hosts_to_prefix_v4(hosts);
            let need = hosts as u128 + 3;
            assert!(1u128 << (32 - len) >= need, "hosts={hosts} len={len}");
            if len < 32 {
                assert!(
                    1u128 << (32 - (len + 1)) < need,
                    "hosts={hosts} len={len} not minimal"
                );
            }
        }
    }
}
