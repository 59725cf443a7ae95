//! Snapshot entities handed across the store boundary.
//!
//! CIDR-valued fields travel as plain strings and are parsed at the point
//! of use, so malformed values surface as conflicts instead of failing the
//! whole snapshot load.

use std::collections::BTreeMap;

use ipnet::IpNet;
use serde::{Deserialize, Serialize};

use super::conflict::Conflict;

/// A physical or logical location owning pools and segments.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Site {
    pub id: i64,
    pub name: String,
    /// Comma-separated list of reserved prefixes, mixed v4/v6.
    #[serde(default)]
    pub reserved_ranges: Option<String>,
}

/// A site-scoped address range segments are allocated from.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Pool {
    pub id: i64,
    pub site_id: i64,
    /// Site name, denormalized for reporting.
    #[serde(default)]
    pub site: String,
    pub cidr: String,
    /// "ipv4" or "ipv6"; anything else normalizes to "ipv4".
    #[serde(default)]
    pub family: String,
    #[serde(default)]
    pub tier: Option<String>,
    /// Lower priority pools are tried first.
    #[serde(default)]
    pub priority: i64,
}

/// A named subnet specification: either a request (hosts / prefix length)
/// or an already-assigned block, or both.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Segment {
    pub id: i64,
    pub site_id: i64,
    /// Site name, denormalized for reporting and VLAN scoping.
    #[serde(default)]
    pub site: String,
    pub vrf: String,
    pub vlan: u16,
    pub name: String,
    #[serde(default)]
    pub hosts: Option<i64>,
    #[serde(default)]
    pub prefix: Option<i64>,
    #[serde(default)]
    pub cidr: Option<String>,
    #[serde(default)]
    pub prefix_v6: Option<i64>,
    #[serde(default)]
    pub cidr_v6: Option<String>,
    /// Locked segments keep their assigned CIDRs; the allocator never
    /// moves them.
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub gateway: Option<String>,
    #[serde(default)]
    pub gateway_v6: Option<String>,
    /// Free-form comma-separated tags; `tier:x` / `tier=x` entries pair the
    /// segment with pools of that tier.
    #[serde(default)]
    pub tags: Option<String>,
    /// Explicit tier, overriding any tag.
    #[serde(default)]
    pub pool_tier: Option<String>,
}

impl Default for Segment {
    fn default() -> Segment {
        Segment {
            id: 0,
            site_id: 0,
            site: String::new(),
            vrf: String::new(),
            vlan: 0,
            name: String::new(),
            hosts: None,
            prefix: None,
            cidr: None,
            prefix_v6: None,
            cidr_v6: None,
            locked: false,
            gateway: None,
            gateway_v6: None,
            tags: None,
            pool_tier: None,
        }
    }
}

/// Allocation result: per-family assignments keyed by segment id, plus any
/// conflicts the run produced. Ordered maps keep output deterministic.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub v4: BTreeMap<i64, IpNet>,
    pub v6: BTreeMap<i64, IpNet>,
    pub conflicts: Vec<Conflict>,
}
