//! Presentation views: segments decorated with computed address details,
//! the best-matching pool label, and their analysis status.

use std::collections::BTreeMap;

use ipnet::IpNet;

use crate::models::prefix::{self, Family};
use crate::models::{Pool, Segment, SegmentStatus};

/// Computed addresses of one IPv4 prefix. Usable range is present only
/// for lengths that actually have one (<= /30).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixDetails {
    pub network: String,
    pub broadcast: String,
    pub mask: String,
    pub first_usable: Option<String>,
    pub last_usable: Option<String>,
}

/// Address details of an IPv4 prefix; `None` for IPv6 input.
pub fn prefix_details_v4(net: &IpNet) -> Option<PrefixDetails> {
    let IpNet::V4(v4) = net else {
        return None;
    };
    let start = u64::from(u32::from(v4.network()));
    let size = 1u64 << (32 - v4.prefix_len());
    let mut details = PrefixDetails {
        network: v4.network().to_string(),
        broadcast: v4.broadcast().to_string(),
        mask: v4.netmask().to_string(),
        first_usable: None,
        last_usable: None,
    };
    if v4.prefix_len() <= 30 {
        details.first_usable = Some(std::net::Ipv4Addr::from((start + 1) as u32).to_string());
        details.last_usable =
            Some(std::net::Ipv4Addr::from((start + size - 2) as u32).to_string());
    }
    Some(details)
}

#[derive(Debug, Clone)]
struct PoolRef {
    pool: Pool,
    net: IpNet,
}

fn build_pool_refs(pools: &[Pool]) -> BTreeMap<i64, Vec<PoolRef>> {
    let mut out: BTreeMap<i64, Vec<PoolRef>> = BTreeMap::new();
    for pool in pools {
        let Ok(net) = prefix::parse_cidr(&pool.cidr) else {
            continue;
        };
        out.entry(pool.site_id).or_default().push(PoolRef {
            pool: pool.clone(),
            net,
        });
    }
    out
}

fn pool_ref_better(a: &PoolRef, b: &PoolRef) -> bool {
    if a.pool.priority != b.pool.priority {
        return a.pool.priority < b.pool.priority;
    }
    if a.net.prefix_len() != b.net.prefix_len() {
        return a.net.prefix_len() > b.net.prefix_len();
    }
    a.net.to_string() < b.net.to_string()
}

/// Label of the best pool containing a prefix: the smallest containing
/// pool of the same family, priority winning ties. Empty when no pool
/// contains it.
fn pool_label_for_prefix(net: &IpNet, pools: &[PoolRef]) -> String {
    let mut best: Option<&PoolRef> = None;
    for candidate in pools {
        if Family::of(&candidate.net) != Family::of(net) {
            continue;
        }
        if !prefix::within(&candidate.net, net) {
            continue;
        }
        if best.is_none() || pool_ref_better(candidate, best.unwrap()) {
            best = Some(candidate);
        }
    }
    let Some(best) = best else {
        return String::new();
    };
    let mut label = best.pool.cidr.clone();
    if let Some(tier) = best.pool.tier.as_deref() {
        let tier = tier.trim();
        if !tier.is_empty() {
            label.push_str(&format!(" [{tier}]"));
        }
    }
    if best.pool.priority > 0 {
        label.push_str(&format!(" p{}", best.pool.priority));
    }
    label
}

fn format_request(segment: &Segment) -> String {
    if let Some(prefix) = segment.prefix {
        return format!("/{prefix}");
    }
    if let Some(hosts) = segment.hosts {
        return format!("{hosts} hosts");
    }
    "-".to_string()
}

fn format_request_v6(segment: &Segment) -> String {
    match segment.prefix_v6 {
        Some(prefix) => format!("/{prefix}"),
        None => "-".to_string(),
    }
}

fn explicit_or(value: Option<&str>, fallback: String) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => fallback,
    }
}

fn default_gateway_v6(net: &IpNet) -> String {
    let masked = net.trunc();
    if prefix::prefix_size(&masked) < 2 {
        return String::new();
    }
    match prefix::u128_to_addr(prefix::first_addr(&masked) + 1, Family::V6) {
        Some(addr) => addr.to_string(),
        None => String::new(),
    }
}

/// A segment decorated for display.
#[derive(Debug, Clone)]
pub struct SegmentView {
    pub segment: Segment,
    pub request: String,
    pub request_v6: String,
    pub cidr: String,
    pub cidr_v6: String,
    pub mask: String,
    pub network: String,
    pub broadcast: String,
    pub gateway: String,
    pub gateway_v6: String,
    pub pool_label: String,
    pub pool_label_v6: String,
    pub status_label: String,
    pub status_class: String,
    pub status_detail: String,
}

/// Decorate every segment with computed details, pool labels, and its
/// analysis status.
pub fn build_segment_views(
    segments: &[Segment],
    statuses: &BTreeMap<i64, SegmentStatus>,
    pools: &[Pool],
) -> Vec<SegmentView> {
    let pool_refs = build_pool_refs(pools);
    let no_refs: Vec<PoolRef> = Vec::new();
    let mut out = Vec::with_capacity(segments.len());
    for segment in segments {
        let status = statuses.get(&segment.id).cloned().unwrap_or_default();
        let mut view = SegmentView {
            request: format_request(segment),
            request_v6: format_request_v6(segment),
            cidr: segment.cidr.clone().unwrap_or_default(),
            cidr_v6: segment.cidr_v6.clone().unwrap_or_default(),
            mask: String::new(),
            network: String::new(),
            broadcast: String::new(),
            gateway: String::new(),
            gateway_v6: String::new(),
            pool_label: String::new(),
            pool_label_v6: String::new(),
            status_label: status.level.label().to_string(),
            status_class: status.level.class().to_string(),
            status_detail: status.details.join("; "),
            segment: segment.clone(),
        };

        let site_refs = pool_refs.get(&segment.site_id).unwrap_or(&no_refs);
        if let Some(raw) = segment.cidr.as_deref() {
            if let Ok(net) = prefix::parse_cidr(raw) {
                if let Some(details) = prefix_details_v4(&net) {
                    view.mask = details.mask.clone();
                    view.network = details.network.clone();
                    view.broadcast = details.broadcast.clone();
                    view.gateway = explicit_or(
                        segment.gateway.as_deref(),
                        details.first_usable.clone().unwrap_or_default(),
                    );
                }
                view.pool_label = pool_label_for_prefix(&net, site_refs);
            }
        }
        if let Some(raw) = segment.cidr_v6.as_deref() {
            if let Ok(net) = prefix::parse_cidr(raw) {
                view.gateway_v6 =
                    explicit_or(segment.gateway_v6.as_deref(), default_gateway_v6(&net));
                view.pool_label_v6 = pool_label_for_prefix(&net, site_refs);
            }
        }
        // without a parseable prefix the stored gateway passes through
        // as-is, whitespace included
        if view.gateway.is_empty() {
            view.gateway = segment.gateway.clone().unwrap_or_default();
        }
        if view.gateway_v6.is_empty() {
            view.gateway_v6 = segment.gateway_v6.clone().unwrap_or_default();
        }
        out.push(view);
    }
    out
}
