//! Pool catalog: the ordered list of candidate pools the allocator sweeps,
//! plus the tier tagging that pairs segments with pools.

use ipnet::IpNet;
use lazy_static::lazy_static;
use regex::Regex;

use crate::models::prefix::{self, Family};
use crate::models::{Pool, Segment};

/// A pool with its parsed prefix and normalized tier, ready for the
/// allocator to iterate.
#[derive(Debug, Clone)]
pub struct PoolItem {
    pub pool: Pool,
    pub net: IpNet,
    pub tier: String,
}

lazy_static! {
    static ref TIER_TAG: Regex = Regex::new(r"(?i)^tier[:=]\s*(\S.*)$").expect("tier tag regex");
}

/// Normalized tier of a pool: lowercased, trimmed, empty when unset.
pub fn pool_tier_value(pool: &Pool) -> String {
    pool.tier
        .as_deref()
        .map(|t| t.trim().to_lowercase())
        .unwrap_or_default()
}

/// Normalized tier of a segment: the explicit `pool_tier` wins, else the
/// first `tier:x` / `tier=x` entry among the comma-separated tags.
pub fn segment_tier_value(segment: &Segment) -> String {
    if let Some(tier) = segment.pool_tier.as_deref() {
        let tier = tier.trim();
        if !tier.is_empty() {
            return tier.to_lowercase();
        }
    }
    let Some(tags) = segment.tags.as_deref() else {
        return String::new();
    };
    for part in tags.split(',') {
        if let Some(caps) = TIER_TAG.captures(part.trim()) {
            return caps[1].trim().to_lowercase();
        }
    }
    String::new()
}

/// Build the catalog for one family: parseable pools of that family,
/// sorted by (priority, tier, CIDR string). The sort is stable, so equal
/// pools keep their input order.
pub fn pool_items_for_family(pools: &[Pool], family: Family) -> Vec<PoolItem> {
    let mut items: Vec<PoolItem> = Vec::with_capacity(pools.len());
    for pool in pools {
        if Family::normalize(&pool.family) != family {
            continue;
        }
        let Ok(net) = prefix::parse_cidr(&pool.cidr) else {
            continue;
        };
        if Family::of(&net) != family {
            continue;
        }
        items.push(PoolItem {
            tier: pool_tier_value(pool),
            pool: pool.clone(),
            net,
        });
    }
    items.sort_by(|a, b| {
        a.pool
            .priority
            .cmp(&b.pool.priority)
            .then_with(|| a.tier.cmp(&b.tier))
            .then_with(|| a.net.to_string().cmp(&b.net.to_string()))
    });
    items
}

/// Whether one pool is eligible for a segment of the given tier under the
/// contiguous strategy's per-pool check.
pub fn pool_tier_matches(item: &PoolItem, tier: &str, fallback: bool) -> bool {
    if !tier.is_empty() {
        return item.tier == tier || fallback;
    }
    item.tier.is_empty() || fallback
}

/// Restrict the catalog to pools matching a segment tier. A segment with
/// no tier prefers untiered pools; when nothing matches and fallback is
/// on, the whole catalog is returned.
pub fn filter_pools_by_tier(items: &[PoolItem], tier: &str, fallback: bool) -> Vec<PoolItem> {
    if tier.is_empty() {
        let untiered: Vec<PoolItem> = items.iter().filter(|p| p.tier.is_empty()).cloned().collect();
        if !untiered.is_empty() {
            return untiered;
        }
        return if fallback { items.to_vec() } else { Vec::new() };
    }
    let matching: Vec<PoolItem> = items.iter().filter(|p| p.tier == tier).cloned().collect();
    if matching.is_empty() && fallback {
        return items.to_vec();
    }
    matching
}
