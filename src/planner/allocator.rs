//! VLSM allocator: places requested prefix lengths into the pool catalog.
//!
//! Segments are packed largest-block-first (desired length ascending) and
//! each pool is swept with a monotone cursor against the merged used-range
//! list, so a full pool scan is linear in the number of used ranges. Both
//! families share the one `u128` sweep.

use std::collections::BTreeMap;
use std::error::Error;

use ipnet::IpNet;

use crate::models::prefix::{self, Family};
use crate::models::{Conflict, ConflictKind, Plan, Pool, PoolStrategy, Rules, Segment, Site, StatusLevel};

use super::analyzer;
use super::catalog::{self, PoolItem};
use super::ranges;

/// Desired prefix length for a segment in one family; `None` when the
/// segment carries no usable size request.
///
/// IPv4 derives from the host count when no explicit length is given; IPv6
/// honors only an explicit `prefix_v6`.
pub fn desired_prefix(segment: &Segment, family: Family) -> Option<u8> {
    match family {
        Family::V6 => segment
            .prefix_v6
            .and_then(|v| (v > 0).then(|| v.min(255) as u8)),
        Family::V4 => match segment.prefix {
            Some(v) => (v > 0).then(|| v.min(255) as u8),
            None => segment.hosts.map(prefix::hosts_to_prefix_v4),
        },
    }
}

/// The segment's assigned CIDR string for one family, if any.
pub fn segment_cidr_by_family(segment: &Segment, family: Family) -> Option<&str> {
    match family {
        Family::V4 => segment.cidr.as_deref(),
        Family::V6 => segment.cidr_v6.as_deref(),
    }
}

/// Whether any segment carries a request or assignment for the family.
pub fn segments_need_family(segments: &[Segment], family: Family) -> bool {
    segments.iter().any(|s| match family {
        Family::V6 => s.prefix_v6.is_some() || s.cidr_v6.is_some(),
        Family::V4 => s.prefix.is_some() || s.hosts.is_some() || s.cidr.is_some(),
    })
}

/// Find the first free, aligned block of the wanted length inside a pool.
///
/// The cursor starts at the pool's aligned base and jumps past each used
/// range it collides with; the used-range index only moves forward.
pub fn allocate_in_pool(pool: &IpNet, want: u8, used: &[IpNet]) -> Option<IpNet> {
    let family = Family::of(pool);
    if want < 1 || want > family.bits() {
        return None;
    }
    let masked = pool.trunc();
    if want < masked.prefix_len() {
        return None;
    }
    let bounds = ranges::pool_bounds(&masked);
    let step = 1u128 << (family.bits() - want);
    let used_ranges = ranges::build_used_ranges(&masked, used);

    let mut cur = prefix::align_up(bounds.start, step)?;
    let mut idx = 0;
    loop {
        let cand_end = cur.checked_add(step - 1)?;
        if cand_end > bounds.end {
            return None;
        }
        while idx < used_ranges.len() && used_ranges[idx].end < cur {
            idx += 1;
        }
        if idx >= used_ranges.len() || cand_end < used_ranges[idx].start {
            return prefix::net_from_start(cur, want, family);
        }
        cur = prefix::align_up(used_ranges[idx].end.checked_add(1)?, step)?;
    }
}

fn allocate_fail(segment: &Segment, family: Family) -> Conflict {
    Conflict::new(
        ConflictKind::AllocateFail,
        StatusLevel::Warning,
        format!(
            "segment {} could not be allocated ({family})",
            segment.name
        ),
    )
}

/// First-fit across pools in catalog order; under the tiered strategy the
/// catalog is first narrowed to the segment's tier.
pub fn allocate_spillover(
    items: &[PoolItem],
    segments: &[Segment],
    mut used: Vec<IpNet>,
    rules: &Rules,
    family: Family,
    strict: bool,
) -> (BTreeMap<i64, IpNet>, Vec<Conflict>) {
    let mut alloc = BTreeMap::new();
    let mut conflicts = Vec::new();
    for segment in segments {
        let Some(want) = desired_prefix(segment, family) else {
            continue;
        };
        let tiered;
        let pool_list: &[PoolItem] = if rules.pool_strategy == PoolStrategy::Tiered {
            tiered = catalog::filter_pools_by_tier(
                items,
                &catalog::segment_tier_value(segment),
                rules.pool_tier_fallback,
            );
            &tiered
        } else {
            items
        };
        let mut allocated = None;
        for item in pool_list {
            if let Some(net) = allocate_in_pool(&item.net, want, &used) {
                used.push(net);
                allocated = Some(net);
                break;
            }
        }
        match allocated {
            Some(net) => {
                alloc.insert(segment.id, net);
            }
            None => {
                conflicts.push(allocate_fail(segment, family));
                if strict {
                    break;
                }
            }
        }
    }
    (alloc, conflicts)
}

/// Pool-major packing: each pool greedily absorbs as many of the remaining
/// segments as fit before the next pool is opened.
pub fn allocate_contiguous(
    items: &[PoolItem],
    segments: &[Segment],
    mut used: Vec<IpNet>,
    rules: &Rules,
    family: Family,
    strict: bool,
) -> (BTreeMap<i64, IpNet>, Vec<Conflict>) {
    let mut alloc = BTreeMap::new();
    let mut conflicts = Vec::new();
    let mut pending: Vec<&Segment> = segments.iter().collect();
    for item in items {
        if pending.is_empty() {
            break;
        }
        let mut next_pending = Vec::with_capacity(pending.len());
        for segment in pending {
            let Some(want) = desired_prefix(segment, family) else {
                continue;
            };
            if rules.pool_strategy == PoolStrategy::Tiered {
                let tier = catalog::segment_tier_value(segment);
                if !catalog::pool_tier_matches(item, &tier, rules.pool_tier_fallback) {
                    next_pending.push(segment);
                    continue;
                }
            }
            match allocate_in_pool(&item.net, want, &used) {
                Some(net) => {
                    used.push(net);
                    alloc.insert(segment.id, net);
                }
                None => next_pending.push(segment),
            }
        }
        pending = next_pending;
    }
    for segment in &pending {
        if desired_prefix(segment, family).is_none() {
            continue;
        }
        conflicts.push(allocate_fail(segment, family));
        if strict {
            break;
        }
    }
    (alloc, conflicts)
}

fn run_strategy(
    items: &[PoolItem],
    candidates: &[Segment],
    used: Vec<IpNet>,
    rules: &Rules,
    family: Family,
    strict: bool,
) -> (BTreeMap<i64, IpNet>, Vec<Conflict>) {
    match rules.pool_strategy {
        PoolStrategy::Contiguous => {
            allocate_contiguous(items, candidates, used, rules, family, strict)
        }
        PoolStrategy::Spillover | PoolStrategy::Tiered => {
            allocate_spillover(items, candidates, used, rules, family, strict)
        }
    }
}

/// Sort candidates largest block first; ties break on segment id so the
/// result is independent of input order.
fn sorted_candidates(segments: &[Segment], family: Family) -> Vec<Segment> {
    let mut candidates: Vec<Segment> = segments.to_vec();
    candidates.sort_by_key(|s| (desired_prefix(s, family).unwrap_or(0), s.id));
    candidates
}

/// Planning-mode allocation for one site and family: every failure
/// accumulates, locked segments join the plan unchanged, and missing
/// requests surface as warnings.
pub fn plan_allocate_family(
    segments: &[Segment],
    pools: &[Pool],
    reserved: &[IpNet],
    rules: &Rules,
    family: Family,
) -> (BTreeMap<i64, IpNet>, Vec<Conflict>) {
    let items = catalog::pool_items_for_family(pools, family);
    if items.is_empty() {
        if !segments_need_family(segments, family) {
            return (BTreeMap::new(), Vec::new());
        }
        return (
            BTreeMap::new(),
            vec![Conflict::new(
                ConflictKind::PoolMissing,
                StatusLevel::Warning,
                format!("no pools for family {family}"),
            )],
        );
    }

    let mut used: Vec<IpNet> = Vec::new();
    let mut plan = BTreeMap::new();
    let mut conflicts = Vec::new();

    for segment in segments.iter().filter(|s| s.locked) {
        match segment_cidr_by_family(segment, family) {
            None => conflicts.push(Conflict::new(
                ConflictKind::LockedNoCidr,
                StatusLevel::Warning,
                format!(
                    "segment {} is locked without CIDR ({family})",
                    segment.name
                ),
            )),
            Some(raw) => {
                if let Ok(net) = prefix::parse_cidr(raw) {
                    used.push(net);
                    plan.insert(segment.id, net);
                }
            }
        }
    }
    used.extend_from_slice(reserved);

    let mut candidates = Vec::new();
    for segment in segments.iter().filter(|s| !s.locked) {
        if desired_prefix(segment, family).is_none() {
            conflicts.push(Conflict::new(
                ConflictKind::SizeMissing,
                StatusLevel::Warning,
                format!("segment {} has no size request ({family})", segment.name),
            ));
            continue;
        }
        candidates.push(segment.clone());
    }
    let candidates = sorted_candidates(&candidates, family);

    let (alloc, strategy_conflicts) =
        run_strategy(&items, &candidates, used, rules, family, false);
    conflicts.extend(strategy_conflicts);
    plan.extend(alloc);
    (plan, conflicts)
}

/// Planning-mode allocation over every site, both families. Reserved
/// indexes are keyed by site id.
pub fn plan_allocations(
    segments: &[Segment],
    pools: &[Pool],
    reserved_v4: &BTreeMap<i64, Vec<IpNet>>,
    reserved_v6: &BTreeMap<i64, Vec<IpNet>>,
    rules: &Rules,
) -> (BTreeMap<i64, IpNet>, BTreeMap<i64, IpNet>, Vec<Conflict>) {
    let mut segments_by_site: BTreeMap<i64, Vec<Segment>> = BTreeMap::new();
    for segment in segments {
        segments_by_site
            .entry(segment.site_id)
            .or_default()
            .push(segment.clone());
    }
    let mut pools_by_site: BTreeMap<i64, Vec<Pool>> = BTreeMap::new();
    for pool in pools {
        pools_by_site
            .entry(pool.site_id)
            .or_default()
            .push(pool.clone());
    }

    let empty_reserved: Vec<IpNet> = Vec::new();
    let empty_pools: Vec<Pool> = Vec::new();
    let mut plan_v4 = BTreeMap::new();
    let mut plan_v6 = BTreeMap::new();
    let mut conflicts = Vec::new();

    for (site_id, site_segments) in &mut segments_by_site {
        site_segments.sort_by_key(|s| s.id);
        let site_pools = pools_by_site.get(site_id).unwrap_or(&empty_pools);

        let (alloc_v4, cf_v4) = plan_allocate_family(
            site_segments,
            site_pools,
            reserved_v4.get(site_id).unwrap_or(&empty_reserved),
            rules,
            Family::V4,
        );
        let (alloc_v6, cf_v6) = plan_allocate_family(
            site_segments,
            site_pools,
            reserved_v6.get(site_id).unwrap_or(&empty_reserved),
            rules,
            Family::V6,
        );
        plan_v4.extend(alloc_v4);
        plan_v6.extend(alloc_v6);
        conflicts.extend(cf_v4);
        conflicts.extend(cf_v6);
    }

    (plan_v4, plan_v6, conflicts)
}

/// Strict allocation for one site and family: locked prefixes and reserved
/// ranges seed the used set, and the first unplaceable segment is fatal.
fn allocate_family_strict(
    segments: &[Segment],
    pools: &[Pool],
    reserved: &[IpNet],
    rules: &Rules,
    family: Family,
) -> (BTreeMap<i64, IpNet>, Vec<Conflict>) {
    let items = catalog::pool_items_for_family(pools, family);
    if items.is_empty() {
        return (BTreeMap::new(), Vec::new());
    }

    let mut used: Vec<IpNet> = segments
        .iter()
        .filter(|s| s.locked)
        .filter_map(|s| segment_cidr_by_family(s, family))
        .filter_map(|raw| prefix::parse_cidr(raw).ok())
        .collect();
    used.extend_from_slice(reserved);

    let candidates: Vec<Segment> = segments
        .iter()
        .filter(|s| !s.locked && desired_prefix(s, family).is_some())
        .cloned()
        .collect();
    if candidates.is_empty() {
        return (BTreeMap::new(), Vec::new());
    }
    let candidates = sorted_candidates(&candidates, family);

    run_strategy(&items, &candidates, used, rules, family, true)
}

/// Strict allocation over a whole project snapshot.
///
/// Returns the assignments for every site and family, or the first
/// allocation failure as an error; a failed family contributes nothing to
/// the plan, mirroring a rolled-back store transaction.
pub fn allocate_project(
    segments: &[Segment],
    pools: &[Pool],
    sites: &[Site],
    rules: &Rules,
) -> Result<Plan, Box<dyn Error>> {
    let rules = rules.normalize();
    let (reserved_v4, reserved_v6, _) = analyzer::build_reserved_index(sites);
    let empty_reserved: Vec<IpNet> = Vec::new();

    let mut plan = Plan::default();
    for site in sites {
        let site_pools: Vec<Pool> = pools
            .iter()
            .filter(|p| p.site_id == site.id)
            .cloned()
            .collect();
        if site_pools.is_empty() {
            continue;
        }
        let mut site_segments: Vec<Segment> = segments
            .iter()
            .filter(|s| s.site_id == site.id)
            .cloned()
            .collect();
        site_segments.sort_by_key(|s| s.id);

        for family in [Family::V4, Family::V6] {
            let reserved = match family {
                Family::V4 => reserved_v4.get(&site.id).unwrap_or(&empty_reserved),
                Family::V6 => reserved_v6.get(&site.id).unwrap_or(&empty_reserved),
            };
            let (alloc, conflicts) =
                allocate_family_strict(&site_segments, &site_pools, reserved, &rules, family);
            if let Some(first) = conflicts.first() {
                return Err(first.detail.clone().into());
            }
            match family {
                Family::V4 => plan.v4.extend(alloc),
                Family::V6 => plan.v6.extend(alloc),
            }
        }
    }
    log::info!(
        "allocated {} v4 and {} v6 assignments across {} sites",
        plan.v4.len(),
        plan.v6.len(),
        sites.len()
    );
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::prefix::parse_cidr;

    fn pool(id: i64, cidr: &str, tier: Option<&str>, priority: i64) -> Pool {
        Pool {
            id,
            site_id: 1,
            site: "SAI".to_string(),
            cidr: cidr.to_string(),
            family: "ipv4".to_string(),
            tier: tier.map(str::to_string),
            priority,
        }
    }

    fn segment(id: i64, name: &str, vlan: u16, hosts: Option<i64>) -> Segment {
        Segment {
            id,
            site_id: 1,
            site: "SAI".to_string(),
            vrf: "PROD".to_string(),
            vlan,
            name: name.to_string(),
            hosts,
            ..Segment::default()
        }
    }

    #[test]
    fn test_desired_prefix() {
        let mut s = segment(1, "users", 10, Some(60));
        assert_eq!(desired_prefix(&s, Family::V4), Some(26));
        s.prefix = Some(27);
        assert_eq!(desired_prefix(&s, Family::V4), Some(27), "explicit wins");
        assert_eq!(desired_prefix(&s, Family::V6), None, "no v6 host derivation");
        s.prefix_v6 = Some(64);
        assert_eq!(desired_prefix(&s, Family::V6), Some(64));
    }

    #[test]
    fn test_allocate_in_pool_skips_used() {
        let pool = parse_cidr("10.30.0.0/24").unwrap();
        let used = vec![
            parse_cidr("10.30.0.0/28").unwrap(),  // reserved
            parse_cidr("10.30.0.64/26").unwrap(), // locked
        ];
        // A /26 cannot start at .0 (reserved) or .64 (locked): first fit .128
        let got = allocate_in_pool(&pool, 26, &used).expect("fits");
        assert_eq!(got.to_string(), "10.30.0.128/26");
    }

    #[test]
    fn test_allocate_in_pool_exhausted() {
        let pool = parse_cidr("10.0.0.0/25").unwrap();
        let used = vec![parse_cidr("10.0.0.64/26").unwrap()];
        assert_eq!(
            allocate_in_pool(&pool, 26, &used).unwrap().to_string(),
            "10.0.0.0/26"
        );
        let used = vec![
            parse_cidr("10.0.0.0/26").unwrap(),
            parse_cidr("10.0.0.64/26").unwrap(),
        ];
        assert!(allocate_in_pool(&pool, 26, &used).is_none());
    }

    #[test]
    fn test_allocate_in_pool_rejects_bad_want() {
        let pool = parse_cidr("10.0.0.0/24").unwrap();
        assert!(allocate_in_pool(&pool, 0, &[]).is_none());
        assert!(allocate_in_pool(&pool, 33, &[]).is_none());
        assert!(allocate_in_pool(&pool, 16, &[]).is_none(), "want above pool");
    }

    #[test]
    fn test_allocate_in_pool_v6() {
        let pool = parse_cidr("fd00:10::/48").unwrap();
        let used = vec![parse_cidr("fd00:10::/64").unwrap()];
        let got = allocate_in_pool(&pool, 64, &used).expect("fits");
        assert_eq!(got.to_string(), "fd00:10:0:1::/64");
    }

    #[test]
    fn test_spillover_basic_vlsm() {
        let pools = vec![pool(1, "10.30.0.0/24", None, 0)];
        let items = catalog::pool_items_for_family(&pools, Family::V4);
        let used = vec![
            parse_cidr("10.30.0.0/28").unwrap(),  // reserved
            parse_cidr("10.30.0.64/26").unwrap(), // locked mgmt
        ];
        let candidates = sorted_candidates(
            &[
                segment(2, "users", 10, Some(60)),
                segment(3, "voice", 11, Some(50)),
            ],
            Family::V4,
        );
        let (alloc, conflicts) = allocate_spillover(
            &items,
            &candidates,
            used,
            &Rules::default(),
            Family::V4,
            false,
        );
        assert!(conflicts.is_empty(), "unexpected: {conflicts:?}");
        assert_eq!(alloc[&2].to_string(), "10.30.0.128/26");
        assert_eq!(alloc[&3].to_string(), "10.30.0.192/26");
    }

    #[test]
    fn test_spillover_overflows_to_next_pool() {
        let pools = vec![
            pool(1, "10.0.0.0/26", None, 0),
            pool(2, "10.1.0.0/24", None, 1),
        ];
        let items = catalog::pool_items_for_family(&pools, Family::V4);
        let mut a = segment(1, "a", 10, None);
        a.prefix = Some(26);
        let mut b = segment(2, "b", 11, None);
        b.prefix = Some(26);
        let (alloc, conflicts) = allocate_spillover(
            &items,
            &[a, b],
            Vec::new(),
            &Rules::default(),
            Family::V4,
            false,
        );
        assert!(conflicts.is_empty());
        assert_eq!(alloc[&1].to_string(), "10.0.0.0/26");
        assert_eq!(alloc[&2].to_string(), "10.1.0.0/26");
    }

    #[test]
    fn test_tiered_with_fallback() {
        let pools = vec![
            pool(1, "10.0.0.0/24", Some("gold"), 0),
            pool(2, "10.1.0.0/24", None, 1),
        ];
        let items = catalog::pool_items_for_family(&pools, Family::V4);
        let rules = Rules {
            pool_strategy: PoolStrategy::Tiered,
            pool_tier_fallback: true,
            ..Rules::default()
        };
        let mut s1 = segment(1, "s1", 10, None);
        s1.prefix = Some(28);
        s1.pool_tier = Some("gold".to_string());
        let mut s2 = segment(2, "s2", 11, None);
        s2.prefix = Some(28);

        let (alloc, conflicts) =
            allocate_spillover(&items, &[s1, s2], Vec::new(), &rules, Family::V4, false);
        assert!(conflicts.is_empty());
        assert_eq!(alloc[&1].to_string(), "10.0.0.0/28");
        assert_eq!(alloc[&2].to_string(), "10.1.0.0/28", "untiered prefers untiered pool");
    }

    #[test]
    fn test_tiered_without_fallback_fails() {
        // one tiny gold pool, two gold segments: the second cannot land
        let pools = vec![pool(1, "10.0.0.0/28", Some("gold"), 0)];
        let items = catalog::pool_items_for_family(&pools, Family::V4);
        let rules = Rules {
            pool_strategy: PoolStrategy::Tiered,
            pool_tier_fallback: false,
            ..Rules::default()
        };
        let mut s1 = segment(1, "s1", 10, None);
        s1.prefix = Some(28);
        s1.pool_tier = Some("gold".to_string());
        let mut s2 = segment(2, "s2", 11, None);
        s2.prefix = Some(28);
        s2.pool_tier = Some("gold".to_string());

        let (alloc, conflicts) =
            allocate_spillover(&items, &[s1, s2], Vec::new(), &rules, Family::V4, false);
        assert_eq!(alloc.len(), 1);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ConflictKind::AllocateFail);
        assert!(conflicts[0].detail.contains("s2"));
    }

    #[test]
    fn test_contiguous_fills_pool_first() {
        let pools = vec![
            pool(1, "10.0.0.0/25", None, 0),
            pool(2, "10.1.0.0/24", None, 1),
        ];
        let items = catalog::pool_items_for_family(&pools, Family::V4);
        let mut segments = Vec::new();
        for (id, len) in [(1i64, 26u8), (2, 26), (3, 26)] {
            let mut s = segment(id, &format!("s{id}"), id as u16 + 9, None);
            s.prefix = Some(len as i64);
            segments.push(s);
        }
        let rules = Rules {
            pool_strategy: PoolStrategy::Contiguous,
            ..Rules::default()
        };
        let (alloc, conflicts) =
            allocate_contiguous(&items, &segments, Vec::new(), &rules, Family::V4, false);
        assert!(conflicts.is_empty());
        assert_eq!(alloc[&1].to_string(), "10.0.0.0/26");
        assert_eq!(alloc[&2].to_string(), "10.0.0.64/26");
        assert_eq!(alloc[&3].to_string(), "10.1.0.0/26");
    }

    #[test]
    fn test_plan_allocate_family_warnings() {
        let pools = vec![pool(1, "10.0.0.0/24", None, 0)];
        let mut locked = segment(1, "mgmt", 20, None);
        locked.locked = true; // locked but no CIDR
        let sizeless = segment(2, "mystery", 21, None);

        let (plan, conflicts) = plan_allocate_family(
            &[locked, sizeless],
            &pools,
            &[],
            &Rules::default(),
            Family::V4,
        );
        assert!(plan.is_empty());
        let kinds: Vec<ConflictKind> = conflicts.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![ConflictKind::LockedNoCidr, ConflictKind::SizeMissing]
        );
    }

    #[test]
    fn test_plan_allocate_family_pool_missing() {
        let segments = vec![segment(1, "users", 10, Some(10))];
        let (plan, conflicts) =
            plan_allocate_family(&segments, &[], &[], &Rules::default(), Family::V4);
        assert!(plan.is_empty());
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ConflictKind::PoolMissing);

        // no v6 request anywhere: silence, not POOL_MISSING
        let (_, conflicts) =
            plan_allocate_family(&segments, &[], &[], &Rules::default(), Family::V6);
        assert!(conflicts.is_empty());
    }

    #[test]
    fn test_allocate_project_strict_failure() {
        let sites = vec![Site {
            id: 1,
            name: "SAI".to_string(),
            reserved_ranges: None,
        }];
        let pools = vec![pool(1, "10.0.0.0/28", None, 0)];
        let mut big = segment(1, "big", 10, None);
        big.prefix = Some(24); // cannot fit a /24 in a /28 pool
        let err = allocate_project(&[big], &pools, &sites, &Rules::default())
            .expect_err("allocation must fail");
        assert!(err.to_string().contains("big"), "got: {err}");
    }

    #[test]
    fn test_allocation_is_order_independent() {
        let sites = vec![Site {
            id: 1,
            name: "SAI".to_string(),
            reserved_ranges: Some("10.30.0.0/28".to_string()),
        }];
        let pools = vec![pool(1, "10.30.0.0/24", None, 0)];
        let mut mgmt = segment(3, "mgmt", 20, None);
        mgmt.locked = true;
        mgmt.cidr = Some("10.30.0.64/26".to_string());
        let users = segment(1, "users", 10, Some(60));
        let voice = segment(2, "voice", 11, Some(50));

        let forward = allocate_project(
            &[mgmt.clone(), users.clone(), voice.clone()],
            &pools,
            &sites,
            &Rules::default(),
        )
        .expect("allocates");
        let backward = allocate_project(
            &[voice, users, mgmt],
            &pools,
            &sites,
            &Rules::default(),
        )
        .expect("allocates");
        assert_eq!(forward.v4, backward.v4);
        assert_eq!(forward.v4[&1].to_string(), "10.30.0.128/26");
        assert_eq!(forward.v4[&2].to_string(), "10.30.0.192/26");
        assert!(!forward.v4.contains_key(&3), "locked segment not re-planned");
    }
}
