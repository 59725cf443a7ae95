//! Constraint analyzer: classifies every segment (OK / Warning / Conflict)
//! and emits the typed conflict list.
//!
//! Check order is part of the contract: reserved-range parse warnings,
//! then per-segment checks in input order, then pairwise overlaps per
//! (site, VRF) group in sorted group order, then VLAN duplicates.

use std::collections::BTreeMap;

use ipnet::IpNet;

use crate::models::prefix::{self, Family};
use crate::models::rules::vlan_key;
use crate::models::{Conflict, ConflictKind, Pool, Rules, Segment, SegmentStatus, Site, StatusLevel};

use super::efficiency;

/// Per-site pool prefixes, split by family.
///
/// A pool declared "ipv6" whose CIDR parses as IPv4 falls back into the
/// v4 index; declared-v4 pools with v6 prefixes are dropped.
pub fn build_pool_index(
    pools: &[Pool],
) -> (BTreeMap<i64, Vec<IpNet>>, BTreeMap<i64, Vec<IpNet>>) {
    let mut out_v4: BTreeMap<i64, Vec<IpNet>> = BTreeMap::new();
    let mut out_v6: BTreeMap<i64, Vec<IpNet>> = BTreeMap::new();
    for pool in pools {
        let Ok(net) = prefix::parse_cidr(&pool.cidr) else {
            continue;
        };
        if Family::normalize(&pool.family) == Family::V6 && Family::of(&net) == Family::V6 {
            out_v6.entry(pool.site_id).or_default().push(net);
            continue;
        }
        if Family::of(&net) == Family::V4 {
            out_v4.entry(pool.site_id).or_default().push(net);
        }
    }
    (out_v4, out_v6)
}

/// Parse every site's reserved-range list into per-site prefix sets, split
/// by family. Malformed entries become `RESERVED_PARSE` warnings.
pub fn build_reserved_index(
    sites: &[Site],
) -> (
    BTreeMap<i64, Vec<IpNet>>,
    BTreeMap<i64, Vec<IpNet>>,
    Vec<Conflict>,
) {
    let mut out_v4: BTreeMap<i64, Vec<IpNet>> = BTreeMap::new();
    let mut out_v6: BTreeMap<i64, Vec<IpNet>> = BTreeMap::new();
    let mut conflicts = Vec::new();
    for site in sites {
        let Some(raw) = site.reserved_ranges.as_deref() else {
            continue;
        };
        for part in raw.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            match prefix::parse_cidr(part) {
                Ok(net) => match Family::of(&net) {
                    Family::V4 => out_v4.entry(site.id).or_default().push(net),
                    Family::V6 => out_v6.entry(site.id).or_default().push(net),
                },
                Err(_) => conflicts.push(Conflict::new(
                    ConflictKind::ReservedParse,
                    StatusLevel::Warning,
                    format!("site={} bad reserved range: {part}", site.name),
                )),
            }
        }
    }
    (out_v4, out_v6, conflicts)
}

fn prefix_in_any_pool(net: &IpNet, pools: &[IpNet]) -> bool {
    pools.iter().any(|pool| prefix::within(pool, net))
}

fn join_prefixes(pools: &[IpNet]) -> String {
    pools
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<String>>()
        .join(", ")
}

fn add_status(
    statuses: &mut BTreeMap<i64, SegmentStatus>,
    id: i64,
    level: StatusLevel,
    detail: &str,
) {
    statuses.entry(id).or_default().add(level, detail);
}

/// Run every per-segment and cross-segment check against an already
/// (possibly) CIDR-assigned segment set.
pub fn analyze_segments(
    segments: &[Segment],
    pools_v4: &BTreeMap<i64, Vec<IpNet>>,
    pools_v6: &BTreeMap<i64, Vec<IpNet>>,
    reserved_v4: &BTreeMap<i64, Vec<IpNet>>,
    reserved_v6: &BTreeMap<i64, Vec<IpNet>>,
    rules: &Rules,
) -> (BTreeMap<i64, SegmentStatus>, Vec<Conflict>) {
    let mut statuses: BTreeMap<i64, SegmentStatus> = BTreeMap::new();
    let mut conflicts: Vec<Conflict> = Vec::with_capacity(segments.len());

    let seg_by_id: BTreeMap<i64, &Segment> = segments.iter().map(|s| (s.id, s)).collect();
    let mut prefix_by_id: BTreeMap<i64, IpNet> = BTreeMap::new();
    let mut prefix_by_id_v6: BTreeMap<i64, IpNet> = BTreeMap::new();

    for segment in segments {
        if segment.prefix.is_none() && segment.hosts.is_none() {
            add_status(&mut statuses, segment.id, StatusLevel::Warning, "size request missing");
        }
        if segment.prefix_v6.is_some() && segment.cidr_v6.is_none() {
            add_status(&mut statuses, segment.id, StatusLevel::Warning, "v6 not allocated");
        }

        match segment.cidr.as_deref() {
            None => {
                add_status(&mut statuses, segment.id, StatusLevel::Warning, "not allocated");
            }
            Some(raw) => match prefix::parse_cidr(raw) {
                Err(_) => {
                    add_status(&mut statuses, segment.id, StatusLevel::Conflict, "invalid CIDR");
                    conflicts.push(Conflict::new(
                        ConflictKind::CidrParse,
                        StatusLevel::Conflict,
                        format!(
                            "segment {} site={} cidr={raw} parse error",
                            segment.name, segment.site
                        ),
                    ));
                }
                Ok(net) => {
                    prefix_by_id.insert(segment.id, net);

                    match pools_v4.get(&segment.site_id) {
                        None => add_status(
                            &mut statuses,
                            segment.id,
                            StatusLevel::Warning,
                            "no pool defined for site",
                        ),
                        Some(pools) => {
                            if !prefix_in_any_pool(&net, pools) {
                                let level = if rules.require_in_pool {
                                    StatusLevel::Conflict
                                } else {
                                    StatusLevel::Warning
                                };
                                add_status(&mut statuses, segment.id, level, "out of pool");
                                conflicts.push(Conflict::new(
                                    ConflictKind::OutOfPool,
                                    level,
                                    format!(
                                        "segment {} site={} cidr={net} outside pools: {}",
                                        segment.name,
                                        segment.site,
                                        join_prefixes(pools)
                                    ),
                                ));
                            }
                        }
                    }

                    if let Some(ranges) = reserved_v4.get(&segment.site_id) {
                        for r in ranges {
                            if prefix::overlaps(r, &net) {
                                let level = if rules.allow_reserved_overlap {
                                    StatusLevel::Warning
                                } else {
                                    StatusLevel::Conflict
                                };
                                add_status(
                                    &mut statuses,
                                    segment.id,
                                    level,
                                    "overlaps reserved range",
                                );
                                conflicts.push(Conflict::new(
                                    ConflictKind::ReservedOverlap,
                                    level,
                                    format!(
                                        "segment {} site={} cidr={net} overlaps reserved {r}",
                                        segment.name, segment.site
                                    ),
                                ));
                                break;
                            }
                        }
                    }
                }
            },
        }

        if let Some(raw) = segment.cidr_v6.as_deref() {
            match prefix::parse_cidr(raw) {
                Err(_) => {
                    add_status(&mut statuses, segment.id, StatusLevel::Conflict, "invalid CIDR v6");
                    conflicts.push(Conflict::new(
                        ConflictKind::Cidr6Parse,
                        StatusLevel::Conflict,
                        format!(
                            "segment {} site={} cidr_v6={raw} parse error",
                            segment.name, segment.site
                        ),
                    ));
                }
                Ok(net) => {
                    prefix_by_id_v6.insert(segment.id, net);

                    match pools_v6.get(&segment.site_id) {
                        None => add_status(
                            &mut statuses,
                            segment.id,
                            StatusLevel::Warning,
                            "no v6 pool defined for site",
                        ),
                        Some(pools) => {
                            if !prefix_in_any_pool(&net, pools) {
                                let level = if rules.require_in_pool {
                                    StatusLevel::Conflict
                                } else {
                                    StatusLevel::Warning
                                };
                                add_status(&mut statuses, segment.id, level, "v6 out of pool");
                                conflicts.push(Conflict::new(
                                    ConflictKind::OutOfPoolV6,
                                    level,
                                    format!(
                                        "segment {} site={} cidr_v6={net} outside v6 pools: {}",
                                        segment.name,
                                        segment.site,
                                        join_prefixes(pools)
                                    ),
                                ));
                            }
                        }
                    }

                    if let Some(ranges) = reserved_v6.get(&segment.site_id) {
                        for r in ranges {
                            if prefix::overlaps(r, &net) {
                                let level = if rules.allow_reserved_overlap {
                                    StatusLevel::Warning
                                } else {
                                    StatusLevel::Conflict
                                };
                                add_status(
                                    &mut statuses,
                                    segment.id,
                                    level,
                                    "overlaps v6 reserved range",
                                );
                                conflicts.push(Conflict::new(
                                    ConflictKind::ReservedOverlapV6,
                                    level,
                                    format!(
                                        "segment {} site={} cidr_v6={net} overlaps reserved {r}",
                                        segment.name, segment.site
                                    ),
                                ));
                                break;
                            }
                        }
                    }
                }
            }
        }
    }

    overlap_pass(
        segments,
        &prefix_by_id,
        &seg_by_id,
        ConflictKind::Overlap,
        "overlap with",
        &mut statuses,
        &mut conflicts,
    );
    overlap_pass(
        segments,
        &prefix_by_id_v6,
        &seg_by_id,
        ConflictKind::OverlapV6,
        "v6 overlap with",
        &mut statuses,
        &mut conflicts,
    );

    let mut seen_vlan: BTreeMap<String, i64> = BTreeMap::new();
    for segment in segments {
        let key = vlan_key(segment, rules);
        match seen_vlan.get(&key) {
            Some(&first_id) => {
                let first = seg_by_id[&first_id];
                add_status(&mut statuses, segment.id, StatusLevel::Conflict, "duplicate VLAN");
                add_status(&mut statuses, first_id, StatusLevel::Conflict, "duplicate VLAN");
                conflicts.push(Conflict::new(
                    ConflictKind::VlanDup,
                    StatusLevel::Conflict,
                    format!(
                        "site={} vrf={} vlan={} duplicated: {}, {}",
                        segment.site, segment.vrf, segment.vlan, first.name, segment.name
                    ),
                ));
            }
            None => {
                seen_vlan.insert(key, segment.id);
            }
        }
    }

    let mut out = BTreeMap::new();
    for segment in segments {
        out.insert(
            segment.id,
            statuses.remove(&segment.id).unwrap_or_default(),
        );
    }
    (out, conflicts)
}

/// All-pairs overlap check within each (site, VRF) group, one family at a
/// time. Groups are visited in sorted key order so runs are repeatable.
fn overlap_pass(
    segments: &[Segment],
    prefixes: &BTreeMap<i64, IpNet>,
    seg_by_id: &BTreeMap<i64, &Segment>,
    kind: ConflictKind,
    label: &str,
    statuses: &mut BTreeMap<i64, SegmentStatus>,
    conflicts: &mut Vec<Conflict>,
) {
    let mut groups: BTreeMap<(String, String), Vec<i64>> = BTreeMap::new();
    for segment in segments {
        if !prefixes.contains_key(&segment.id) {
            continue;
        }
        groups
            .entry((segment.site.clone(), segment.vrf.clone()))
            .or_default()
            .push(segment.id);
    }
    for ((site, vrf), ids) in &groups {
        for i in 0..ids.len() {
            for j in (i + 1)..ids.len() {
                let (a, b) = (ids[i], ids[j]);
                let (p1, p2) = (&prefixes[&a], &prefixes[&b]);
                if prefix::overlaps(p1, p2) {
                    let (s1, s2) = (seg_by_id[&a], seg_by_id[&b]);
                    add_status(
                        statuses,
                        a,
                        StatusLevel::Conflict,
                        &format!("{label} {}", s2.name),
                    );
                    add_status(
                        statuses,
                        b,
                        StatusLevel::Conflict,
                        &format!("{label} {}", s1.name),
                    );
                    conflicts.push(Conflict::new(
                        kind,
                        StatusLevel::Conflict,
                        format!(
                            "site={site} vrf={vrf}: {} {p1} overlaps {} {p2}",
                            s1.name, s2.name
                        ),
                    ));
                }
            }
        }
    }
}

/// Full analysis pass: correctness checks plus efficiency hints, with
/// reserved-range parse warnings leading the conflict list.
pub fn analyze_all(
    segments: &[Segment],
    pools: &[Pool],
    sites: &[Site],
    rules: &Rules,
) -> (BTreeMap<i64, SegmentStatus>, Vec<Conflict>) {
    let rules = rules.normalize();
    let (pools_v4, pools_v6) = build_pool_index(pools);
    let (reserved_v4, reserved_v6, reserved_conflicts) = build_reserved_index(sites);
    let (statuses, seg_conflicts) = analyze_segments(
        segments,
        &pools_v4,
        &pools_v6,
        &reserved_v4,
        &reserved_v6,
        &rules,
    );
    let hints = efficiency::analyze_efficiency(
        segments,
        &pools_v4,
        &pools_v6,
        &reserved_v4,
        &reserved_v6,
        &rules,
    );

    let mut conflicts = reserved_conflicts;
    conflicts.reserve(seg_conflicts.len() + hints.len());
    conflicts.extend(seg_conflicts);
    conflicts.extend(hints);

    let worst = statuses.values().map(|s| s.level).max().unwrap_or_default();
    log::info!(
        "analyzed {} segments: {} conflicts, worst level {}",
        segments.len(),
        conflicts.len(),
        worst.label()
    );
    (statuses, conflicts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(id: i64, name: &str, reserved: Option<&str>) -> Site {
        Site {
            id,
            name: name.to_string(),
            reserved_ranges: reserved.map(str::to_string),
        }
    }

    fn pool(cidr: &str) -> Pool {
        Pool {
            id: 1,
            site_id: 1,
            site: "SAI".to_string(),
            cidr: cidr.to_string(),
            family: "ipv4".to_string(),
            tier: None,
            priority: 0,
        }
    }

    fn locked_segment(id: i64, name: &str, vrf: &str, vlan: u16, cidr: &str) -> Segment {
        Segment {
            id,
            site_id: 1,
            site: "SAI".to_string(),
            vrf: vrf.to_string(),
            vlan,
            name: name.to_string(),
            prefix: Some(26),
            cidr: Some(cidr.to_string()),
            locked: true,
            ..Segment::default()
        }
    }

    #[test]
    fn test_clean_segments_report_ok() {
        let sites = vec![site(1, "SAI", None)];
        let pools = vec![pool("10.30.0.0/24")];
        let segments = vec![
            locked_segment(1, "users", "PROD", 10, "10.30.0.0/26"),
            locked_segment(2, "voice", "PROD", 11, "10.30.0.64/26"),
        ];
        let (statuses, conflicts) = analyze_all(&segments, &pools, &sites, &Rules::default());
        assert!(
            conflicts.iter().all(|c| c.level == StatusLevel::Warning),
            "only efficiency hints expected: {conflicts:?}"
        );
        assert_eq!(statuses[&1].level, StatusLevel::Ok);
        assert_eq!(statuses[&2].level, StatusLevel::Ok);
    }

    #[test]
    fn test_vlan_dup_under_site_scope() {
        let sites = vec![site(1, "R1", None)];
        let pools = vec![pool("10.20.0.0/24")];
        let segments = vec![
            locked_segment(1, "seg-a", "A", 10, "10.20.0.0/26"),
            locked_segment(2, "seg-b", "B", 10, "10.20.0.64/26"),
        ];

        let rules = Rules {
            vlan_scope: crate::models::VlanScope::Site,
            ..Rules::default()
        };
        let (pools_v4, pools_v6) = build_pool_index(&pools);
        let (statuses, conflicts) = analyze_segments(
            &segments,
            &pools_v4,
            &pools_v6,
            &BTreeMap::new(),
            &BTreeMap::new(),
            &rules,
        );
        let dups: Vec<&Conflict> = conflicts
            .iter()
            .filter(|c| c.kind == ConflictKind::VlanDup)
            .collect();
        assert_eq!(dups.len(), 1, "exactly one VLAN_DUP: {conflicts:?}");
        assert!(dups[0].detail.contains("seg-a") && dups[0].detail.contains("seg-b"));
        assert_eq!(statuses[&1].level, StatusLevel::Conflict);
        assert_eq!(statuses[&2].level, StatusLevel::Conflict);

        // default scope keys on VRF too: no duplicate
        let (_, conflicts) = analyze_segments(
            &segments,
            &pools_v4,
            &pools_v6,
            &BTreeMap::new(),
            &BTreeMap::new(),
            &Rules::default(),
        );
        assert!(conflicts.iter().all(|c| c.kind != ConflictKind::VlanDup));
    }

    #[test]
    fn test_reserved_overlap_conflict() {
        let sites = vec![site(1, "RES", Some("10.60.0.0/28"))];
        let pools = vec![pool("10.60.0.0/24")];
        let segments = vec![locked_segment(1, "bad", "PROD", 10, "10.60.0.0/28")];
        let (statuses, conflicts) = analyze_all(&segments, &pools, &sites, &Rules::default());
        let hits: Vec<&Conflict> = conflicts
            .iter()
            .filter(|c| c.kind == ConflictKind::ReservedOverlap)
            .collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].level, StatusLevel::Conflict);
        assert_eq!(statuses[&1].level, StatusLevel::Conflict);
    }

    #[test]
    fn test_overlap_within_vrf_group() {
        let pools = vec![pool("10.0.0.0/24")];
        let (pools_v4, _) = build_pool_index(&pools);
        let segments = vec![
            locked_segment(1, "a", "PROD", 10, "10.0.0.0/25"),
            locked_segment(2, "b", "PROD", 11, "10.0.0.64/26"),
            locked_segment(3, "c", "OTHER", 12, "10.0.0.0/25"),
        ];
        let (statuses, conflicts) = analyze_segments(
            &segments,
            &pools_v4,
            &BTreeMap::new(),
            &BTreeMap::new(),
            &BTreeMap::new(),
            &Rules::default(),
        );
        let overlaps: Vec<&Conflict> = conflicts
            .iter()
            .filter(|c| c.kind == ConflictKind::Overlap)
            .collect();
        assert_eq!(overlaps.len(), 1, "different VRFs never overlap-checked");
        assert_eq!(statuses[&1].level, StatusLevel::Conflict);
        assert_eq!(statuses[&2].level, StatusLevel::Conflict);
        assert_eq!(statuses[&3].level, StatusLevel::Ok);
    }

    #[test]
    fn test_parse_failures_and_missing_pool() {
        let sites = vec![site(1, "SAI", Some("10.0.0.0/28, junk/99"))];
        let segments = vec![Segment {
            id: 1,
            site_id: 1,
            site: "SAI".to_string(),
            vrf: "PROD".to_string(),
            vlan: 10,
            name: "broken".to_string(),
            cidr: Some("300.1.2.3/24".to_string()),
            ..Segment::default()
        }];

        let (statuses, conflicts) = analyze_all(&segments, &[], &sites, &Rules::default());
        assert_eq!(conflicts[0].kind, ConflictKind::ReservedParse, "parse warning first");
        assert!(conflicts
            .iter()
            .any(|c| c.kind == ConflictKind::CidrParse && c.level == StatusLevel::Conflict));
        assert_eq!(statuses[&1].level, StatusLevel::Conflict);
        assert!(statuses[&1].details.contains(&"invalid CIDR".to_string()));
    }
}
