//! Efficiency hints: free-space gaps, fragmentation scoring, and oversized
//! segments. All hints are warnings; they follow the correctness conflicts
//! in every report.

use std::collections::BTreeMap;

use ipnet::IpNet;

use crate::models::prefix::{self, Family};
use crate::models::{Conflict, ConflictKind, Rules, Segment, StatusLevel};

use super::capacity::{assigned_v4, assigned_v6, format_grouped};
use super::ranges;

/// Hints emitted per pool, in address order.
const GAP_HINT_LIMIT: usize = 3;

/// Percent of free space outside the largest free block, floored and
/// clamped to 0..=100.
pub fn fragmentation_score(total: u128, largest: u128) -> u8 {
    if total == 0 {
        return 0;
    }
    let outside = total.saturating_sub(largest);
    // unit counts stay far below 2^120, so the multiply cannot overflow
    let frag = outside.saturating_mul(100) / total;
    frag.min(100) as u8
}

fn percent_of(part: u128, whole: u128) -> i64 {
    if whole == 0 {
        return 0;
    }
    let pct = (part as f64 / whole as f64 * 100.0) as i64;
    pct.clamp(0, 100)
}

/// Scan every pool for gaps and every sized segment for waste.
///
/// Used space here is every assigned CIDR plus reserved ranges, not the
/// allocator's locked-only set; the report must reflect current reality.
pub fn analyze_efficiency(
    segments: &[Segment],
    pools_v4: &BTreeMap<i64, Vec<IpNet>>,
    pools_v6: &BTreeMap<i64, Vec<IpNet>>,
    reserved_v4: &BTreeMap<i64, Vec<IpNet>>,
    reserved_v6: &BTreeMap<i64, Vec<IpNet>>,
    rules: &Rules,
) -> Vec<Conflict> {
    let mut out = Vec::new();

    let mut segments_by_site: BTreeMap<i64, Vec<&Segment>> = BTreeMap::new();
    for segment in segments {
        segments_by_site
            .entry(segment.site_id)
            .or_default()
            .push(segment);
    }
    let no_segments: Vec<&Segment> = Vec::new();
    let no_reserved: Vec<IpNet> = Vec::new();

    for (site_id, pools) in pools_v4 {
        let site_segments = segments_by_site.get(site_id).unwrap_or(&no_segments);
        let reserved = reserved_v4.get(site_id).unwrap_or(&no_reserved);
        for pool in pools {
            let mut used_prefixes = assigned_v4(site_segments);
            used_prefixes.extend_from_slice(reserved);
            let used = ranges::build_used_ranges(pool, &used_prefixes);
            let gaps = ranges::free_ranges(pool, &used);
            if gaps.is_empty() {
                continue;
            }
            let total_free = ranges::sum_ranges(&gaps);
            let largest = gaps.iter().map(|g| g.size()).max().unwrap_or(0);
            out.push(Conflict::new(
                ConflictKind::PoolFragmentation,
                StatusLevel::Warning,
                format!(
                    "pool {pool}: free {total_free} addrs, gaps={}, fragmentation={}%",
                    gaps.len(),
                    fragmentation_score(total_free, largest)
                ),
            ));
            let mut limit = GAP_HINT_LIMIT;
            'gaps: for gap in &gaps {
                for block in ranges::range_to_blocks(*gap, Family::V4) {
                    if limit == 0 {
                        break 'gaps;
                    }
                    out.push(Conflict::new(
                        ConflictKind::PoolGap,
                        StatusLevel::Warning,
                        format!("pool {pool} free block {block}"),
                    ));
                    limit -= 1;
                }
            }
        }
    }

    for (site_id, pools) in pools_v6 {
        let site_segments = segments_by_site.get(site_id).unwrap_or(&no_segments);
        let reserved = reserved_v6.get(site_id).unwrap_or(&no_reserved);
        for pool in pools {
            let mut used_prefixes = assigned_v6(site_segments);
            used_prefixes.extend_from_slice(reserved);
            let used = ranges::build_used_ranges(pool, &used_prefixes);
            let gaps = ranges::free_ranges(pool, &used);
            if gaps.is_empty() {
                continue;
            }
            // v6 free space is measured in unit blocks, /64 by default but
            // never finer than the pool itself
            let unit_len = pool.prefix_len().max(64);
            let unit_size = 1u128 << (128 - u32::from(unit_len)).min(127);
            let total_free = ranges::sum_ranges(&gaps);
            let largest = gaps.iter().map(|g| g.size()).max().unwrap_or(0);
            let total_units = total_free / unit_size;
            let largest_units = largest / unit_size;
            out.push(Conflict::new(
                ConflictKind::PoolFragmentationV6,
                StatusLevel::Warning,
                format!(
                    "pool {pool}: free {} /{unit_len} blocks, gaps={}, fragmentation={}%",
                    format_grouped(total_units),
                    gaps.len(),
                    fragmentation_score(total_units, largest_units)
                ),
            ));
            let mut limit = GAP_HINT_LIMIT;
            for gap in &gaps {
                if limit == 0 {
                    break;
                }
                for block in ranges::range_unit_blocks(*gap, unit_len, Family::V6, limit) {
                    out.push(Conflict::new(
                        ConflictKind::PoolGapV6,
                        StatusLevel::Warning,
                        format!("pool {pool} free block {block}"),
                    ));
                    limit -= 1;
                }
            }
        }
    }

    for segment in segments {
        let (Some(hosts), Some(raw)) = (segment.hosts, segment.cidr.as_deref()) else {
            continue;
        };
        let Ok(net) = prefix::parse_cidr(raw) else {
            continue;
        };
        if Family::of(&net) != Family::V4 {
            continue;
        }
        let required = prefix::hosts_to_prefix_v4(hosts);
        if net.prefix_len() >= required {
            continue;
        }
        let actual_size = 1u64 << (32 - net.prefix_len());
        let required_size = 1u64 << (32 - required);
        let unused_pct = ((actual_size - required_size) * 100 / actual_size) as i64;
        if unused_pct >= rules.oversize_threshold {
            out.push(Conflict::new(
                ConflictKind::Oversized,
                StatusLevel::Warning,
                format!(
                    "segment {} site={} {net} exceeds hosts by {unused_pct}% (need /{required})",
                    segment.name, segment.site
                ),
            ));
        }
    }

    for segment in segments {
        let (Some(requested), Some(raw)) = (segment.prefix_v6, segment.cidr_v6.as_deref()) else {
            continue;
        };
        let Ok(net) = prefix::parse_cidr(raw) else {
            continue;
        };
        if Family::of(&net) != Family::V6 {
            continue;
        }
        if !(1..=128).contains(&requested) {
            continue;
        }
        let requested = requested as u8;
        if net.prefix_len() >= requested {
            continue;
        }
        let actual_size = prefix::prefix_size(&net);
        let requested_size = 1u128 << (128 - u32::from(requested)).min(127);
        let unused_pct = percent_of(actual_size - requested_size, actual_size);
        if unused_pct >= rules.oversize_threshold {
            out.push(Conflict::new(
                ConflictKind::OversizedV6,
                StatusLevel::Warning,
                format!(
                    "segment {} site={} {net} exceeds v6 request by {unused_pct}% (need /{requested})",
                    segment.name, segment.site
                ),
            ));
        }
    }

    out
}
