//! Capacity reporting: per-pool totals, utilization, growth forecasting,
//! and IPv6 unit accounting.

use std::collections::BTreeMap;

use ipnet::IpNet;

use crate::models::prefix::{self, Family};
use crate::models::{Pool, Segment, Site};

use super::analyzer;
use super::ranges;

/// Capacity of one pool, pre-formatted for reporting.
#[derive(Debug, Clone)]
pub struct CapacityPool {
    pub site: String,
    pub family: String,
    pub tier: String,
    pub priority: i64,
    pub cidr: String,
    pub total: String,
    pub used: String,
    pub free: String,
    pub utilization: String,
    /// IPv6 only: `used/total free n (/unit)`.
    pub units: String,
    pub forecast: String,
}

#[derive(Debug, Clone, Default)]
pub struct CapacitySummary {
    pub total: String,
    pub used: String,
    pub free: String,
    pub utilization: String,
}

#[derive(Debug, Clone)]
pub struct CapacityReport {
    pub pools: Vec<CapacityPool>,
    pub summary_v4: CapacitySummary,
    pub summary_v6: CapacitySummary,
    pub growth_rate: f64,
    pub months: u32,
    pub v6_unit: u8,
}

/// Every assigned v4 CIDR in the segment set; unparsable entries are the
/// analyzer's concern, not capacity's.
pub(super) fn assigned_v4(segments: &[&Segment]) -> Vec<IpNet> {
    segments
        .iter()
        .filter_map(|s| s.cidr.as_deref())
        .filter_map(|raw| prefix::parse_cidr(raw).ok())
        .filter(|net| Family::of(net) == Family::V4)
        .collect()
}

pub(super) fn assigned_v6(segments: &[&Segment]) -> Vec<IpNet> {
    segments
        .iter()
        .filter_map(|s| s.cidr_v6.as_deref())
        .filter_map(|raw| prefix::parse_cidr(raw).ok())
        .filter(|net| Family::of(net) == Family::V6)
        .collect()
}

/// Group an integer with `_` every three digits, e.g. `4_294_967_296`.
pub fn format_grouped(value: u128) -> String {
    let digits = value.to_string();
    if digits.len() <= 3 {
        return digits;
    }
    let bytes = digits.as_bytes();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let lead = digits.len() % 3;
    for (i, b) in bytes.iter().enumerate() {
        if i != 0 && (i + 3 - lead) % 3 == 0 {
            out.push('_');
        }
        out.push(*b as char);
    }
    out
}

fn ratio_percent(used: u128, total: u128) -> String {
    if total == 0 {
        return "0%".to_string();
    }
    let ratio = (used as f64 / total as f64).max(0.0);
    format!("{:.1}%", ratio * 100.0)
}

/// `"{months}m: {pct}% used"` with an exhaustion estimate when finite;
/// `"n/a"` when there is no growth or no usage to project from.
fn forecast_summary(used: u128, total: u128, rate: f64, months: u32) -> String {
    if rate <= 0.0 || total == 0 {
        return "n/a".to_string();
    }
    let current = used as f64 / total as f64;
    if current <= 0.0 {
        return "n/a".to_string();
    }
    let growth = (1.0 + rate / 100.0).powi(months as i32);
    let future = (current * growth).min(1.0);
    let exhaust = (1.0 / current).ln() / (1.0 + rate / 100.0).ln();
    if exhaust.is_nan() || exhaust.is_infinite() {
        return format!("{months}m: {:.1}% used", future * 100.0);
    }
    format!(
        "{months}m: {:.1}% used, exhaust ~{exhaust:.0}m",
        future * 100.0
    )
}

fn div_ceil(a: u128, b: u128) -> u128 {
    if b == 0 {
        return 0;
    }
    a / b + u128::from(a % b != 0)
}

/// IPv6 unit accounting line; empty when the unit is invalid or finer
/// than the pool itself.
fn format_units(total: u128, used: u128, unit_len: u8, pool_bits: u8) -> String {
    if unit_len == 0 || unit_len > 128 || unit_len < pool_bits {
        return String::new();
    }
    let unit_size = 1u128 << (128 - u32::from(unit_len)).min(127);
    let units_total = total / unit_size;
    if units_total == 0 {
        return String::new();
    }
    let units_used = div_ceil(used, unit_size);
    let units_free = units_total.saturating_sub(units_used);
    format!(
        "{}/{} free {} (/{unit_len})",
        format_grouped(units_used),
        format_grouped(units_total),
        format_grouped(units_free)
    )
}

fn summary(used: u128, total: u128) -> CapacitySummary {
    if total == 0 {
        return CapacitySummary {
            total: "0".to_string(),
            used: "0".to_string(),
            free: "0".to_string(),
            utilization: "0%".to_string(),
        };
    }
    CapacitySummary {
        total: format_grouped(total),
        used: format_grouped(used),
        free: format_grouped(total.saturating_sub(used)),
        utilization: ratio_percent(used, total),
    }
}

/// Aggregate capacity across every pool in the snapshot.
///
/// Used space counts every assigned segment of the pool's family plus the
/// site's reserved ranges, clipped to the pool.
pub fn build_capacity_report(
    segments: &[Segment],
    pools: &[Pool],
    sites: &[Site],
    growth_rate: f64,
    months: u32,
    v6_unit: u8,
) -> CapacityReport {
    let (reserved_v4, reserved_v6, _) = analyzer::build_reserved_index(sites);
    let mut segments_by_site: BTreeMap<i64, Vec<&Segment>> = BTreeMap::new();
    for segment in segments {
        segments_by_site
            .entry(segment.site_id)
            .or_default()
            .push(segment);
    }
    let no_segments: Vec<&Segment> = Vec::new();
    let no_reserved: Vec<IpNet> = Vec::new();

    let mut report_pools = Vec::with_capacity(pools.len());
    let (mut sum_v4_total, mut sum_v4_used) = (0u128, 0u128);
    let (mut sum_v6_total, mut sum_v6_used) = (0u128, 0u128);

    for pool in pools {
        let Ok(net) = prefix::parse_cidr(&pool.cidr) else {
            continue;
        };
        let family = Family::normalize(&pool.family);
        if Family::of(&net) != family {
            continue;
        }
        let site_segments = segments_by_site.get(&pool.site_id).unwrap_or(&no_segments);

        let total = prefix::prefix_size(&net);
        let mut units = String::new();
        let used = match family {
            Family::V4 => {
                let mut prefixes = assigned_v4(site_segments);
                prefixes.extend_from_slice(
                    reserved_v4.get(&pool.site_id).unwrap_or(&no_reserved),
                );
                let used =
                    ranges::sum_ranges(&ranges::build_used_ranges(&net, &prefixes));
                sum_v4_total = sum_v4_total.saturating_add(total);
                sum_v4_used = sum_v4_used.saturating_add(used);
                used
            }
            Family::V6 => {
                let mut prefixes = assigned_v6(site_segments);
                prefixes.extend_from_slice(
                    reserved_v6.get(&pool.site_id).unwrap_or(&no_reserved),
                );
                let used =
                    ranges::sum_ranges(&ranges::build_used_ranges(&net, &prefixes));
                sum_v6_total = sum_v6_total.saturating_add(total);
                sum_v6_used = sum_v6_used.saturating_add(used);
                units = format_units(total, used, v6_unit, net.prefix_len());
                used
            }
        };

        report_pools.push(CapacityPool {
            site: pool.site.clone(),
            family: family.as_str().to_string(),
            tier: super::catalog::pool_tier_value(pool),
            priority: pool.priority,
            cidr: net.to_string(),
            total: format_grouped(total),
            used: format_grouped(used),
            free: format_grouped(total.saturating_sub(used)),
            utilization: ratio_percent(used, total),
            units,
            forecast: forecast_summary(used, total, growth_rate, months),
        });
    }

    report_pools.sort_by(|a, b| {
        a.site
            .cmp(&b.site)
            .then_with(|| a.family.cmp(&b.family))
            .then_with(|| a.priority.cmp(&b.priority))
            .then_with(|| a.cidr.cmp(&b.cidr))
    });

    CapacityReport {
        pools: report_pools,
        summary_v4: summary(sum_v4_used, sum_v4_total),
        summary_v6: summary(sum_v6_used, sum_v6_total),
        growth_rate,
        months,
        v6_unit,
    }
}
