// cargo watch -x 'fmt' -x 'test'

pub mod models;
pub mod output;
pub mod planner;
pub mod snapshot;

use std::collections::BTreeMap;
use std::error::Error;

use models::{Conflict, Plan, Pool, Rules, Segment, SegmentStatus, Site};
pub use planner::{CapacityReport, PrefixDetails, SegmentView, WhatIfResult};
pub use snapshot::{load_snapshot, save_snapshot, Snapshot};

/// Strict allocation over every site and family of a project snapshot.
///
/// Returns the complete `{segment id -> prefix}` plan, or the first
/// allocation failure as an error with nothing from the failed family kept.
pub fn allocate_project(
    segments: &[Segment],
    pools: &[Pool],
    sites: &[Site],
    rules: &Rules,
) -> Result<Plan, Box<dyn Error>> {
    planner::allocate_project(segments, pools, sites, rules)
}

/// Pure analysis pass: per-segment statuses plus the typed conflict list,
/// efficiency hints included.
pub fn analyze(
    segments: &[Segment],
    pools: &[Pool],
    sites: &[Site],
    rules: &Rules,
) -> (BTreeMap<i64, SegmentStatus>, Vec<Conflict>) {
    planner::analyze_all(segments, pools, sites, rules)
}

/// Simulate adding one candidate segment without touching stored state.
pub fn what_if(
    existing: &[Segment],
    pools: &[Pool],
    sites: &[Site],
    candidate: &Segment,
    rules: &Rules,
) -> WhatIfResult {
    planner::run_what_if(existing, pools, sites, candidate, rules)
}

/// Per-pool capacity, utilization, and growth forecast.
pub fn capacity_report(
    segments: &[Segment],
    pools: &[Pool],
    sites: &[Site],
    growth_rate: f64,
    months: u32,
    v6_unit: u8,
) -> CapacityReport {
    planner::build_capacity_report(segments, pools, sites, growth_rate, months, v6_unit)
}

/// Decorate segments with computed address details and pool labels.
pub fn build_segment_views(
    segments: &[Segment],
    statuses: &BTreeMap<i64, SegmentStatus>,
    pools: &[Pool],
) -> Vec<SegmentView> {
    planner::build_segment_views(segments, statuses, pools)
}

/// Network/broadcast/mask/usable-range details of an IPv4 prefix.
pub fn prefix_details_v4(net: &ipnet::IpNet) -> Option<PrefixDetails> {
    planner::prefix_details_v4(net)
}
