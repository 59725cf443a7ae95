//! What-if planning: re-run the allocator over the existing segments plus
//! one candidate, then diff the outcome against the current assignments.
//! Persistent state is never touched.

use std::collections::BTreeMap;

use ipnet::IpNet;

use crate::models::{Conflict, ConflictKind, Pool, Rules, Segment, Site, StatusLevel};

use super::{allocator, analyzer};

/// One segment whose assignment would change under the candidate plan.
#[derive(Debug, Clone, Default)]
pub struct PlanChange {
    pub site: String,
    pub vrf: String,
    pub vlan: u16,
    pub name: String,
    pub old_cidr: String,
    pub new_cidr: String,
    pub old_cidr_v6: String,
    pub new_cidr_v6: String,
    /// "moved" or "unallocated".
    pub status: String,
    pub status_v6: String,
}

#[derive(Debug, Clone, Default)]
pub struct WhatIfResult {
    pub segment: Segment,
    pub proposed_cidr: String,
    pub proposed_cidr_v6: String,
    pub changes: Vec<PlanChange>,
    pub unallocated: Vec<PlanChange>,
    pub conflicts: Vec<Conflict>,
    pub summary: String,
}

/// Normalize and validate the candidate. Returns the cleaned segment or a
/// human-readable reason.
fn sanitize_candidate(candidate: &Segment, sites: &[Site]) -> Result<Segment, String> {
    let mut out = candidate.clone();
    out.id = 0;
    out.locked = false;
    out.cidr = None;
    out.cidr_v6 = None;
    out.vrf = out.vrf.trim().to_string();
    out.name = out.name.trim().to_string();

    if out.site_id <= 0 || out.vrf.is_empty() || out.vlan == 0 || out.name.is_empty() {
        return Err("what-if: site, vrf, vlan, and name are required".to_string());
    }
    match sites.iter().find(|s| s.id == out.site_id) {
        Some(site) => out.site = site.name.clone(),
        None => return Err("what-if: invalid site".to_string()),
    }

    // out-of-band values count as absent
    out.hosts = out.hosts.filter(|&h| h > 0);
    out.prefix = out.prefix.filter(|&p| (1..=32).contains(&p));
    out.prefix_v6 = out.prefix_v6.filter(|&p| (1..=128).contains(&p));
    if out.hosts.is_none() && out.prefix.is_none() && out.prefix_v6.is_none() {
        return Err("what-if: hosts or prefix required".to_string());
    }
    Ok(out)
}

fn plan_cidr(plan: &BTreeMap<i64, IpNet>, id: i64) -> String {
    plan.get(&id).map(|n| n.to_string()).unwrap_or_default()
}

/// Overwrite every segment's assignments with the plan's view of them;
/// segments absent from the plan come back unassigned.
fn apply_plan(
    segments: &[Segment],
    plan_v4: &BTreeMap<i64, IpNet>,
    plan_v6: &BTreeMap<i64, IpNet>,
) -> Vec<Segment> {
    segments
        .iter()
        .map(|segment| {
            let mut out = segment.clone();
            out.cidr = plan_v4.get(&segment.id).map(|n| n.to_string());
            out.cidr_v6 = plan_v6.get(&segment.id).map(|n| n.to_string());
            out
        })
        .collect()
}

/// Run the non-mutating what-if plan for one candidate segment.
pub fn run_what_if(
    existing: &[Segment],
    pools: &[Pool],
    sites: &[Site],
    candidate: &Segment,
    rules: &Rules,
) -> WhatIfResult {
    let rules = rules.normalize();
    let candidate = match sanitize_candidate(candidate, sites) {
        Ok(c) => c,
        Err(reason) => {
            return WhatIfResult {
                segment: candidate.clone(),
                summary: "changes: 0, unallocated: 0".to_string(),
                conflicts: vec![Conflict::new(
                    ConflictKind::WhatIfError,
                    StatusLevel::Conflict,
                    reason,
                )],
                ..WhatIfResult::default()
            };
        }
    };

    let mut working: Vec<Segment> = existing.to_vec();
    working.push(candidate.clone());

    let (reserved_v4, reserved_v6, _) = analyzer::build_reserved_index(sites);
    let (plan_v4, plan_v6, plan_conflicts) =
        allocator::plan_allocations(&working, pools, &reserved_v4, &reserved_v6, &rules);

    let planned = apply_plan(&working, &plan_v4, &plan_v6);
    let (_, analyzer_conflicts) = analyzer::analyze_all(&planned, pools, sites, &rules);

    let mut result = WhatIfResult {
        proposed_cidr: plan_cidr(&plan_v4, candidate.id),
        proposed_cidr_v6: plan_cidr(&plan_v6, candidate.id),
        segment: candidate,
        ..WhatIfResult::default()
    };
    result.conflicts = plan_conflicts;
    result.conflicts.extend(analyzer_conflicts);

    for segment in existing {
        let old_cidr = segment.cidr.clone().unwrap_or_default();
        let old_cidr_v6 = segment.cidr_v6.clone().unwrap_or_default();
        let new_cidr = plan_cidr(&plan_v4, segment.id);
        let new_cidr_v6 = plan_cidr(&plan_v6, segment.id);
        if new_cidr.is_empty() && old_cidr.is_empty() && new_cidr_v6.is_empty() && old_cidr_v6.is_empty() {
            continue;
        }
        if new_cidr == old_cidr && new_cidr_v6 == old_cidr_v6 {
            continue;
        }
        let mut change = PlanChange {
            site: segment.site.clone(),
            vrf: segment.vrf.clone(),
            vlan: segment.vlan,
            name: segment.name.clone(),
            old_cidr,
            new_cidr,
            old_cidr_v6,
            new_cidr_v6,
            ..PlanChange::default()
        };
        if change.new_cidr.is_empty() && !change.old_cidr.is_empty() {
            change.status = "unallocated".to_string();
            result.unallocated.push(change);
            continue;
        }
        if change.new_cidr_v6.is_empty() && !change.old_cidr_v6.is_empty() {
            change.status_v6 = "unallocated".to_string();
        }
        change.status = "moved".to_string();
        result.changes.push(change);
    }

    result
        .changes
        .sort_by(|a, b| {
            a.site
                .cmp(&b.site)
                .then_with(|| a.vrf.cmp(&b.vrf))
                .then_with(|| a.vlan.cmp(&b.vlan))
        });

    result.summary = format!(
        "changes: {}, unallocated: {}",
        result.changes.len(),
        result.unallocated.len()
    );
    log::debug!("what-if {}: {}", result.segment.name, result.summary);
    result
}
