//! Terminal output utilities.
//!
//! Report tables are printed as quoted, comma-separated cells so the
//! output pastes cleanly into a spreadsheet while staying readable in a
//! terminal. Cells are left-aligned: CIDRs and kind tags are easiest to
//! scan when they start in the same column.

use colored::Colorize;

use crate::models::{Conflict, StatusLevel};
use crate::planner::{CapacityReport, SegmentView};

// Column widths sized for the usual shapes in this domain: a v4 CIDR is
// at most 18 chars quoted, the longest conflict kind tag is 21, and
// count columns must hold a grouped /48-pool total.
const LEVEL_WIDTH: usize = 11;
const KIND_WIDTH: usize = 23;
const CIDR_WIDTH: usize = 20;
const NAME_WIDTH: usize = 18;
const COUNT_WIDTH: usize = 14;

/// Quote a value and left-pad the cell out to its column width.
fn cell<T: ToString>(value: T, width: usize) -> String {
    let quoted = format!("\"{}\"", value.to_string());
    if quoted.len() >= width {
        quoted
    } else {
        format!("{quoted:<width$}")
    }
}

fn level_colored(level: StatusLevel) -> String {
    match level {
        StatusLevel::Conflict => level.label().red().to_string(),
        StatusLevel::Warning => level.label().yellow().to_string(),
        StatusLevel::Ok => level.label().green().to_string(),
    }
}

/// Print the conflict list, one row per finding.
pub fn print_conflicts(conflicts: &[Conflict]) {
    if conflicts.is_empty() {
        println!("# no conflicts");
        return;
    }
    println!(
        "{level} {kind} {detail}",
        level = cell("level", LEVEL_WIDTH),
        kind = cell("kind", KIND_WIDTH),
        detail = cell("detail", 0),
    );
    for conflict in conflicts {
        println!(
            "{level}, {kind}, {detail}",
            level = cell(level_colored(conflict.level), LEVEL_WIDTH),
            kind = cell(conflict.kind.as_str(), KIND_WIDTH),
            detail = cell(&conflict.detail, 0),
        );
    }
    let worst = conflicts
        .iter()
        .filter(|c| c.level == StatusLevel::Conflict)
        .count();
    println!(
        "# {total} findings, {worst} at {label} level",
        total = conflicts.len(),
        label = "Conflict".red(),
    );
}

/// Print the per-pool capacity table plus the family summaries.
pub fn print_capacity(report: &CapacityReport) {
    println!(
        "{site} {family} {cidr} {total} {used} {free} {util} {forecast}",
        site = cell("site", NAME_WIDTH),
        family = cell("family", 8),
        cidr = cell("cidr", CIDR_WIDTH),
        total = cell("total", COUNT_WIDTH),
        used = cell("used", COUNT_WIDTH),
        free = cell("free", COUNT_WIDTH),
        util = cell("util", 8),
        forecast = cell("forecast", 0),
    );
    for pool in &report.pools {
        println!(
            "{site}, {family}, {cidr}, {total}, {used}, {free}, {util}, {forecast}{units}",
            site = cell(&pool.site, NAME_WIDTH),
            family = cell(&pool.family, 8),
            cidr = cell(&pool.cidr, CIDR_WIDTH),
            total = cell(&pool.total, COUNT_WIDTH),
            used = cell(&pool.used, COUNT_WIDTH),
            free = cell(&pool.free, COUNT_WIDTH),
            util = cell(&pool.utilization, 8),
            forecast = cell(&pool.forecast, 10),
            units = if pool.units.is_empty() {
                String::new()
            } else {
                format!(", {}", cell(&pool.units, 0))
            },
        );
    }
    println!(
        "# v4: {}/{} used ({}), v6: {}/{} used ({})",
        report.summary_v4.used,
        report.summary_v4.total,
        report.summary_v4.utilization,
        report.summary_v6.used,
        report.summary_v6.total,
        report.summary_v6.utilization,
    );
}

/// Print segment views as a quoted CSV-ish table.
pub fn print_segment_views(views: &[SegmentView]) {
    println!(
        "{site} {vrf} {vlan} {name} {request} {cidr} {gateway} {pool} {status}",
        site = cell("site", NAME_WIDTH),
        vrf = cell("vrf", 8),
        vlan = cell("vlan", 6),
        name = cell("name", NAME_WIDTH),
        request = cell("request", 11),
        cidr = cell("cidr", CIDR_WIDTH),
        gateway = cell("gateway", 17),
        pool = cell("pool", CIDR_WIDTH),
        status = cell("status", 0),
    );
    for view in views {
        println!(
            "{site}, {vrf}, {vlan}, {name}, {request}, {cidr}, {gateway}, {pool}, {status}",
            site = cell(&view.segment.site, NAME_WIDTH),
            vrf = cell(&view.segment.vrf, 8),
            vlan = cell(view.segment.vlan, 6),
            name = cell(&view.segment.name, NAME_WIDTH),
            request = cell(&view.request, 11),
            cidr = cell(&view.cidr, CIDR_WIDTH),
            gateway = cell(&view.gateway, 17),
            pool = cell(&view.pool_label, CIDR_WIDTH),
            status = cell(&view.status_label, 0),
        );
    }
}
