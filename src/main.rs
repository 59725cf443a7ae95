use std::error::Error;

use subnet_planner::{analyze, build_segment_views, capacity_report, load_snapshot};

fn main() -> Result<(), Box<dyn Error>> {
    // Do as little as possible in main.rs as it can't contain any tests
    log4rs::init_file("log4rs.yml", Default::default()).expect("Error initializing log4rs");
    dotenv::dotenv().ok();

    log::info!("#Start main()");

    let path = std::env::args().nth(1).or_else(|| std::env::var("SUBNET_PLAN").ok());
    let snapshot = load_snapshot(path.as_deref())?;
    let rules = snapshot.rules.normalize();
    log::info!(
        "# rules: vlan_scope={} strategy={} require_in_pool={}",
        rules.vlan_scope.as_str(),
        rules.pool_strategy.as_str(),
        rules.require_in_pool
    );

    let (statuses, conflicts) = analyze(
        &snapshot.segments,
        &snapshot.pools,
        &snapshot.sites,
        &rules,
    );

    let views = build_segment_views(&snapshot.segments, &statuses, &snapshot.pools);
    subnet_planner::output::print_segment_views(&views);
    println!();
    subnet_planner::output::print_conflicts(&conflicts);
    println!();

    let growth_rate = std::env::var("GROWTH_RATE")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(0.0);
    let report = capacity_report(
        &snapshot.segments,
        &snapshot.pools,
        &snapshot.sites,
        growth_rate,
        12,
        64,
    );
    subnet_planner::output::print_capacity(&report);

    log::info!("# End main()");
    Ok(())
}
