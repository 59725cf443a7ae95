//! Planning and analysis logic.
//!
//! This module contains the engine behind every planner operation:
//! - [`ranges`] - used/free integer ranges inside a pool
//! - [`catalog`] - pool ordering and tier pairing
//! - [`allocator`] - VLSM allocation strategies
//! - [`analyzer`] - constraint analysis and conflict classification
//! - [`efficiency`] - gap, fragmentation, and oversize hints
//! - [`whatif`] - non-mutating candidate planning
//! - [`capacity`] - utilization and forecasting
//! - [`views`] - display decoration

pub mod allocator;
pub mod analyzer;
pub mod capacity;
pub mod catalog;
pub mod efficiency;
pub mod ranges;
pub mod views;
pub mod whatif;

// Re-export the entry points callers reach for most.
pub use allocator::{allocate_project, plan_allocations};
pub use analyzer::analyze_all;
pub use capacity::{build_capacity_report, CapacityPool, CapacityReport, CapacitySummary};
pub use views::{build_segment_views, prefix_details_v4, PrefixDetails, SegmentView};
pub use whatif::{run_what_if, PlanChange, WhatIfResult};
