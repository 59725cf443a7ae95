//! Report rendering for the CLI driver.
//!
//! This module handles formatting and printing planner results:
//! - [`terminal`] - field formatting and colored report tables

mod terminal;

// Re-export public functions
pub use terminal::{print_capacity, print_conflicts, print_segment_views};
