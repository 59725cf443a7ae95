//! Conflict and status types shared by the allocator, analyzer, and
//! efficiency reporter.

use serde::Serialize;

/// Severity attached to a segment or a conflict entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum StatusLevel {
    #[default]
    Ok,
    Warning,
    Conflict,
}

impl StatusLevel {
    pub fn label(self) -> &'static str {
        match self {
            StatusLevel::Ok => "OK",
            StatusLevel::Warning => "Warning",
            StatusLevel::Conflict => "Conflict",
        }
    }

    /// CSS-ish class used by report rendering.
    pub fn class(self) -> &'static str {
        match self {
            StatusLevel::Ok => "success",
            StatusLevel::Warning => "warning",
            StatusLevel::Conflict => "danger",
        }
    }
}

impl std::fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Classification of a conflict entry. The string forms are stable and
/// load-bearing for logs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConflictKind {
    AllocateFail,
    PoolMissing,
    SizeMissing,
    LockedNoCidr,
    CidrParse,
    Cidr6Parse,
    OutOfPool,
    OutOfPoolV6,
    ReservedOverlap,
    ReservedOverlapV6,
    ReservedParse,
    Overlap,
    OverlapV6,
    VlanDup,
    PoolFragmentation,
    PoolFragmentationV6,
    PoolGap,
    PoolGapV6,
    Oversized,
    OversizedV6,
    WhatIfError,
}

impl ConflictKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ConflictKind::AllocateFail => "ALLOCATE_FAIL",
            ConflictKind::PoolMissing => "POOL_MISSING",
            ConflictKind::SizeMissing => "SIZE_MISSING",
            ConflictKind::LockedNoCidr => "LOCKED_NO_CIDR",
            ConflictKind::CidrParse => "CIDR_PARSE",
            ConflictKind::Cidr6Parse => "CIDR6_PARSE",
            ConflictKind::OutOfPool => "OUT_OF_POOL",
            ConflictKind::OutOfPoolV6 => "OUT_OF_POOL_V6",
            ConflictKind::ReservedOverlap => "RESERVED_OVERLAP",
            ConflictKind::ReservedOverlapV6 => "RESERVED_OVERLAP_V6",
            ConflictKind::ReservedParse => "RESERVED_PARSE",
            ConflictKind::Overlap => "OVERLAP",
            ConflictKind::OverlapV6 => "OVERLAP_V6",
            ConflictKind::VlanDup => "VLAN_DUP",
            ConflictKind::PoolFragmentation => "POOL_FRAGMENTATION",
            ConflictKind::PoolFragmentationV6 => "POOL_FRAGMENTATION_V6",
            ConflictKind::PoolGap => "POOL_GAP",
            ConflictKind::PoolGapV6 => "POOL_GAP_V6",
            ConflictKind::Oversized => "OVERSIZED",
            ConflictKind::OversizedV6 => "OVERSIZED_V6",
            ConflictKind::WhatIfError => "WHATIF_ERROR",
        }
    }
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finding emitted by the allocator, analyzer, or efficiency reporter.
#[derive(Debug, Clone, Serialize)]
pub struct Conflict {
    pub kind: ConflictKind,
    pub detail: String,
    pub level: StatusLevel,
}

impl Conflict {
    pub fn new(kind: ConflictKind, level: StatusLevel, detail: String) -> Conflict {
        Conflict {
            kind,
            detail,
            level,
        }
    }
}

/// Aggregated per-segment analysis status: the highest level seen plus
/// every detail string in emission order.
#[derive(Debug, Clone, Default)]
pub struct SegmentStatus {
    pub level: StatusLevel,
    pub details: Vec<String>,
}

impl SegmentStatus {
    pub fn add(&mut self, level: StatusLevel, detail: &str) {
        if level > self.level {
            self.level = level;
        }
        if !detail.is_empty() {
            self.details.push(detail.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(StatusLevel::Ok < StatusLevel::Warning);
        assert!(StatusLevel::Warning < StatusLevel::Conflict);
        assert_eq!(StatusLevel::default(), StatusLevel::Ok);
    }

    #[test]
    fn test_status_keeps_highest_level() {
        let mut status = SegmentStatus::default();
        status.add(StatusLevel::Conflict, "overlap with voice");
        status.add(StatusLevel::Warning, "not allocated");
        assert_eq!(status.level, StatusLevel::Conflict);
        assert_eq!(status.details, vec!["overlap with voice", "not allocated"]);
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(ConflictKind::AllocateFail.as_str(), "ALLOCATE_FAIL");
        assert_eq!(ConflictKind::VlanDup.as_str(), "VLAN_DUP");
        assert_eq!(ConflictKind::PoolFragmentationV6.to_string(), "POOL_FRAGMENTATION_V6");
    }
}
