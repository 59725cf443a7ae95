//! Project policy rules carried through allocation and analysis.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::entities::Segment;

/// Scope within which VLAN numbers must be unique.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VlanScope {
    /// Unique per (site, VRF).
    #[default]
    SiteVrf,
    /// Unique per site regardless of VRF.
    Site,
    /// Unique across the whole project.
    Global,
}

impl VlanScope {
    pub fn as_str(self) -> &'static str {
        match self {
            VlanScope::SiteVrf => "site_vrf",
            VlanScope::Site => "site",
            VlanScope::Global => "global",
        }
    }

    /// Unknown labels normalize to the default scope.
    pub fn from_label(raw: &str) -> VlanScope {
        match raw.trim().to_lowercase().as_str() {
            "site" => VlanScope::Site,
            "global" => VlanScope::Global,
            _ => VlanScope::SiteVrf,
        }
    }
}

/// Pool-selection strategy used by the allocator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PoolStrategy {
    /// First fit across pools in catalog order.
    #[default]
    Spillover,
    /// Fill each pool before moving to the next.
    Contiguous,
    /// Spillover restricted to tier-matching pools.
    Tiered,
}

impl PoolStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            PoolStrategy::Spillover => "spillover",
            PoolStrategy::Contiguous => "contiguous",
            PoolStrategy::Tiered => "tiered",
        }
    }

    /// Unknown labels normalize to spillover.
    pub fn from_label(raw: &str) -> PoolStrategy {
        match raw.trim().to_lowercase().as_str() {
            "contiguous" => PoolStrategy::Contiguous,
            "tiered" => PoolStrategy::Tiered,
            _ => PoolStrategy::Spillover,
        }
    }
}

impl Serialize for VlanScope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for VlanScope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<VlanScope, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(VlanScope::from_label(&raw))
    }
}

impl Serialize for PoolStrategy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PoolStrategy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<PoolStrategy, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(PoolStrategy::from_label(&raw))
    }
}

/// Policy knobs for one project. Value-copied into each operation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct Rules {
    pub vlan_scope: VlanScope,
    pub require_in_pool: bool,
    pub allow_reserved_overlap: bool,
    /// Percent of wasted space above which a segment counts as oversized.
    pub oversize_threshold: i64,
    pub pool_strategy: PoolStrategy,
    pub pool_tier_fallback: bool,
}

impl Default for Rules {
    fn default() -> Rules {
        Rules {
            vlan_scope: VlanScope::SiteVrf,
            require_in_pool: true,
            allow_reserved_overlap: false,
            oversize_threshold: 50,
            pool_strategy: PoolStrategy::Spillover,
            pool_tier_fallback: true,
        }
    }
}

impl Rules {
    /// Clamp the oversize threshold into its valid band.
    pub fn normalize(mut self) -> Rules {
        if self.oversize_threshold <= 0 {
            self.oversize_threshold = 50;
        }
        if self.oversize_threshold > 95 {
            self.oversize_threshold = 95;
        }
        self
    }

    /// Look up a named preset (case-insensitive, trimmed).
    pub fn preset(name: &str) -> Option<Rules> {
        match name.trim().to_lowercase().as_str() {
            "strict" => Some(Rules {
                vlan_scope: VlanScope::Site,
                ..Rules::default()
            }),
            "balanced" => Some(Rules::default()),
            "legacy" => Some(Rules {
                vlan_scope: VlanScope::SiteVrf,
                require_in_pool: false,
                allow_reserved_overlap: true,
                oversize_threshold: 70,
                pool_strategy: PoolStrategy::Spillover,
                pool_tier_fallback: true,
            }),
            _ => None,
        }
    }
}

/// Key under which a segment's VLAN must be unique, per the rules' scope.
pub fn vlan_key(segment: &Segment, rules: &Rules) -> String {
    match rules.vlan_scope {
        VlanScope::Global => segment.vlan.to_string(),
        VlanScope::Site => format!("{}|{}", segment.site, segment.vlan),
        VlanScope::SiteVrf => format!("{}|{}|{}", segment.site, segment.vrf, segment.vlan),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_clamps_threshold() {
        let low = Rules {
            oversize_threshold: 0,
            ..Rules::default()
        };
        assert_eq!(low.normalize().oversize_threshold, 50);

        let high = Rules {
            oversize_threshold: 99,
            ..Rules::default()
        };
        assert_eq!(high.normalize().oversize_threshold, 95);
    }

    #[test]
    fn test_unknown_labels_normalize() {
        assert_eq!(VlanScope::from_label("per-port"), VlanScope::SiteVrf);
        assert_eq!(VlanScope::from_label(" Site "), VlanScope::Site);
        assert_eq!(PoolStrategy::from_label("best-fit"), PoolStrategy::Spillover);
        assert_eq!(PoolStrategy::from_label("TIERED"), PoolStrategy::Tiered);
    }

    #[test]
    fn test_presets() {
        let strict = Rules::preset("Strict").expect("strict preset");
        assert_eq!(strict.vlan_scope, VlanScope::Site);
        assert!(strict.require_in_pool);

        let legacy = Rules::preset("legacy").expect("legacy preset");
        assert!(!legacy.require_in_pool);
        assert!(legacy.allow_reserved_overlap);
        assert_eq!(legacy.oversize_threshold, 70);

        assert!(Rules::preset("custom").is_none());
    }

    #[test]
    fn test_rules_deserialize_defaults() {
        let rules: Rules = serde_json::from_str(r#"{"vlan_scope":"mystery"}"#)
            .expect("rules should deserialize");
        assert_eq!(rules.vlan_scope, VlanScope::SiteVrf);
        assert!(rules.require_in_pool, "missing fields take defaults");
    }

    #[test]
    fn test_vlan_key_scopes() {
        let segment = Segment {
            site: "SAI".to_string(),
            vrf: "PROD".to_string(),
            vlan: 10,
            ..Segment::default()
        };
        let mut rules = Rules::default();
        assert_eq!(vlan_key(&segment, &rules), "SAI|PROD|10");
        rules.vlan_scope = VlanScope::Site;
        assert_eq!(vlan_key(&segment, &rules), "SAI|10");
        rules.vlan_scope = VlanScope::Global;
        assert_eq!(vlan_key(&segment, &rules), "10");
    }
}
