//! Snapshot persistence: the JSON document exchanged with the external
//! store boundary.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;

use crate::models::{Pool, Rules, Segment, Site};

/// One project snapshot: everything the planner operations consume.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Snapshot {
    #[serde(default)]
    pub sites: Vec<Site>,
    #[serde(default)]
    pub pools: Vec<Pool>,
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub rules: Rules,
}

/// Default snapshot filename for today, e.g. `subnet_plan_2026-08-02.json`.
pub fn default_snapshot_file() -> String {
    format!("subnet_plan_{}.json", Utc::now().format("%Y-%m-%d"))
}

/// Read a snapshot from disk.
///
/// # Arguments
/// * `path` - Optional path to a specific snapshot file. If None, uses the
///   dated default name.
pub fn load_snapshot(path: Option<&str>) -> Result<Snapshot, Box<dyn Error>> {
    let path = match path {
        Some(file) => {
            if !Path::new(file).exists() {
                return Err(format!("Snapshot file does not exist: {file}").into());
            }
            log::info!("Using provided snapshot file: {file}");
            file.to_string()
        }
        None => default_snapshot_file(),
    };
    let json = std::fs::read_to_string(&path)
        .map_err(|e| format!("Error reading snapshot file {path}: {e}"))?;
    let mut snapshot: Snapshot =
        serde_json::from_str(&json).map_err(|e| format!("Error parsing snapshot JSON: {e}"))?;
    snapshot.rules = snapshot.rules.normalize();
    log::info!(
        "Loaded snapshot: {} sites, {} pools, {} segments",
        snapshot.sites.len(),
        snapshot.pools.len(),
        snapshot.segments.len()
    );
    Ok(snapshot)
}

/// Write a snapshot to disk as pretty-printed JSON.
pub fn save_snapshot(path: &str, snapshot: &Snapshot) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(snapshot)
        .map_err(|e| format!("Error serializing snapshot: {e}"))?;
    std::fs::write(path, json).map_err(|e| format!("Error writing snapshot {path}: {e}"))?;
    log::info!("Wrote snapshot to {path}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_round_trip() {
        let raw = r#"{
            "sites": [{"id": 1, "name": "SAI", "reserved_ranges": "10.30.0.0/28"}],
            "pools": [{"id": 1, "site_id": 1, "cidr": "10.30.0.0/24", "family": "ipv4"}],
            "segments": [
                {"id": 1, "site_id": 1, "site": "SAI", "vrf": "PROD", "vlan": 10,
                 "name": "users", "hosts": 60}
            ],
            "rules": {"vlan_scope": "site", "oversize_threshold": 200}
        }"#;
        let snapshot: Snapshot = serde_json::from_str(raw).expect("snapshot should parse");
        let snapshot = Snapshot {
            rules: snapshot.rules.normalize(),
            ..snapshot
        };
        assert_eq!(snapshot.sites.len(), 1);
        assert_eq!(snapshot.segments[0].hosts, Some(60));
        assert_eq!(
            snapshot.rules.oversize_threshold, 95,
            "threshold clamps on load"
        );

        let json = serde_json::to_string(&snapshot).expect("snapshot should serialize");
        let again: Snapshot = serde_json::from_str(&json).expect("round trip");
        assert_eq!(again.pools[0].cidr, "10.30.0.0/24");
    }

    #[test]
    fn test_load_snapshot_missing_file() {
        let err = load_snapshot(Some("does-not-exist-anywhere.json"))
            .expect_err("missing file is an error");
        assert!(err.to_string().contains("does not exist"));
    }
}
