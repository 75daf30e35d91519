// src/routing/mod.rs
//! Ward and division routing: bounding-box zone lookup, geocoder-hint ward
//! synthesis, and the fixed ward-name → division substring rules. All
//! deterministic; the same coordinates always land in the same ward.

pub mod geocode;
pub mod officers;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

// Re-export convenient types.
pub use crate::routing::geocode::{GeocodeSummary, ReverseGeocoder};
pub use crate::routing::officers::OfficerDirectory;

/// Sentinel ward when neither a rectangle nor a usable hint produced a name.
pub const UNASSIGNED_WARD: &str = "Unassigned";
/// Sentinel division for ward names outside the substring table.
pub const UNMAPPED_DIVISION: &str = "Unmapped";

const ENV_ZONES_PATH: &str = "INTAKE_ZONES_PATH";
const DEFAULT_ZONES_PATH: &str = "config/zones.json";
const DEFAULT_ZONES_JSON: &str = include_str!("../../config/zones.json");

// Ward-name fragments → division. Applies to synthesized hint wards too.
const DIVISION_RULES: &[(&str, &str)] = &[
    ("indiranagar", "East Division"),
    ("halasuru", "East Division"),
    ("koramangala", "South Division"),
    ("jayanagar", "South Division"),
    ("malleshwaram", "West Division"),
    ("rajajinagar", "West Division"),
    ("yelahanka", "North Division"),
    ("hebbal", "North Division"),
    ("whitefield", "Mahadevapura Division"),
    ("mahadevapura", "Mahadevapura Division"),
];

/// One named zone rectangle. Bounds are inclusive.
#[derive(Debug, Clone, Deserialize)]
pub struct Zone {
    pub ward: String,
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl Zone {
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude >= self.min_lat
            && latitude <= self.max_lat
            && longitude >= self.min_lon
            && longitude <= self.max_lon
    }
}

/// Injected, read-only table of zone rectangles. Listed order is the match
/// order, so overlaps resolve deterministically.
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneTable {
    pub zones: Vec<Zone>,
}

impl ZoneTable {
    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).context("parsing zone table json")
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading zone table from {}", path.display()))?;
        Self::from_json(&content)
    }

    /// Load using env var + fallbacks:
    /// 1) $INTAKE_ZONES_PATH
    /// 2) config/zones.json
    /// 3) the embedded default table
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_ZONES_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("INTAKE_ZONES_PATH points to non-existent path"));
        }
        let default_p = PathBuf::from(DEFAULT_ZONES_PATH);
        if default_p.exists() {
            return Self::load_from(&default_p);
        }
        Ok(Self::embedded())
    }

    /// Built-in table shipped with the binary.
    pub fn embedded() -> Self {
        serde_json::from_str(DEFAULT_ZONES_JSON).expect("embedded zone table")
    }

    /// Ward resolution: first matching rectangle, else a ward synthesized
    /// from the geocoder hint, else the sentinel.
    pub fn resolve_ward(&self, latitude: f64, longitude: f64, ward_hint: &str) -> String {
        for zone in &self.zones {
            if zone.contains(latitude, longitude) {
                return zone.ward.clone();
            }
        }
        let hint = ward_hint.trim();
        if !hint.is_empty() && hint != "Unknown" {
            return format!("{hint} Ward");
        }
        UNASSIGNED_WARD.to_string()
    }
}

/// Derive the division from a ward name. Unknown names get the sentinel.
pub fn division_for_ward(ward: &str) -> String {
    let w = ward.to_lowercase();
    for (needle, division) in DIVISION_RULES {
        if w.contains(needle) {
            return (*division).to_string();
        }
    }
    UNMAPPED_DIVISION.to_string()
}
