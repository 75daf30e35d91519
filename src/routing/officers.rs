//! # Officer Directory
//! Static reference data mapping wards and divisions to responsible
//! officers. Injected, read-only during intake.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::complaint::Officer;

const ENV_OFFICERS_PATH: &str = "INTAKE_OFFICERS_PATH";
const DEFAULT_OFFICERS_PATH: &str = "config/officers.json";
const DEFAULT_OFFICERS_JSON: &str = include_str!("../../config/officers.json");

#[derive(Debug, Clone, Deserialize)]
pub struct OfficerDirectory {
    pub officers: Vec<Officer>,
}

impl OfficerDirectory {
    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).context("parsing officer directory json")
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading officer directory from {}", path.display()))?;
        Self::from_json(&content)
    }

    /// Load using env var + fallbacks:
    /// 1) $INTAKE_OFFICERS_PATH
    /// 2) config/officers.json
    /// 3) the embedded default directory
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_OFFICERS_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("INTAKE_OFFICERS_PATH points to non-existent path"));
        }
        let default_p = PathBuf::from(DEFAULT_OFFICERS_PATH);
        if default_p.exists() {
            return Self::load_from(&default_p);
        }
        Ok(Self::embedded())
    }

    /// Built-in directory shipped with the binary.
    pub fn embedded() -> Self {
        serde_json::from_str(DEFAULT_OFFICERS_JSON).expect("embedded officer directory")
    }

    /// Exact ward match.
    pub fn by_ward(&self, ward: &str) -> Option<&Officer> {
        self.officers.iter().find(|o| o.ward == ward)
    }

    /// Exact division match.
    pub fn by_division(&self, division: &str) -> Option<&Officer> {
        self.officers.iter().find(|o| o.division == division)
    }

    /// Assignment lookup order: ward first, division as the fallback.
    pub fn find_for(&self, ward: &str, division: &str) -> Option<&Officer> {
        self.by_ward(ward).or_else(|| self.by_division(division))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ward_match_beats_division_match() {
        let dir = OfficerDirectory::embedded();
        let officer = dir.find_for("Indiranagar", "South Division").unwrap();
        assert_eq!(officer.id, "OFF-101");
        assert_eq!(officer.department, "Water Supply");
    }

    #[test]
    fn division_fallback_covers_wards_without_an_officer() {
        let dir = OfficerDirectory::embedded();
        // Yelahanka has no ward-level officer in the seed directory.
        assert!(dir.by_ward("Yelahanka").is_none());
        let officer = dir.find_for("Yelahanka", "North Division").unwrap();
        assert_eq!(officer.id, "OFF-104");
    }

    #[test]
    fn unknown_ward_and_division_yield_none() {
        let dir = OfficerDirectory::embedded();
        assert!(dir.find_for("Unassigned", "Unmapped").is_none());
    }

    #[test]
    fn directory_entries_may_lack_an_email() {
        let dir = OfficerDirectory::embedded();
        let officer = dir.by_ward("Malleshwaram").unwrap();
        assert_eq!(officer.mail_address(), None);
    }

    #[test]
    fn custom_json_directories_parse() {
        let dir = OfficerDirectory::from_json(
            r#"{"officers":[
                {"id":"X-1","name":"A","email":"a@x.example","ward":"W","division":"D","department":"Roads"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(dir.by_division("D").unwrap().id, "X-1");
    }
}
