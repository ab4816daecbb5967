// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use serde::Deserialize;

/// Distances (metres) steering the matching engine and the reconciliation report.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct MatchThresholds {
    /// Stops closer than this may be matched
    pub match_radius_m: f64,
    /// Same ref stops closer than this but outside the match radius are warned about
    pub warn_radius_m: f64,
    /// Matched pairs further apart than this are listed in the distance report
    pub discrepancy_report_m: f64,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            match_radius_m: 70.0,
            warn_radius_m: 5000.0,
            discrepancy_report_m: 5.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Written to `operator=*` on matched and new stops
    pub operator_name: String,
    /// Key of the tag marking a stop as reviewed by a human
    pub reviewed_tag_key: String,
    /// Title-case stop names coming from the feed
    pub title_case_names: bool,
    /// Prefixes stripped from stop names, e.g. "Fermata"
    pub strip_name_prefixes: Vec<String>,
    pub thresholds: MatchThresholds,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            operator_name: String::new(),
            reviewed_tag_key: "gtfs:reviewed".to_string(),
            title_case_names: false,
            strip_name_prefixes: vec![],
            thresholds: MatchThresholds::default(),
        }
    }
}

impl Settings {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
