// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use geo_types::Point;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Run-scoped identifier for a stop record.
/// Only meaningful within the run whose allocator produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RunId(pub u32);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Hands out sequential run ids, so peers can be referenced without
/// holding references into the record collections.
#[derive(Debug, Default)]
pub struct RunIdAllocator {
    next_id: u32,
}

impl RunIdAllocator {
    pub fn new() -> Self {
        Self { next_id: 0 }
    }

    pub fn next(&mut self) -> RunId {
        let id = RunId(self.next_id);
        self.next_id += 1;
        id
    }
}

/// Which side of the reconciliation a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StopOrigin {
    Schedule,
    Geo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WheelchairAccess {
    Accessible,
    NotAccessible,
    /// Partially accessible
    Limited,
    #[default]
    Unknown,
}

impl WheelchairAccess {
    /// Value of the OSM `wheelchair=*` tag
    pub fn osm_value(&self) -> &'static str {
        match self {
            WheelchairAccess::Accessible => "yes",
            WheelchairAccess::NotAccessible => "no",
            WheelchairAccess::Limited => "limited",
            WheelchairAccess::Unknown => "unknown",
        }
    }

    pub fn from_osm_value(value: &str) -> Self {
        match value {
            "yes" | "designated" => WheelchairAccess::Accessible,
            "no" => WheelchairAccess::NotAccessible,
            "limited" => WheelchairAccess::Limited,
            _ => WheelchairAccess::Unknown,
        }
    }
}

/// OSM style key/value tag set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tags(pub BTreeMap<String, String>);

impl Tags {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|v| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Checks that `key` is present with exactly `value`
    pub fn has(&self, key: &str, value: &str) -> bool {
        self.get(key).is_some_and(|v| v == value)
    }

    /// Inserts the tag only when the key is not set yet.
    /// Returns true if the tag set changed.
    pub fn add_if_absent(&mut self, key: &str, value: &str) -> bool {
        if self.0.contains_key(key) {
            return false;
        }
        self.0.insert(key.to_string(), value.to_string());
        true
    }

    /// Inserts or overwrites, returning the previous value.
    pub fn insert_or_replace(&mut self, key: &str, value: &str) -> Option<String> {
        self.0.insert(key.to_string(), value.to_string())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Tags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Tags(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// The original OSM element a geo record was read from.
/// Carried along so it can be re-emitted with modified tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OsmElement {
    pub osm_id: i64,
    pub tags: Tags,
}

/// Peers bound by the matching engine.
///
/// Geo records only ever use `peer`. Schedule records may additionally
/// hold one rail platform peer and any number of stop positions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchState {
    pub peer: Option<RunId>,
    pub rail_peer: Option<RunId>,
    pub stop_positions: BTreeSet<RunId>,
}

impl MatchState {
    pub fn is_unmatched(&self) -> bool {
        self.peer.is_none() && self.rail_peer.is_none() && self.stop_positions.is_empty()
    }
}

/// A stop from either source.
///
/// There is intentionally no `PartialEq`: two records only denote the same
/// stop when the matching engine says so.
#[derive(Debug, Clone)]
pub struct StopRecord {
    pub run_id: RunId,
    pub origin: StopOrigin,
    pub schedule_id: Option<String>,
    pub reference_code: Option<String>,
    /// x = longitude, y = latitude
    pub position: Point<f64>,
    pub name: Option<String>,
    pub operator: Option<String>,
    pub wheelchair: WheelchairAccess,
    pub is_rail_variant: bool,
    pub is_stop_position: bool,
    pub match_state: MatchState,
    pub provenance: Option<OsmElement>,
}

impl StopRecord {
    pub fn new_schedule(
        run_id: RunId,
        schedule_id: String,
        reference_code: Option<String>,
        lat: f64,
        lon: f64,
    ) -> Self {
        Self {
            run_id,
            origin: StopOrigin::Schedule,
            schedule_id: Some(schedule_id),
            reference_code,
            position: Point::new(lon, lat),
            name: None,
            operator: None,
            wheelchair: WheelchairAccess::Unknown,
            is_rail_variant: false,
            is_stop_position: false,
            match_state: MatchState::default(),
            provenance: None,
        }
    }

    pub fn new_geo(run_id: RunId, element: OsmElement, lat: f64, lon: f64) -> Self {
        Self {
            run_id,
            origin: StopOrigin::Geo,
            schedule_id: None,
            reference_code: None,
            position: Point::new(lon, lat),
            name: None,
            operator: None,
            wheelchair: WheelchairAccess::Unknown,
            is_rail_variant: false,
            is_stop_position: false,
            match_state: MatchState::default(),
            provenance: Some(element),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }

    pub fn with_wheelchair(mut self, wheelchair: WheelchairAccess) -> Self {
        self.wheelchair = wheelchair;
        self
    }

    pub fn lat(&self) -> f64 {
        self.position.y()
    }

    pub fn lon(&self) -> f64 {
        self.position.x()
    }

    pub fn osm_id(&self) -> Option<i64> {
        self.provenance.as_ref().map(|e| e.osm_id)
    }
}

impl fmt::Display for StopRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stop [{:?} {}, gtfs_id={}, ref={}, lat={}, lon={}, name={}, operator={}, wheelchair={}, rail={}, stop_position={}",
            self.origin,
            self.run_id,
            self.schedule_id.as_deref().unwrap_or("null"),
            self.reference_code.as_deref().unwrap_or("null"),
            self.lat(),
            self.lon(),
            self.name.as_deref().unwrap_or("null"),
            self.operator.as_deref().unwrap_or("null"),
            self.wheelchair.osm_value(),
            self.is_rail_variant,
            self.is_stop_position,
        )?;
        if let Some(osm_id) = self.osm_id() {
            write!(f, ", osm_id={}", osm_id)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocator_is_sequential() {
        let mut ids = RunIdAllocator::new();
        assert_eq!(ids.next(), RunId(0));
        assert_eq!(ids.next(), RunId(1));
        assert_eq!(ids.next(), RunId(2));
    }

    #[test]
    fn add_if_absent_is_idempotent() {
        let mut once = Tags::new();
        once.add_if_absent("bus", "yes");
        once.add_if_absent("name", "Piazza Castello");

        let mut twice = once.clone();
        assert!(!twice.add_if_absent("bus", "yes"));
        assert!(!twice.add_if_absent("name", "Piazza Castello"));
        assert_eq!(once, twice);
    }

    #[test]
    fn add_if_absent_never_overwrites() {
        let mut tags: Tags = [("name", "Porta Nuova")].into_iter().collect();
        assert!(!tags.add_if_absent("name", "PORTA NUOVA"));
        assert_eq!(tags.get("name"), Some("Porta Nuova"));
    }

    #[test]
    fn display_dumps_fields() {
        let stop = StopRecord::new_schedule(RunId(3), "100".into(), Some("12".into()), 45.0, 9.0)
            .with_name("Via Roma");
        let dump = stop.to_string();
        assert!(dump.contains("gtfs_id=100"));
        assert!(dump.contains("ref=12"));
        assert!(dump.contains("name=Via Roma"));
        assert!(!dump.contains("osm_id"));
    }
}
