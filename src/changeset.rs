// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use geo::BoundingRect;
use geo_types::{MultiPoint, Point, Rect};
use serde::Serialize;

use crate::matching::MatchWarning;
use crate::reconcile::DistanceNote;
use crate::stop::{StopRecord, Tags};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Create,
    Modify,
    /// Candidate for removal, to be reviewed before deleting
    Delete,
}

/// One tag written by the reconciliation. `old` is None for added tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagDelta {
    pub key: String,
    pub old: Option<String>,
    pub new: String,
}

/// A node ready for a change file serializer.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeRecord {
    pub action: ChangeAction,
    /// Negative ids are placeholders for nodes that don't exist yet
    pub osm_id: i64,
    pub lat: f64,
    pub lon: f64,
    pub tags: Tags,
    pub deltas: Vec<TagDelta>,
}

impl ChangeRecord {
    pub fn new(action: ChangeAction, osm_id: i64, position: Point<f64>, tags: Tags) -> Self {
        Self {
            action,
            osm_id,
            lat: position.y(),
            lon: position.x(),
            tags,
            deltas: vec![],
        }
    }

    /// Adds the tag if missing, recording the delta
    pub fn ensure_tag(&mut self, key: &str, value: &str) -> bool {
        let added = self.tags.add_if_absent(key, value);
        if added {
            self.deltas.push(TagDelta {
                key: key.to_string(),
                old: None,
                new: value.to_string(),
            });
        }
        added
    }

    /// Overwrites the tag, recording the delta when the value changes
    pub fn replace_tag(&mut self, key: &str, value: &str) -> bool {
        let old = self.tags.insert_or_replace(key, value);
        if old.as_deref() == Some(value) {
            return false;
        }
        self.deltas.push(TagDelta {
            key: key.to_string(),
            old,
            new: value.to_string(),
        });
        true
    }

    pub fn delta(&self, key: &str) -> Option<&TagDelta> {
        self.deltas.iter().find(|d| d.key == key)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileCounts {
    pub matched: usize,
    pub unmatched: usize,
    pub id_corrected: usize,
    pub created: usize,
}

/// Bounding box in degrees, as written in a change file header
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl From<Rect<f64>> for Bounds {
    fn from(rect: Rect<f64>) -> Self {
        Self {
            min_lat: rect.min().y,
            min_lon: rect.min().x,
            max_lat: rect.max().y,
            max_lon: rect.max().x,
        }
    }
}

/// Bounds of a stop collection, None when it is empty
pub fn bounds_of(stops: &[StopRecord]) -> Option<Bounds> {
    let points: MultiPoint<f64> = stops.iter().map(|s| s.position).collect();
    points.bounding_rect().map(Bounds::from)
}

#[derive(Debug, Clone, Serialize)]
pub struct ChangeSets {
    pub matched_with_updates: Vec<ChangeRecord>,
    pub unmatched_geo_stops: Vec<ChangeRecord>,
    pub new_stops_from_schedule: Vec<ChangeRecord>,
    pub bounds: Option<Bounds>,
    pub counts: ReconcileCounts,
    /// Pairs that need a human look, in comparison order
    pub match_warnings: Vec<MatchWarning>,
    /// Matched pairs further apart than the report threshold, largest first
    pub distance_notes: Vec<DistanceNote>,
}
