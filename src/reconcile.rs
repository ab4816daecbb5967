// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use ahash::AHashMap;
use itertools::Itertools;
use serde::Serialize;
use tracing::info;

use crate::changeset::{ChangeAction, ChangeRecord, ReconcileCounts};
use crate::distance::distance_between;
use crate::error::ReconcileError;
use crate::policy::NamingPolicy;
use crate::settings::Settings;
use crate::stop::{RunId, StopRecord, Tags};

/// A matched pair further apart than the report threshold
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceNote {
    pub distance_m: f64,
    pub osm_id: Option<i64>,
    pub reference_code: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    pub matched_with_updates: Vec<ChangeRecord>,
    pub unmatched_geo_stops: Vec<ChangeRecord>,
    /// Largest discrepancy first
    pub distance_notes: Vec<DistanceNote>,
    pub counts: ReconcileCounts,
}

fn change_record_for(geo: &StopRecord, action: ChangeAction) -> ChangeRecord {
    let (osm_id, tags) = match &geo.provenance {
        Some(element) => (element.osm_id, element.tags.clone()),
        None => (0, Tags::new()),
    };
    ChangeRecord::new(action, osm_id, geo.position, tags)
}

/// Applies the tag merge for one matched pair.
/// Returns true when the stored gtfs id had to be corrected.
fn merge_matched(
    record: &mut ChangeRecord,
    geo: &StopRecord,
    schedule: &StopRecord,
    policy: &dyn NamingPolicy,
    settings: &Settings,
) -> bool {
    let mut id_corrected = false;

    if schedule.schedule_id != geo.schedule_id {
        if let Some(gtfs_id) = &schedule.schedule_id {
            info!(
                "OSM Stop node id {} (ref {}) has gtfs_id: {} but in GTFS has gtfs_id: {}",
                record.osm_id,
                geo.reference_code.as_deref().unwrap_or("null"),
                geo.schedule_id.as_deref().unwrap_or("null"),
                gtfs_id
            );
            record.replace_tag("gtfs_id", gtfs_id);
            id_corrected = true;
        }
    }

    if let Some(name) = &schedule.name {
        record.ensure_tag("name", &policy.fix_stop_name(name));
    }
    record.ensure_tag("operator", &settings.operator_name);
    record.ensure_tag(&settings.reviewed_tag_key, "no");
    record.ensure_tag("wheelchair", schedule.wheelchair.osm_value());

    if geo.is_rail_variant {
        record.ensure_tag("public_transport", "stop_position");
    } else {
        record.ensure_tag("bus", "yes");
        record.ensure_tag("highway", "bus_stop");
        record.ensure_tag("public_transport", "platform");
    }

    id_corrected
}

/// Walks the geo stops after matching and sorts them into updated and
/// removal-candidate change records.
pub fn reconcile_geo_stops(
    geo_stops: &[StopRecord],
    schedule_stops: &[StopRecord],
    policy: &dyn NamingPolicy,
    settings: &Settings,
) -> Result<Reconciliation, ReconcileError> {
    let schedule_by_id: AHashMap<RunId, &StopRecord> =
        schedule_stops.iter().map(|s| (s.run_id, s)).collect();

    let mut result = Reconciliation::default();

    for geo in geo_stops {
        match geo.match_state.peer {
            Some(peer_id) => {
                let schedule = schedule_by_id
                    .get(&peer_id)
                    .copied()
                    .ok_or(ReconcileError::DanglingPeer(geo.run_id))?;

                let distance_m = distance_between(geo.position, schedule.position);
                if distance_m > settings.thresholds.discrepancy_report_m {
                    result.distance_notes.push(DistanceNote {
                        distance_m,
                        osm_id: geo.osm_id(),
                        reference_code: geo.reference_code.clone(),
                    });
                }

                let mut record = change_record_for(geo, ChangeAction::Modify);
                if merge_matched(&mut record, geo, schedule, policy, settings) {
                    result.counts.id_corrected += 1;
                }

                result.matched_with_updates.push(record);
                result.counts.matched += 1;
            }
            None => {
                info!(
                    "OSM Stop node id {} (ref {}) has gtfs_id: {} but the stop didn't get matched to a GTFS stop as they are too distant or ref code is no more available.",
                    geo.osm_id().unwrap_or(0),
                    geo.reference_code.as_deref().unwrap_or("null"),
                    geo.schedule_id.as_deref().unwrap_or("null"),
                );
                result
                    .unmatched_geo_stops
                    .push(change_record_for(geo, ChangeAction::Delete));
                result.counts.unmatched += 1;
            }
        }
    }

    result.distance_notes = result
        .distance_notes
        .into_iter()
        .sorted_by(|a, b| b.distance_m.total_cmp(&a.distance_m))
        .collect();

    for note in &result.distance_notes {
        info!(
            "Stop ref {} distance GTFS-OSM: {} m",
            note.reference_code.as_deref().unwrap_or("null"),
            note.distance_m
        );
    }

    Ok(result)
}
