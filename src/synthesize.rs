// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use tracing::warn;

use crate::changeset::{ChangeAction, ChangeRecord};
use crate::policy::NamingPolicy;
use crate::settings::Settings;
use crate::stop::{StopRecord, Tags};

fn positive_hash(input: &str) -> i64 {
    // mask the sign bit so the value always fits a positive i64
    (seahash::hash(input.as_bytes()) & i64::MAX as u64) as i64
}

/// Placeholder id for a node that does not exist in OSM yet.
///
/// Numeric schedule ids are reused, anything else is hashed. Always negative,
/// and stable for the same schedule id.
pub fn synthetic_id(schedule_id: &str) -> i64 {
    let magnitude = match schedule_id.trim().parse::<i64>() {
        Ok(parsed) if parsed != 0 => parsed.unsigned_abs().min(i64::MAX as u64) as i64,
        _ => {
            warn!(
                "gtfs_id '{}' is not a usable integer, deriving the new node id from its hash",
                schedule_id
            );
            positive_hash(schedule_id).max(1)
        }
    };
    -magnitude
}

/// Builds OSM nodes for schedule stops that matched nothing.
pub fn synthesize_new_stops(
    schedule_stops: &[StopRecord],
    policy: &dyn NamingPolicy,
    settings: &Settings,
) -> Vec<ChangeRecord> {
    schedule_stops
        .iter()
        .filter(|s| s.match_state.is_unmatched())
        .map(|stop| {
            let schedule_id = match &stop.schedule_id {
                Some(id) => id.clone(),
                None => {
                    warn!("Schedule stop without gtfs_id, keying on position: {}", stop);
                    format!("{},{}", stop.lat(), stop.lon())
                }
            };

            let mut tags = Tags::new();
            tags.insert_or_replace("bus", "yes");
            tags.insert_or_replace("highway", "bus_stop");
            tags.insert_or_replace("public_transport", "platform");
            tags.insert_or_replace("operator", &settings.operator_name);
            tags.insert_or_replace(&settings.reviewed_tag_key, "no");
            if let Some(name) = &stop.name {
                tags.insert_or_replace("name", &policy.fix_stop_name(name));
            }
            if let Some(code) = &stop.reference_code {
                tags.insert_or_replace("ref", code);
            }
            tags.insert_or_replace("gtfs_id", &schedule_id);
            tags.insert_or_replace("wheelchair", stop.wheelchair.osm_value());

            ChangeRecord::new(
                ChangeAction::Create,
                synthetic_id(&schedule_id),
                stop.position,
                tags,
            )
        })
        .collect()
}
