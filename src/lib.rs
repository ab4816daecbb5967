// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

//! Reconciles GTFS stops against OSM stop nodes and produces change sets for
//! matched, removal-candidate and new stops.

#![deny(
    clippy::mutable_key_type,
    clippy::map_entry,
    clippy::boxed_local,
    clippy::let_unit_value,
    clippy::redundant_allocation,
    clippy::bool_comparison,
    clippy::bind_instead_of_map,
    clippy::vec_box,
    clippy::while_let_loop,
    clippy::useless_asref,
    clippy::repeat_once,
    clippy::deref_addrof,
    clippy::suspicious_map,
    clippy::single_char_pattern,
    clippy::for_kv_map,
    clippy::let_and_return,
    clippy::iter_nth,
    clippy::iter_cloned_collect,
    clippy::match_result_ok,
    clippy::cmp_owned,
    clippy::op_ref
)]

pub mod changeset;
pub mod distance;
pub mod error;
pub mod matching;
pub mod policy;
pub mod reconcile;
pub mod settings;
pub mod sources;
pub mod stop;
pub mod synthesize;

#[cfg(test)]
mod test_scenarios;

pub use changeset::{ChangeAction, ChangeRecord, ChangeSets, ReconcileCounts};
pub use error::ReconcileError;
pub use policy::NamingPolicy;
pub use settings::Settings;
pub use stop::{RunId, RunIdAllocator, StopRecord};

use tracing::info;

/// Runs matching, reconciliation and synthesis over one pair of inputs.
///
/// Aborts on the first ambiguous match; no partial change sets are returned.
pub fn reconcile_stops(
    mut schedule_stops: Vec<StopRecord>,
    mut geo_stops: Vec<StopRecord>,
    policy: &dyn NamingPolicy,
    settings: &Settings,
) -> Result<ChangeSets, ReconcileError> {
    info!(
        "Matching {} GTFS stops against {} OSM stops",
        schedule_stops.len(),
        geo_stops.len()
    );

    let match_report =
        matching::match_stops(&mut schedule_stops, &mut geo_stops, &settings.thresholds)?;
    info!(
        "Bound {} stops and {} stop positions, {} warnings",
        match_report.pairs_matched,
        match_report.stop_positions_matched,
        match_report.warnings.len()
    );

    let reconciliation =
        reconcile::reconcile_geo_stops(&geo_stops, &schedule_stops, policy, settings)?;
    let new_stops = synthesize::synthesize_new_stops(&schedule_stops, policy, settings);

    let counts = ReconcileCounts {
        created: new_stops.len(),
        ..reconciliation.counts
    };

    info!(
        "Matched OSM stops with GTFS data with updated metadata applied: {}",
        counts.matched
    );
    info!(
        "OSM stops with a corrected gtfs_id: {}",
        counts.id_corrected
    );
    info!(
        "Stops NOT MATCHED that need to be removed from OSM: {}",
        counts.unmatched
    );
    info!(
        "New stops from GTFS (unmatched stops from GTFS): {}",
        counts.created
    );

    Ok(ChangeSets {
        matched_with_updates: reconciliation.matched_with_updates,
        unmatched_geo_stops: reconciliation.unmatched_geo_stops,
        new_stops_from_schedule: new_stops,
        bounds: changeset::bounds_of(&schedule_stops),
        counts,
        match_warnings: match_report.warnings,
        distance_notes: reconciliation.distance_notes,
    })
}
