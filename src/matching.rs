// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use ahash::AHashMap;
use serde::Serialize;
use tracing::warn;

use crate::distance::distance_between;
use crate::error::{MatchSlot, ReconcileError};
use crate::settings::MatchThresholds;
use crate::stop::{RunId, StopRecord};

/// Outcome of comparing one schedule stop against one geo stop
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PairDecision {
    Match,
    /// Reference codes disagree but the schedule ids agree at short range.
    /// Still a match.
    MatchWithInconsistentReference,
    /// Same reference code, too far apart, schedule ids don't confirm.
    DistantSameReference,
    NoMatch,
}

impl PairDecision {
    pub fn is_match(&self) -> bool {
        matches!(
            self,
            PairDecision::Match | PairDecision::MatchWithInconsistentReference
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchWarning {
    InconsistentReference {
        schedule: RunId,
        geo: RunId,
        distance_m: f64,
    },
    DistantSameReference {
        schedule: RunId,
        geo: RunId,
        distance_m: f64,
    },
}

#[derive(Debug, Clone, Default)]
pub struct MatchReport {
    pub pairs_matched: usize,
    pub stop_positions_matched: usize,
    pub warnings: Vec<MatchWarning>,
}

fn both_present_and_equal(a: Option<&String>, b: Option<&String>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Decides whether two records denote the same stop given their distance.
/// Symmetric in its two record arguments.
pub fn classify_pair(
    a: &StopRecord,
    b: &StopRecord,
    distance_m: f64,
    thresholds: &MatchThresholds,
) -> PairDecision {
    let same_schedule_id = both_present_and_equal(a.schedule_id.as_ref(), b.schedule_id.as_ref());
    let within_radius = distance_m < thresholds.match_radius_m;

    if both_present_and_equal(a.reference_code.as_ref(), b.reference_code.as_ref()) {
        if within_radius || same_schedule_id {
            PairDecision::Match
        } else if distance_m < thresholds.warn_radius_m {
            PairDecision::DistantSameReference
        } else {
            PairDecision::NoMatch
        }
    } else if within_radius && same_schedule_id {
        PairDecision::MatchWithInconsistentReference
    } else {
        PairDecision::NoMatch
    }
}

/// Computes the distance and classifies the pair
pub fn evaluate_pair(
    a: &StopRecord,
    b: &StopRecord,
    thresholds: &MatchThresholds,
) -> (PairDecision, f64) {
    let distance_m = distance_between(a.position, b.position);
    (classify_pair(a, b, distance_m, thresholds), distance_m)
}

/// Binds a matched pair according to the geo record's flags.
///
/// Stop positions may accumulate on the schedule side. Any other slot that is
/// already taken is an ambiguous match and aborts the run.
pub fn bind_pair(
    schedule: &mut StopRecord,
    geo: &mut StopRecord,
    describe: impl Fn(RunId) -> String,
) -> Result<(), ReconcileError> {
    let ambiguous = |slot: MatchSlot, existing: RunId, schedule: &StopRecord, geo: &StopRecord| {
        ReconcileError::AmbiguousMatch {
            slot,
            schedule_stop: schedule.to_string(),
            geo_stop: geo.to_string(),
            existing: describe(existing),
        }
    };

    if let Some(existing) = geo.match_state.peer {
        return Err(ambiguous(MatchSlot::GeoPeer, existing, &*schedule, &*geo));
    }

    if geo.is_stop_position {
        schedule.match_state.stop_positions.insert(geo.run_id);
    } else if geo.is_rail_variant {
        if let Some(existing) = schedule.match_state.rail_peer {
            return Err(ambiguous(MatchSlot::ScheduleRailPeer, existing, &*schedule, &*geo));
        }
        schedule.match_state.rail_peer = Some(geo.run_id);
    } else {
        if let Some(existing) = schedule.match_state.peer {
            return Err(ambiguous(MatchSlot::SchedulePeer, existing, &*schedule, &*geo));
        }
        schedule.match_state.peer = Some(geo.run_id);
    }

    geo.match_state.peer = Some(schedule.run_id);
    Ok(())
}

/// Compares every schedule stop against every geo stop and binds the matches
/// into the records' match state.
pub fn match_stops(
    schedule_stops: &mut [StopRecord],
    geo_stops: &mut [StopRecord],
    thresholds: &MatchThresholds,
) -> Result<MatchReport, ReconcileError> {
    let mut report = MatchReport::default();

    // snapshots for describing already bound peers in error messages
    let dumps: AHashMap<RunId, String> = schedule_stops
        .iter()
        .chain(geo_stops.iter())
        .map(|s| (s.run_id, s.to_string()))
        .collect();
    let describe = |id: RunId| {
        dumps
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("unknown record {}", id))
    };

    for schedule in schedule_stops.iter_mut() {
        for geo in geo_stops.iter_mut() {
            let (decision, distance_m) = evaluate_pair(schedule, geo, thresholds);
            let debug_data = format!(
                "GTFS Stop data: [{}] -> OSM Stop data: [{}], exact distance between: {} m",
                schedule, geo, distance_m
            );

            match decision {
                PairDecision::DistantSameReference => {
                    warn!(
                        "Same ref tag with dist > {} m (and less than {} m) / {}",
                        thresholds.match_radius_m, thresholds.warn_radius_m, debug_data
                    );
                    report.warnings.push(MatchWarning::DistantSameReference {
                        schedule: schedule.run_id,
                        geo: geo.run_id,
                        distance_m,
                    });
                }
                PairDecision::MatchWithInconsistentReference => {
                    warn!(
                        "Different ref tag matched but equal gtfs_id matched / {}",
                        debug_data
                    );
                    report.warnings.push(MatchWarning::InconsistentReference {
                        schedule: schedule.run_id,
                        geo: geo.run_id,
                        distance_m,
                    });
                }
                PairDecision::Match | PairDecision::NoMatch => {}
            }

            if decision.is_match() {
                bind_pair(schedule, geo, &describe)?;
                if geo.is_stop_position {
                    report.stop_positions_matched += 1;
                } else {
                    report.pairs_matched += 1;
                }
            }
        }
    }

    Ok(report)
}
