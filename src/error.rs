// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use std::path::PathBuf;
use thiserror::Error;

use crate::stop::RunId;

/// Which slot of a record was already taken when a second match showed up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSlot {
    /// The ordinary peer of a schedule stop
    SchedulePeer,
    /// The rail platform peer of a schedule stop
    ScheduleRailPeer,
    /// The one peer of a geo stop
    GeoPeer,
}

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error(
        "Multiple match found ({slot:?} already bound), this is currently unsupported.\n  GTFS: {schedule_stop}\n   OSM: {geo_stop}\n   already bound to: {existing}"
    )]
    AmbiguousMatch {
        slot: MatchSlot,
        schedule_stop: String,
        geo_stop: String,
        existing: String,
    },
    #[error("Matched record {0} points at a peer missing from this run")]
    DanglingPeer(RunId),
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to read GTFS feed at '{path}': {source}")]
    Gtfs {
        path: PathBuf,
        #[source]
        source: gtfs_structures::Error,
    },
    #[error("I/O error accessing path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read OSM PBF '{path}': {source}")]
    OsmPbf {
        path: PathBuf,
        #[source]
        source: osmpbfreader::Error,
    },
}
