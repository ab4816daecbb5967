// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

//! Conversion of parsed GTFS stops and OSM nodes into [`StopRecord`]s.

use gtfs_structures::{Availability, LocationType};
use osmpbfreader::{OsmObj, OsmPbfReader};
use std::fs::File;
use std::path::Path;

use crate::error::SourceError;
use crate::policy::NamingPolicy;
use crate::settings::Settings;
use crate::stop::{OsmElement, RunIdAllocator, StopRecord, Tags, WheelchairAccess};

pub fn availability_to_wheelchair(input: &Availability) -> WheelchairAccess {
    match input {
        Availability::Available => WheelchairAccess::Accessible,
        Availability::NotAvailable => WheelchairAccess::NotAccessible,
        Availability::InformationNotAvailable => WheelchairAccess::Unknown,
        Availability::Unknown(_) => WheelchairAccess::Unknown,
    }
}

/// Builds a schedule record from a GTFS stop.
/// Stations, entrances and stops without coordinates are skipped.
pub fn schedule_stop_from_gtfs(
    stop: &gtfs_structures::Stop,
    ids: &mut RunIdAllocator,
    policy: &dyn NamingPolicy,
    settings: &Settings,
) -> Option<StopRecord> {
    if !matches!(stop.location_type, LocationType::StopPoint) {
        return None;
    }

    let (lat, lon) = match (stop.latitude, stop.longitude) {
        (Some(lat), Some(lon)) => (lat, lon),
        _ => return None,
    };

    let reference_code = stop
        .code
        .as_deref()
        .map(|c| policy.fix_reference_code(c))
        .filter(|c| !c.is_empty());

    let mut record = StopRecord::new_schedule(ids.next(), stop.id.clone(), reference_code, lat, lon)
        .with_operator(settings.operator_name.clone())
        .with_wheelchair(availability_to_wheelchair(&stop.wheelchair_boarding));
    record.name = stop.name.clone();

    Some(record)
}

/// Loads the stops of a GTFS feed (zip or directory), ordered by stop id.
pub fn load_schedule_stops(
    path: &Path,
    ids: &mut RunIdAllocator,
    policy: &dyn NamingPolicy,
    settings: &Settings,
) -> Result<Vec<StopRecord>, SourceError> {
    let gtfs = gtfs_structures::Gtfs::new(&path.to_string_lossy()).map_err(|source| {
        SourceError::Gtfs {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let mut stops: Vec<&gtfs_structures::Stop> = gtfs.stops.values().map(|s| &**s).collect();
    stops.sort_by(|a, b| a.id.cmp(&b.id));

    Ok(stops
        .into_iter()
        .filter_map(|s| schedule_stop_from_gtfs(s, ids, policy, settings))
        .collect())
}

/// Nodes worth comparing against the schedule
pub fn is_transit_stop(tags: &Tags) -> bool {
    tags.has("highway", "bus_stop")
        || tags.has("public_transport", "platform")
        || tags.has("public_transport", "stop_position")
        || tags.has("railway", "tram_stop")
}

/// Tram, train, subway and light rail nodes
pub fn is_rail_variant(tags: &Tags) -> bool {
    if let Some(railway) = tags.get("railway") {
        if ["tram_stop", "station", "halt", "platform", "stop"].contains(&railway) {
            return true;
        }
    }

    ["tram", "train", "subway", "light_rail"]
        .iter()
        .any(|mode| tags.has(mode, "yes"))
}

pub fn geo_stop_from_tags(
    osm_id: i64,
    lat: f64,
    lon: f64,
    tags: Tags,
    ids: &mut RunIdAllocator,
    policy: &dyn NamingPolicy,
) -> StopRecord {
    let schedule_id = tags.get("gtfs_id").map(str::to_string);
    let reference_code = tags
        .get("ref")
        .map(|r| policy.fix_reference_code(r))
        .filter(|r| !r.is_empty());
    let name = tags.get("name").map(str::to_string);
    let operator = tags.get("operator").map(str::to_string);
    let wheelchair = tags
        .get("wheelchair")
        .map(WheelchairAccess::from_osm_value)
        .unwrap_or_default();
    let is_stop_position = tags.has("public_transport", "stop_position");
    let is_rail = is_rail_variant(&tags);

    let mut record = StopRecord::new_geo(ids.next(), OsmElement { osm_id, tags }, lat, lon);
    record.schedule_id = schedule_id;
    record.reference_code = reference_code;
    record.name = name;
    record.operator = operator;
    record.wheelchair = wheelchair;
    record.is_stop_position = is_stop_position;
    record.is_rail_variant = is_rail;
    record
}

fn tags_of(node_tags: &osmpbfreader::Tags) -> Tags {
    node_tags
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Reads transit stop nodes from an OSM PBF extract.
pub fn load_geo_stops(
    path: &Path,
    ids: &mut RunIdAllocator,
    policy: &dyn NamingPolicy,
) -> Result<Vec<StopRecord>, SourceError> {
    let file = File::open(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = OsmPbfReader::new(file);

    let mut stops = Vec::new();
    let mut processed: usize = 0;

    for obj in reader.iter() {
        let obj = obj.map_err(|source| SourceError::OsmPbf {
            path: path.to_path_buf(),
            source,
        })?;
        processed += 1;

        if processed % 100_000 == 0 {
            println!("Processed {} objects, found {} stops...", processed, stops.len());
        }

        if let OsmObj::Node(node) = obj {
            let tags = tags_of(&node.tags);
            if !is_transit_stop(&tags) {
                continue;
            }
            stops.push(geo_stop_from_tags(
                node.id.0,
                node.lat(),
                node.lon(),
                tags,
                ids,
                policy,
            ));
        }
    }

    println!("Processed {} objects, found {} stops", processed, stops.len());

    Ok(stops)
}
