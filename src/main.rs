// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Stop Reconciler - matches GTFS stops against OSM stop nodes

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use stop_reconciler::policy::{NamingPolicy, PassthroughNaming, TitleCaseNaming};
use stop_reconciler::sources::{load_geo_stops, load_schedule_stops};
use stop_reconciler::{ChangeRecord, RunIdAllocator, Settings, reconcile_stops};

const OUTPUT_MATCHED_WITH_UPDATED_METADATA: &str = "matched_with_updated_metadata.json";
const OUTPUT_NOT_MATCHED_STOPS: &str = "not_matched_stops.json";
const OUTPUT_NEW_STOPS_FROM_GTFS: &str = "new_stops_from_gtfs.json";

#[derive(Parser, Debug)]
#[command(version, about = "Generate change sets to merge GTFS bus stops into OSM", long_about = None)]
struct Args {
    /// GTFS feed, zip or extracted directory
    #[arg(long, env = "GTFS_PATH")]
    gtfs: PathBuf,

    /// OSM PBF extract containing the current stop nodes
    #[arg(long, env = "OSM_STOPS_PBF")]
    osm_pbf: PathBuf,

    /// Directory the change sets are written to
    #[arg(long, env = "OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// JSON settings file, see `Settings`
    #[arg(long, env = "RECONCILER_SETTINGS")]
    settings: Option<PathBuf>,

    /// Overrides `operator_name` from the settings file
    #[arg(long, env = "OPERATOR_NAME")]
    operator: Option<String>,

    /// Overrides `reviewed_tag_key` from the settings file
    #[arg(long, env = "REVIEWED_TAG_KEY")]
    reviewed_tag_key: Option<String>,
}

fn load_settings(args: &Args) -> Result<Settings> {
    let mut settings = match &args.settings {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read settings {}", path.display()))?;
            Settings::from_json_str(&contents)
                .with_context(|| format!("Failed to parse settings {}", path.display()))?
        }
        None => Settings::default(),
    };

    if let Some(operator) = &args.operator {
        settings.operator_name = operator.clone();
    }
    if let Some(key) = &args.reviewed_tag_key {
        settings.reviewed_tag_key = key.clone();
    }

    Ok(settings)
}

fn write_change_set(dir: &Path, file_name: &str, records: &[ChangeRecord]) -> Result<()> {
    let path = dir.join(file_name);
    let file =
        File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), records)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let settings = load_settings(&args)?;

    let policy: Box<dyn NamingPolicy> = if settings.title_case_names {
        Box::new(TitleCaseNaming::new(settings.strip_name_prefixes.clone()))
    } else {
        Box::new(PassthroughNaming)
    };

    let mut ids = RunIdAllocator::new();

    println!("Reading GTFS stops from {}", args.gtfs.display());
    let schedule_stops = load_schedule_stops(&args.gtfs, &mut ids, policy.as_ref(), &settings)?;
    println!("Read {} GTFS stops", schedule_stops.len());

    println!("Reading OSM stops from {}", args.osm_pbf.display());
    let geo_stops = load_geo_stops(&args.osm_pbf, &mut ids, policy.as_ref())?;

    let change_sets = reconcile_stops(schedule_stops, geo_stops, policy.as_ref(), &settings)?;

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;

    if !change_sets.matched_with_updates.is_empty() {
        write_change_set(
            &args.output_dir,
            OUTPUT_MATCHED_WITH_UPDATED_METADATA,
            &change_sets.matched_with_updates,
        )?;
    } else {
        println!("No OSM stop got matched with GTFS data!");
    }

    if !change_sets.unmatched_geo_stops.is_empty() {
        write_change_set(
            &args.output_dir,
            OUTPUT_NOT_MATCHED_STOPS,
            &change_sets.unmatched_geo_stops,
        )?;
    }

    if !change_sets.new_stops_from_schedule.is_empty() {
        write_change_set(
            &args.output_dir,
            OUTPUT_NEW_STOPS_FROM_GTFS,
            &change_sets.new_stops_from_schedule,
        )?;
    }

    if let Some(bounds) = change_sets.bounds {
        println!(
            "Bounds: {},{} - {},{}",
            bounds.min_lat, bounds.min_lon, bounds.max_lat, bounds.max_lon
        );
    }

    Ok(())
}
