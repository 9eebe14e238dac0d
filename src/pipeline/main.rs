//! Grizzly pipeline.
//!
//! Cleans the population records, aggregates them per population unit,
//! joins the aggregates onto the unit boundaries and classifies query
//! points, then writes the plot-ready outputs.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use grizzly::aggregate::{aggregate, count_by_year};
use grizzly::clean::{clean, load_raw_table};
use grizzly::config::{Config, OutputConfig};
use grizzly::join::{
    classify, fortify, load_population_units, load_query_points, reconcile_and_join,
    status_summary, within_units, BoundaryIndex,
};
use grizzly::output::{write_csv, write_joined_geojson};

#[derive(Parser, Debug)]
#[command(name = "pipeline")]
#[command(about = "Join grizzly bear population records onto population unit boundaries")]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Population / mortality records CSV (overrides config)
    #[arg(long)]
    records: Option<PathBuf>,

    /// Population unit boundaries GeoJSON (overrides config)
    #[arg(long)]
    units: Option<PathBuf>,

    /// Query points CSV (overrides config)
    #[arg(long)]
    points: Option<PathBuf>,

    /// Write all outputs with default names into this directory
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging, RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if args.verbose { "debug" } else { "info" }));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Loading config {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(path) = args.records {
        config.inputs.records = Some(path);
    }
    if let Some(path) = args.units {
        config.inputs.boundaries = Some(path);
    }
    if let Some(path) = args.points {
        config.inputs.points = Some(path);
    }
    if let Some(dir) = &args.out_dir {
        std::fs::create_dir_all(dir)?;
        let within_only = config.outputs.points_within_only;
        config.outputs = OutputConfig {
            points_within_only: within_only,
            ..OutputConfig::in_dir(dir)
        };
    }

    info!("Grizzly Pipeline");

    // Clean
    let records_path = config
        .inputs
        .records
        .as_ref()
        .context("No records file given (--records or [inputs].records)")?;
    let raw = load_raw_table(records_path)?;
    let metadata = config.cleaning.metadata_rows();
    let cleaned = clean(
        &raw,
        |column| config.cleaning.drops(column),
        config.cleaning.range_column.as_deref(),
        metadata.as_ref(),
        &config.columns,
    )?;
    if !cleaned.annotation.is_empty() {
        info!("Dataset notes: {}", cleaned.annotation);
    }

    // Aggregate
    let group_key = &config.aggregation.group_key;
    let units = aggregate(&cleaned.records, group_key, &config.aggregation.value_fields);
    for ((key, year), count) in count_by_year(&cleaned.records, group_key) {
        match year {
            Some(year) => debug!("{} {}: {} records", key, year, count),
            None => debug!("{} (no year): {} records", key, count),
        }
    }
    if let Some(path) = &config.outputs.aggregates {
        write_csv(path, &units)?;
    }

    // Join
    let boundaries_path = config
        .inputs
        .boundaries
        .as_ref()
        .context("No boundaries file given (--units or [inputs].boundaries)")?;
    let boundaries = load_population_units(boundaries_path, &config.boundaries)?;
    let joined = reconcile_and_join(units, boundaries, &config.naming)?;

    for (status, count) in status_summary(joined.iter().map(|j| j.unit.as_ref())) {
        info!("  {}: {} units", status, count);
    }

    if let Some(path) = &config.outputs.joined {
        write_joined_geojson(path, &joined)?;
    }
    if let Some(path) = &config.outputs.fortified {
        write_csv(path, &fortify(&joined))?;
    }

    // Classify
    if let Some(points_path) = &config.inputs.points {
        let points = load_query_points(points_path, &config.points)?;
        let index = BoundaryIndex::build(joined.iter().map(|j| j.unit.clone()));
        let mut classified = classify(&points, &index);
        if config.outputs.points_within_only {
            classified = within_units(classified);
        }
        if let Some(path) = &config.outputs.points {
            write_csv(path, &classified)?;
        }
    }

    info!("Pipeline complete");
    Ok(())
}
