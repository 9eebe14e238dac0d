//! Point-in-polygon classification of query points.

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use rayon::prelude::*;
use serde::Deserialize;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info, warn};

use super::BoundaryIndex;
use crate::models::QueryPoint;

/// Column names of the query point CSV.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PointFields {
    pub id: String,
    pub x: String,
    pub y: String,
}

impl Default for PointFields {
    fn default() -> Self {
        Self {
            id: "id".to_string(),
            x: "lon".to_string(),
            y: "lat".to_string(),
        }
    }
}

/// Load query points from CSV. Rows with unreadable coordinates are skipped.
pub fn load_query_points(path: &Path, fields: &PointFields) -> Result<Vec<QueryPoint>> {
    info!("Loading query points from {}", path.display());

    let file = File::open(path)
        .with_context(|| format!("Failed to open points file: {}", path.display()))?;
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers = csv_reader.headers()?.clone();
    let position = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .with_context(|| format!("Column '{}' not found in {}", name, path.display()))
    };
    let id_idx = position(&fields.id)?;
    let x_idx = position(&fields.x)?;
    let y_idx = position(&fields.y)?;

    let mut points = Vec::new();
    let mut skipped = 0usize;

    for result in csv_reader.records() {
        let record = result?;
        let coord = |idx: usize| {
            record
                .get(idx)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite())
        };

        match (coord(x_idx), coord(y_idx)) {
            (Some(x), Some(y)) => {
                let id = record.get(id_idx).unwrap_or("").trim();
                points.push(QueryPoint::new(id, x, y));
            }
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!("Skipped {} points with unreadable coordinates", skipped);
    }
    info!("Loaded {} query points", points.len());
    Ok(points)
}

/// Attach the containing unit name to every point.
///
/// Points outside every unit keep an unset name and are not dropped; see
/// [`within_units`]. Points on a unit boundary count as outside it.
pub fn classify(points: &[QueryPoint], index: &BoundaryIndex) -> Vec<QueryPoint> {
    let classified: Vec<(QueryPoint, usize)> = points
        .par_iter()
        .map(|point| {
            let hits = index.lookup_all(point.x, point.y);
            let mut point = point.clone();
            point.containing_unit = hits.first().map(|unit| unit.name.clone());
            (point, hits.len())
        })
        .collect();

    let overlapping = classified.iter().filter(|(_, hits)| *hits > 1).count();
    if overlapping > 0 {
        warn!(
            "{} points fall in more than one unit, first unit kept",
            overlapping
        );
    }

    let points: Vec<QueryPoint> = classified.into_iter().map(|(p, _)| p).collect();
    let inside = points.iter().filter(|p| p.is_classified()).count();
    info!(
        "Classified {} points: {} inside a unit, {} outside",
        points.len(),
        inside,
        points.len() - inside
    );
    points
}

/// Drop points that fell outside every unit.
pub fn within_units(points: Vec<QueryPoint>) -> Vec<QueryPoint> {
    let before = points.len();
    let kept: Vec<QueryPoint> = points.into_iter().filter(QueryPoint::is_classified).collect();
    debug!("Kept {} of {} classified points", kept.len(), before);
    kept
}
