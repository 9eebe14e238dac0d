//! Population unit boundary loading and version selection.

use anyhow::{Context, Result};
use geo::MultiPolygon;
use geojson::{Feature, GeoJson};
use hashbrown::HashMap;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::JoinError;
use crate::models::{PopulationUnit, UnitStatus};

/// Feature property names carrying each boundary attribute.
///
/// `version` must hold a whole number (`2012` or `"2012"`); versions are
/// ordered numerically, so features tagged `"2012_rev"` are skipped.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BoundaryFields {
    pub name: String,
    pub version: String,
    pub status: String,
    pub unit_id: Option<String>,
}

impl Default for BoundaryFields {
    fn default() -> Self {
        Self {
            name: "GBPU_NAME".to_string(),
            version: "GBPU_VERS".to_string(),
            status: "GBPU_STATUS".to_string(),
            unit_id: Some("GBPU_ID".to_string()),
        }
    }
}

/// Load population unit polygons from a GeoJSON file.
pub fn load_population_units(
    path: &Path,
    fields: &BoundaryFields,
) -> Result<Vec<PopulationUnit>> {
    info!("Loading population unit boundaries from {}", path.display());

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read boundary file: {}", path.display()))?;
    let geojson: GeoJson = content
        .parse()
        .with_context(|| format!("Failed to parse GeoJSON: {}", path.display()))?;

    population_units_from_geojson(geojson, fields)
}

/// Convert (Multi)Polygon features into population units.
///
/// Features without a name, a version, or an areal geometry are skipped.
pub fn population_units_from_geojson(
    geojson: GeoJson,
    fields: &BoundaryFields,
) -> Result<Vec<PopulationUnit>> {
    let features = match geojson {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(_) => {
            anyhow::bail!("Boundary GeoJSON must contain features, found a bare geometry")
        }
    };

    let total = features.len();
    let mut units = Vec::with_capacity(total);
    let mut unversioned = 0usize;

    for (i, feature) in features.into_iter().enumerate() {
        let Some(name) = property_str(&feature, &fields.name) else {
            debug!("Feature {} has no '{}', skipping", i, fields.name);
            continue;
        };

        let Some(version) = property_u32(&feature, &fields.version) else {
            warn!(
                "Boundary '{}' has no readable '{}', skipping",
                name, fields.version
            );
            unversioned += 1;
            continue;
        };

        let status = property_str(&feature, &fields.status)
            .map(|label| UnitStatus::from_label(&label))
            .unwrap_or_else(|| UnitStatus::Other("Unknown".to_string()));

        let unit_id = fields
            .unit_id
            .as_deref()
            .and_then(|key| property_u32(&feature, key));

        let Some(geometry) = feature.geometry.and_then(to_multipolygon) else {
            warn!("Boundary '{}' has no polygon geometry, skipping", name);
            continue;
        };

        units.push(PopulationUnit {
            unit_id,
            name,
            version,
            status,
            geometry,
        });
    }

    if unversioned > 0 && units.is_empty() {
        warn!(
            "No boundary carried a numeric '{}', version tags must be whole numbers",
            fields.version
        );
    }
    info!("Loaded {} of {} boundary features", units.len(), total);
    Ok(units)
}

fn to_multipolygon(geometry: geojson::Geometry) -> Option<MultiPolygon<f64>> {
    let geometry: geo::Geometry<f64> = geometry.try_into().ok()?;
    match geometry {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon::new(vec![p])),
        _ => None,
    }
}

fn property_str(feature: &Feature, key: &str) -> Option<String> {
    match feature.property(key)? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn property_u32(feature: &Feature, key: &str) -> Option<u32> {
    match feature.property(key)? {
        // Shapefile exports often carry integers as doubles
        Value::Number(n) => n
            .as_u64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                    .map(|f| f as u64)
            })
            .and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Keep only the boundaries carrying the highest version tag.
///
/// The latest version is the authoritative snapshot; a unit name that
/// appears more than once within it makes the snapshot ambiguous.
pub fn latest_version(units: Vec<PopulationUnit>) -> Result<Vec<PopulationUnit>, JoinError> {
    let latest = units
        .iter()
        .map(|u| u.version)
        .max()
        .ok_or(JoinError::NoBoundaries)?;

    let total = units.len();
    let current: Vec<PopulationUnit> = units
        .into_iter()
        .filter(|u| u.version == latest)
        .collect();

    let mut seen: HashMap<&str, usize> = HashMap::new();
    for unit in &current {
        *seen.entry(unit.name.as_str()).or_default() += 1;
    }
    if let Some((name, count)) = seen
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .min_by(|a, b| a.0.cmp(b.0))
    {
        return Err(JoinError::AmbiguousVersion {
            name: name.to_string(),
            version: latest,
            count,
        });
    }

    info!(
        "Kept {} of {} boundaries at version {}",
        current.len(),
        total,
        latest
    );
    Ok(current)
}

/// Number of units per status.
pub fn status_summary<'a>(
    units: impl IntoIterator<Item = &'a PopulationUnit>,
) -> BTreeMap<UnitStatus, usize> {
    let mut summary = BTreeMap::new();
    for unit in units {
        *summary.entry(unit.status.clone()).or_default() += 1;
    }
    summary
}
