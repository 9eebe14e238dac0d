//! Plot-ready outputs handed to external renderers.

use anyhow::{Context, Result};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue};
use serde::Serialize;
use std::fs::{self, File};
use std::path::Path;
use tracing::info;

use crate::join::JoinedUnit;

/// The joined units as a GeoJSON feature collection, one feature per unit.
///
/// Undefined statistics are written as `null`.
pub fn joined_feature_collection(joined: &[JoinedUnit]) -> FeatureCollection {
    let features = joined
        .iter()
        .map(|j| {
            let unit = &j.unit;
            let mut properties = JsonObject::new();
            properties.insert("name".to_string(), JsonValue::from(unit.name.clone()));
            properties.insert("unit_id".to_string(), JsonValue::from(unit.unit_id));
            properties.insert("version".to_string(), JsonValue::from(unit.version));
            properties.insert("status".to_string(), JsonValue::from(unit.status.label()));
            properties.insert("count".to_string(), JsonValue::from(j.count()));
            properties.insert("area".to_string(), JsonValue::from(j.area()));
            properties.insert("density".to_string(), JsonValue::from(j.density()));
            properties.insert(
                "records".to_string(),
                JsonValue::from(j.aggregate.as_ref().map(|a| a.records)),
            );

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(geojson::Value::from(&unit.geometry))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

pub fn write_joined_geojson(path: &Path, joined: &[JoinedUnit]) -> Result<()> {
    let collection = joined_feature_collection(joined);
    let json = serde_json::to_string_pretty(&collection)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {} units to {}", joined.len(), path.display());
    Ok(())
}

/// Write serializable rows as a headed CSV file.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = csv::Writer::from_writer(file);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::join::boundary::tests::square;
    use crate::models::{AggregateUnit, PopulationUnit, QueryPoint, UnitStatus};
    use geojson::GeoJson;
    use std::sync::Arc;

    fn joined() -> Vec<JoinedUnit> {
        let mut stats = AggregateUnit::new("Stikine");
        stats.add(Some(12.0), None);

        vec![JoinedUnit {
            unit: Arc::new(PopulationUnit {
                unit_id: Some(3),
                name: "Stikine".to_string(),
                version: 2012,
                status: UnitStatus::Viable,
                geometry: square(0.0, 0.0, 1.0),
            }),
            aggregate: Some(stats),
        }]
    }

    #[test]
    fn test_undefined_density_is_null() {
        let collection = joined_feature_collection(&joined());
        let properties = collection.features[0].properties.as_ref().unwrap();
        assert_eq!(properties["count"], JsonValue::from(12.0));
        assert!(properties["density"].is_null());
        assert_eq!(properties["status"], JsonValue::from("Viable"));
    }

    #[test]
    fn test_geojson_round_trips_through_parser() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("joined.geojson");
        write_joined_geojson(&path, &joined()).unwrap();

        let parsed: GeoJson = fs::read_to_string(&path).unwrap().parse().unwrap();
        match parsed {
            GeoJson::FeatureCollection(fc) => assert_eq!(fc.features.len(), 1),
            other => panic!("expected a feature collection, got {:?}", other),
        }
    }

    #[test]
    fn test_points_csv_leaves_unset_names_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.csv");
        let mut inside = QueryPoint::new("a", 1.0, 2.0);
        inside.containing_unit = Some("Yahk".to_string());
        let outside = QueryPoint::new("b", 3.0, 4.0);

        write_csv(&path, &[inside, outside]).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["id,x,y,containing_unit", "a,1.0,2.0,Yahk", "b,3.0,4.0,"]);
    }
}
