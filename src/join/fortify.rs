//! Flatten joined geometries into plot-ready vertex rows.

use serde::Serialize;

use super::JoinedUnit;

/// One boundary vertex, in drawing order within its ring.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FortifiedVertex {
    pub unit: String,
    pub status: String,
    /// Polygon index within the unit's multipolygon
    pub part: usize,
    /// 0 for the exterior ring, 1.. for holes
    pub ring: usize,
    pub hole: bool,
    /// `unit.part.ring`, one path per group
    pub group: String,
    pub order: usize,
    pub x: f64,
    pub y: f64,
    pub density: Option<f64>,
}

pub fn fortify(joined: &[JoinedUnit]) -> Vec<FortifiedVertex> {
    let mut vertices = Vec::new();

    for joined_unit in joined {
        let unit = &joined_unit.unit;
        let density = joined_unit.density();

        for (part, polygon) in unit.geometry.iter().enumerate() {
            let rings = std::iter::once(polygon.exterior()).chain(polygon.interiors());

            for (ring, line) in rings.enumerate() {
                let group = format!("{}.{}.{}", unit.name, part, ring);
                for (order, coord) in line.coords().enumerate() {
                    vertices.push(FortifiedVertex {
                        unit: unit.name.clone(),
                        status: unit.status.to_string(),
                        part,
                        ring,
                        hole: ring > 0,
                        group: group.clone(),
                        order,
                        x: coord.x,
                        y: coord.y,
                        density,
                    });
                }
            }
        }
    }

    vertices
}
