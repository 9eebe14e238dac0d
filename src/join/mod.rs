//! Spatial join of unit aggregates onto population unit boundaries.
//!
//! Selects the authoritative boundary revision, reconciles unit names
//! between the two datasets, merges the aggregates onto the polygons, and
//! classifies query points with an R-tree backed point-in-polygon index.

pub(crate) mod boundary;
mod classify;
mod fortify;
mod index;
mod reconcile;

pub use boundary::{
    latest_version, load_population_units, population_units_from_geojson, status_summary,
    BoundaryFields,
};
pub use classify::{classify, load_query_points, within_units, PointFields};
pub use fortify::{fortify, FortifiedVertex};
pub use index::BoundaryIndex;
pub use reconcile::{reconcile, NameDifference, NamingMap};

use hashbrown::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::error::JoinError;
use crate::models::{AggregateUnit, PopulationUnit};

/// A boundary with the statistics of its matching aggregate, if any.
#[derive(Debug, Clone)]
pub struct JoinedUnit {
    pub unit: Arc<PopulationUnit>,
    pub aggregate: Option<AggregateUnit>,
}

impl JoinedUnit {
    pub fn count(&self) -> Option<f64> {
        self.aggregate.as_ref().map(|a| a.count)
    }

    pub fn area(&self) -> Option<f64> {
        self.aggregate.as_ref().map(|a| a.area)
    }

    pub fn density(&self) -> Option<f64> {
        self.aggregate.as_ref().and_then(|a| a.density)
    }
}

/// Attach each boundary's aggregate by exact name match.
///
/// Every boundary is kept; those without an aggregate carry no statistics.
pub fn join(units: &[AggregateUnit], boundaries: Vec<PopulationUnit>) -> Vec<JoinedUnit> {
    let by_key: HashMap<&str, &AggregateUnit> =
        units.iter().map(|u| (u.key.as_str(), u)).collect();

    let joined: Vec<JoinedUnit> = boundaries
        .into_iter()
        .map(|unit| JoinedUnit {
            aggregate: by_key.get(unit.name.as_str()).map(|a| (*a).clone()),
            unit: Arc::new(unit),
        })
        .collect();

    let matched = joined.iter().filter(|j| j.aggregate.is_some()).count();
    info!("Joined {} of {} boundaries", matched, joined.len());
    joined
}

/// Latest boundary version, name reconciliation, then [`join`].
pub fn reconcile_and_join(
    units: Vec<AggregateUnit>,
    boundaries: Vec<PopulationUnit>,
    naming: &NamingMap,
) -> Result<Vec<JoinedUnit>, JoinError> {
    let boundaries = latest_version(boundaries)?;
    let units = reconcile(units, &boundaries, naming)?;
    Ok(join(&units, boundaries))
}
