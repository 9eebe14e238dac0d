//! Spatial index for fast population unit lookups.

use geo::{Contains, Point};
use rstar::{RTree, RTreeObject, AABB};
use std::sync::Arc;
use tracing::{info, warn};

use crate::models::PopulationUnit;

/// Wrapper for R-tree indexing of population units
#[derive(Clone)]
pub struct IndexedUnit {
    pub unit: Arc<PopulationUnit>,
    /// Position in the input, used to order overlapping matches
    position: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedUnit {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedUnit {
    pub fn new(unit: Arc<PopulationUnit>, position: usize) -> Option<Self> {
        let (min_x, min_y, max_x, max_y) = unit.bbox()?;
        Some(Self {
            unit,
            position,
            envelope: AABB::from_corners([min_x, min_y], [max_x, max_y]),
        })
    }
}

/// Spatial index for population units using R-tree
pub struct BoundaryIndex {
    tree: RTree<IndexedUnit>,
}

impl BoundaryIndex {
    /// Build spatial index from population units
    pub fn build(units: impl IntoIterator<Item = Arc<PopulationUnit>>) -> Self {
        let indexed: Vec<IndexedUnit> = units
            .into_iter()
            .enumerate()
            .filter_map(|(position, unit)| {
                let name = unit.name.clone();
                let indexed = IndexedUnit::new(unit, position);
                if indexed.is_none() {
                    warn!("Unit '{}' has an empty geometry, not indexed", name);
                }
                indexed
            })
            .collect();

        let tree = RTree::bulk_load(indexed);
        info!("Spatial index built with {} units", tree.size());

        Self { tree }
    }

    /// Find all units containing a point, in input order
    pub fn lookup_all(&self, x: f64, y: f64) -> Vec<Arc<PopulationUnit>> {
        let point = Point::new(x, y);
        let query_envelope = AABB::from_point([x, y]);

        // Envelope candidates from the R-tree, then exact containment
        let mut hits: Vec<&IndexedUnit> = self
            .tree
            .locate_in_envelope_intersecting(&query_envelope)
            .filter(|iu| iu.unit.geometry.contains(&point))
            .collect();
        hits.sort_by_key(|iu| iu.position);

        hits.into_iter().map(|iu| Arc::clone(&iu.unit)).collect()
    }

    /// Find the unit containing a point.
    ///
    /// Units are assumed not to overlap; if they do, the one earliest in the
    /// input wins. A point lying exactly on a boundary is not contained by
    /// that unit (`geo::Contains` excludes the boundary).
    pub fn lookup(&self, x: f64, y: f64) -> Option<Arc<PopulationUnit>> {
        let point = Point::new(x, y);
        let query_envelope = AABB::from_point([x, y]);

        self.tree
            .locate_in_envelope_intersecting(&query_envelope)
            .filter(|iu| iu.unit.geometry.contains(&point))
            .min_by_key(|iu| iu.position)
            .map(|iu| Arc::clone(&iu.unit))
    }

    /// Get total number of indexed units
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
