//! Population unit boundaries.

use geo::{BoundingRect, MultiPolygon};
use serde::{Deserialize, Serialize};

/// Conservation status of a population unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    Viable,
    Threatened,
    Extirpated,
    /// Any other label carried by the source, kept verbatim
    Other(String),
}

impl UnitStatus {
    /// Parse a status label, case-insensitively.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "viable" => UnitStatus::Viable,
            "threatened" => UnitStatus::Threatened,
            "extirpated" => UnitStatus::Extirpated,
            _ => UnitStatus::Other(label.trim().to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            UnitStatus::Viable => "Viable",
            UnitStatus::Threatened => "Threatened",
            UnitStatus::Extirpated => "Extirpated",
            UnitStatus::Other(label) => label,
        }
    }
}

impl std::fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A single population unit polygon with its attributes
#[derive(Debug, Clone)]
pub struct PopulationUnit {
    pub unit_id: Option<u32>,
    pub name: String,
    /// Boundary revision, e.g. `2012`
    pub version: u32,
    pub status: UnitStatus,
    pub geometry: MultiPolygon<f64>,
}

impl PopulationUnit {
    /// Get the bounding box of this boundary
    pub fn bbox(&self) -> Option<(f64, f64, f64, f64)> {
        self.geometry
            .bounding_rect()
            .map(|rect| (rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }
}
