use serde::{Deserialize, Serialize};

/// A location to classify against the population unit boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPoint {
    pub id: String,
    pub x: f64,
    pub y: f64,
    /// Name of the unit containing the point, set by classification
    #[serde(default)]
    pub containing_unit: Option<String>,
}

impl QueryPoint {
    pub fn new(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            containing_unit: None,
        }
    }

    pub fn is_classified(&self) -> bool {
        self.containing_unit.is_some()
    }
}
