use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::aggregate::ValueFields;
use crate::clean::{is_placeholder_column, ColumnMapping, MetadataRows};
use crate::join::{BoundaryFields, NamingMap, PointFields};
use crate::models::GroupKey;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub inputs: InputConfig,
    pub outputs: OutputConfig,
    pub cleaning: CleaningConfig,
    pub columns: ColumnMapping,
    pub aggregation: AggregationConfig,
    pub boundaries: BoundaryFields,
    pub points: PointFields,
    /// Record-side unit name -> boundary unit name
    pub naming: NamingMap,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct InputConfig {
    pub records: Option<PathBuf>,
    pub boundaries: Option<PathBuf>,
    pub points: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct OutputConfig {
    pub joined: Option<PathBuf>,
    pub fortified: Option<PathBuf>,
    pub aggregates: Option<PathBuf>,
    pub points: Option<PathBuf>,
    /// Only write points that fall inside a unit
    pub points_within_only: bool,
}

impl OutputConfig {
    /// Default file names under `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            joined: Some(dir.join("units.geojson")),
            fortified: Some(dir.join("units_fortified.csv")),
            aggregates: Some(dir.join("aggregates.csv")),
            points: Some(dir.join("points_classified.csv")),
            points_within_only: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CleaningConfig {
    /// Drop blank and auto-index (`X`, `X.1`, `Unnamed: 0`) columns
    pub drop_placeholders: bool,
    pub drop_columns: Vec<String>,
    pub range_column: Option<String>,
    pub annotation_column: Option<String>,
    pub annotation_rows: usize,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            drop_placeholders: true,
            drop_columns: Vec::new(),
            range_column: Some("AGE_CLASS".to_string()),
            annotation_column: None,
            annotation_rows: 0,
        }
    }
}

impl CleaningConfig {
    pub fn drops(&self, column: &str) -> bool {
        (self.drop_placeholders && is_placeholder_column(column))
            || self.drop_columns.iter().any(|c| c == column)
    }

    pub fn metadata_rows(&self) -> Option<MetadataRows> {
        self.annotation_column.as_ref().map(|column| MetadataRows {
            column: column.clone(),
            rows: self.annotation_rows,
        })
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AggregationConfig {
    pub group_key: GroupKey,
    pub value_fields: ValueFields,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}
