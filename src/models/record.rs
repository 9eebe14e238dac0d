//! Cleaned mortality / population records.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Age class bounds split out of a raw range such as `10-14` or `15+`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeRange {
    pub minimum_age: u32,
    /// Unset for open-ended classes (`15+`)
    pub maximum_age: Option<u32>,
}

impl AgeRange {
    pub fn is_open_ended(&self) -> bool {
        self.maximum_age.is_none()
    }
}

/// A single observation row after cleaning.
///
/// Every field that the source may leave blank is optional; missing values
/// are never encoded as sentinel numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Numeric population unit id (GBPU id)
    pub unit_id: Option<u32>,
    /// Population unit name, the join key against the boundary dataset
    pub unit_name: Option<String>,
    /// Management unit (MU) the observation falls in
    pub sub_unit: Option<String>,
    pub year: Option<i32>,
    /// Raw age class as it appeared in the source (`10-14`, `15+`)
    pub age_class: Option<String>,
    pub age_range: Option<AgeRange>,
    /// Individual population estimate
    pub estimate: Option<f64>,
    /// Area of the unit the estimate covers (km²)
    pub area: Option<f64>,
    /// Columns not mapped onto a typed field
    pub attributes: BTreeMap<String, String>,
}

/// Categorical field records are grouped on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    UnitId,
    #[default]
    UnitName,
    SubUnit,
    /// An unmapped column, looked up in [`Record::attributes`]
    Attribute(String),
}

impl GroupKey {
    /// The key value for a record, `None` when the record has no value.
    pub fn value<'a>(&self, record: &'a Record) -> Option<Cow<'a, str>> {
        match self {
            GroupKey::UnitId => record.unit_id.map(|id| Cow::Owned(id.to_string())),
            GroupKey::UnitName => record.unit_name.as_deref().map(Cow::Borrowed),
            GroupKey::SubUnit => record.sub_unit.as_deref().map(Cow::Borrowed),
            GroupKey::Attribute(column) => record
                .attributes
                .get(column)
                .map(|v| Cow::Borrowed(v.as_str())),
        }
    }
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupKey::UnitId => write!(f, "unit_id"),
            GroupKey::UnitName => write!(f, "unit_name"),
            GroupKey::SubUnit => write!(f, "sub_unit"),
            GroupKey::Attribute(column) => write!(f, "attribute:{}", column),
        }
    }
}

/// Numeric field that feeds a sum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueField {
    Estimate,
    Area,
    /// An unmapped column parsed as a number
    Attribute(String),
}

impl ValueField {
    pub fn value(&self, record: &Record) -> Option<f64> {
        match self {
            ValueField::Estimate => record.estimate,
            ValueField::Area => record.area,
            ValueField::Attribute(column) => record
                .attributes
                .get(column)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_key_values() {
        let mut record = Record {
            unit_id: Some(12),
            unit_name: Some("Flathead".to_string()),
            ..Default::default()
        };
        record
            .attributes
            .insert("REGION".to_string(), "Kootenay".to_string());

        assert_eq!(GroupKey::UnitId.value(&record).as_deref(), Some("12"));
        assert_eq!(GroupKey::UnitName.value(&record).as_deref(), Some("Flathead"));
        assert_eq!(GroupKey::SubUnit.value(&record), None);
        assert_eq!(
            GroupKey::Attribute("REGION".to_string())
                .value(&record)
                .as_deref(),
            Some("Kootenay")
        );
    }

    #[test]
    fn test_attribute_value_field() {
        let mut record = Record::default();
        record
            .attributes
            .insert("KILLS".to_string(), " 4 ".to_string());
        record
            .attributes
            .insert("BAD".to_string(), "n/a".to_string());
        record
            .attributes
            .insert("OVERFLOW".to_string(), "inf".to_string());

        assert_eq!(
            ValueField::Attribute("KILLS".to_string()).value(&record),
            Some(4.0)
        );
        assert_eq!(ValueField::Attribute("BAD".to_string()).value(&record), None);
        assert_eq!(
            ValueField::Attribute("OVERFLOW".to_string()).value(&record),
            None
        );
        assert_eq!(ValueField::Estimate.value(&record), None);
    }
}
