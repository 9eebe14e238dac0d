//! Group cleaned records and sum their values per unit.

use hashbrown::HashMap;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::models::{AggregateUnit, GroupKey, Record, ValueField};

/// Which record fields feed the summed `count` and `area`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ValueFields {
    pub count: ValueField,
    pub area: ValueField,
}

impl Default for ValueFields {
    fn default() -> Self {
        Self {
            count: ValueField::Estimate,
            area: ValueField::Area,
        }
    }
}

/// One aggregate per distinct `group_key` value, in order of first
/// appearance.
///
/// Missing values count as zero; records without a key value are skipped.
/// Keys are compared by exact string equality.
pub fn aggregate(
    records: &[Record],
    group_key: &GroupKey,
    value_fields: &ValueFields,
) -> Vec<AggregateUnit> {
    let mut units: Vec<AggregateUnit> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut unkeyed = 0usize;

    for record in records {
        let Some(key) = group_key.value(record) else {
            unkeyed += 1;
            continue;
        };

        let position = match positions.get(key.as_ref()) {
            Some(&position) => position,
            None => {
                let position = units.len();
                positions.insert(key.to_string(), position);
                units.push(AggregateUnit::new(key.as_ref()));
                position
            }
        };

        units[position].add(
            value_fields.count.value(record),
            value_fields.area.value(record),
        );
    }

    if unkeyed > 0 {
        warn!("{} records have no {} and were not grouped", unkeyed, group_key);
    }

    let undefined = units.iter().filter(|u| !u.has_density()).count();
    if undefined > 0 {
        warn!("{} units have zero area, density left undefined", undefined);
    }

    info!(
        "Aggregated {} records into {} units by {}",
        records.len() - unkeyed,
        units.len(),
        group_key
    );

    units
}

/// Number of records per (key, year), sorted by key then year.
pub fn count_by_year(
    records: &[Record],
    group_key: &GroupKey,
) -> BTreeMap<(String, Option<i32>), usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        if let Some(key) = group_key.value(record) {
            *counts.entry((key.into_owned(), record.year)).or_default() += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(key: &str, estimate: Option<f64>, area: Option<f64>) -> Record {
        Record {
            unit_name: Some(key.to_string()),
            estimate,
            area,
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_values_count_as_zero() {
        let records = vec![
            record("A", Some(5.0), None),
            record("A", None, None),
            record("B", Some(3.0), None),
        ];

        let units = aggregate(&records, &GroupKey::UnitName, &ValueFields::default());
        let counts: Vec<(&str, f64, usize)> = units
            .iter()
            .map(|u| (u.key.as_str(), u.count, u.records))
            .collect();
        assert_eq!(counts, vec![("A", 5.0, 2), ("B", 3.0, 1)]);
        assert!(units.iter().all(|u| u.density.is_none()));
    }

    #[test]
    fn test_nan_and_inf_cells_do_not_poison_sums() {
        use crate::clean::{clean, ColumnMapping, RawTable};

        let raw = RawTable::from_reader(
            "GBPU_NAME,ESTIMATE,AREA_KM2\nFlathead,100,2000\nFlathead,NaN,1000\nYahk,inf,500\n"
                .as_bytes(),
        )
        .unwrap();
        let cleaned = clean(&raw, |_| false, None, None, &ColumnMapping::default()).unwrap();

        let units = aggregate(&cleaned.records, &GroupKey::UnitName, &ValueFields::default());
        let summary: Vec<(&str, f64, f64, Option<f64>)> = units
            .iter()
            .map(|u| (u.key.as_str(), u.count, u.area, u.density))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Flathead", 100.0, 3000.0, Some(100.0 / 3000.0 * 1000.0)),
                ("Yahk", 0.0, 500.0, Some(0.0)),
            ]
        );
    }

    #[test]
    fn test_split_batches_merge_to_same_result() {
        let records = vec![
            record("Flathead", Some(40.0), Some(1200.0)),
            record("Yahk", Some(7.0), Some(600.0)),
            record("Flathead", Some(65.0), Some(2217.0)),
            record("Yahk", None, Some(150.0)),
            record("Flathead", Some(1.0), None),
        ];
        let fields = ValueFields::default();

        let whole = aggregate(&records, &GroupKey::UnitName, &fields);

        let (left, right) = records.split_at(2);
        let mut merged = aggregate(left, &GroupKey::UnitName, &fields);
        for part in aggregate(right, &GroupKey::UnitName, &fields) {
            match merged.iter_mut().find(|u| u.key == part.key) {
                Some(unit) => unit.merge(&part),
                None => merged.push(part),
            }
        }

        assert_eq!(whole.len(), merged.len());
        for unit in &whole {
            let other = merged.iter().find(|u| u.key == unit.key).unwrap();
            assert!((unit.count - other.count).abs() < 1e-9);
            assert!((unit.area - other.area).abs() < 1e-9);
            assert_eq!(unit.records, other.records);
        }
    }

    #[test]
    fn test_density_round_trip() {
        let records = vec![
            record("Flathead", Some(105.0), Some(3417.0)),
            record("Yahk", Some(17.0), Some(750.0)),
        ];
        for unit in aggregate(&records, &GroupKey::UnitName, &ValueFields::default()) {
            let density = unit.density.unwrap();
            assert!((density * unit.area / 1000.0 - unit.count).abs() < 1e-9);
        }
    }

    #[test]
    fn test_stable_order_and_unkeyed_records() {
        let mut records = vec![
            record("Yahk", Some(1.0), Some(1.0)),
            record("Flathead", Some(1.0), Some(1.0)),
            record("Yahk", Some(1.0), Some(1.0)),
        ];
        records.push(Record::default());

        let first = aggregate(&records, &GroupKey::UnitName, &ValueFields::default());
        let second = aggregate(&records, &GroupKey::UnitName, &ValueFields::default());
        assert_eq!(first, second);
        let keys: Vec<&str> = first.iter().map(|u| u.key.as_str()).collect();
        assert_eq!(keys, vec!["Yahk", "Flathead"]);
        assert_eq!(first.iter().map(|u| u.records).sum::<usize>(), 3);
    }

    #[test]
    fn test_group_by_unit_id() {
        let records = vec![
            Record {
                unit_id: Some(12),
                estimate: Some(2.0),
                ..Default::default()
            },
            Record {
                unit_id: Some(12),
                estimate: Some(3.0),
                ..Default::default()
            },
        ];
        let units = aggregate(&records, &GroupKey::UnitId, &ValueFields::default());
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].key, "12");
        assert_eq!(units[0].count, 5.0);
    }

    #[test]
    fn test_count_by_year() {
        let mut records = vec![
            record("Yahk", None, None),
            record("Yahk", None, None),
            record("Flathead", None, None),
        ];
        records[0].year = Some(1980);
        records[1].year = Some(1980);
        records[2].year = Some(1976);

        let counts = count_by_year(&records, &GroupKey::UnitName);
        assert_eq!(counts.get(&("Yahk".to_string(), Some(1980))), Some(&2));
        assert_eq!(counts.get(&("Flathead".to_string(), Some(1976))), Some(&1));
        assert_eq!(counts.len(), 2);
    }
}
