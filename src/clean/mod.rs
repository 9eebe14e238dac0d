//! Tabular cleaning: raw CSV rows to typed [`Record`]s.
//!
//! Drops placeholder columns, splits the age class range into numeric
//! bounds, and lifts the dataset-level notes out of the annotation column
//! into a single string.

mod range;
mod table;

pub use range::{extract_number, parse_age_range, RANGE_SEPARATOR};
pub use table::{load_raw_table, RawTable};

use hashbrown::HashMap;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

use crate::error::CleanError;
use crate::models::Record;

/// Separator used when joining the annotation rows.
pub const ANNOTATION_DELIMITER: &str = "; ";

/// Which source columns feed each typed record field.
///
/// A configured column that the table lacks leaves the field unset.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub unit_id: Option<String>,
    pub unit_name: Option<String>,
    pub sub_unit: Option<String>,
    pub year: Option<String>,
    pub estimate: Option<String>,
    pub area: Option<String>,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            unit_id: Some("GBPU_ID".to_string()),
            unit_name: Some("GBPU_NAME".to_string()),
            sub_unit: Some("MU".to_string()),
            year: Some("HUNT_YEAR".to_string()),
            estimate: Some("ESTIMATE".to_string()),
            area: Some("AREA_KM2".to_string()),
        }
    }
}

/// The leading rows of one column that hold notes about the whole dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRows {
    pub column: String,
    pub rows: usize,
}

/// Output of [`clean`].
#[derive(Debug, Clone, Default)]
pub struct CleanedRecords {
    pub records: Vec<Record>,
    /// Dataset notes, joined with `"; "`
    pub annotation: String,
    /// Columns kept in the per-record table
    pub columns: Vec<String>,
}

/// Cells that mean "no value".
pub fn is_missing(cell: &str) -> bool {
    let cell = cell.trim();
    cell.is_empty()
        || cell.eq_ignore_ascii_case("na")
        || cell.eq_ignore_ascii_case("n/a")
        || cell.eq_ignore_ascii_case("nan")
}

/// Auto-generated index columns: blank headers, `X`, `X.1`, `Unnamed: 0`.
pub fn is_placeholder_column(name: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^(X(\.\d+)?|Unnamed: \d+)$").expect("valid regex"));
    let name = name.trim();
    name.is_empty() || re.is_match(name)
}

/// Clean a raw table into typed records plus the dataset annotation.
///
/// `range_column`, when given, must exist after dropping columns, as must
/// the `metadata` column. The input table is left untouched.
pub fn clean<P>(
    raw: &RawTable,
    drop_column: P,
    range_column: Option<&str>,
    metadata: Option<&MetadataRows>,
    mapping: &ColumnMapping,
) -> Result<CleanedRecords, CleanError>
where
    P: Fn(&str) -> bool,
{
    let table = raw.without_columns(drop_column);
    let dropped = raw.headers.len() - table.headers.len();
    if dropped > 0 {
        info!("Dropped {} columns", dropped);
    }

    let require = |column: &str| {
        table
            .column_index(column)
            .ok_or_else(|| CleanError::MissingColumn {
                column: column.to_string(),
                available: table.headers.clone(),
            })
    };

    let range_idx = range_column.map(require).transpose()?;
    let annotation_idx = metadata.map(|m| require(&m.column)).transpose()?;

    let annotation = match (metadata, annotation_idx) {
        (Some(meta), Some(idx)) => table
            .column(idx)
            .take(meta.rows)
            .filter(|cell| !is_missing(cell))
            .map(str::trim)
            .collect::<Vec<_>>()
            .join(ANNOTATION_DELIMITER),
        _ => String::new(),
    };

    let lookup = |column: &Option<String>| {
        let name = column.as_deref()?;
        let idx = table.column_index(name);
        if idx.is_none() {
            debug!("Mapped column '{}' not present, field left unset", name);
        }
        idx
    };

    let unit_id_idx = lookup(&mapping.unit_id);
    let unit_name_idx = lookup(&mapping.unit_name);
    let sub_unit_idx = lookup(&mapping.sub_unit);
    let year_idx = lookup(&mapping.year);
    let estimate_idx = lookup(&mapping.estimate);
    let area_idx = lookup(&mapping.area);

    let typed: Vec<usize> = [
        unit_id_idx,
        unit_name_idx,
        sub_unit_idx,
        year_idx,
        estimate_idx,
        area_idx,
        range_idx,
        annotation_idx,
    ]
    .into_iter()
    .flatten()
    .collect();

    // Column name -> number of unreadable cells
    let mut malformed: HashMap<&str, usize> = HashMap::new();
    let mut records = Vec::with_capacity(table.len());

    for row in &table.rows {
        let cell = |idx: Option<usize>| {
            idx.and_then(|i| row.get(i))
                .map(|c| c.trim())
                .filter(|c| !is_missing(c))
        };

        let unit_name = cell(unit_name_idx).map(str::to_string);
        let sub_unit = cell(sub_unit_idx).map(str::to_string);

        let unit_id = parse_cell(&table, row, unit_id_idx, &mut malformed);
        let year = parse_cell(&table, row, year_idx, &mut malformed);
        let estimate = parse_finite(&table, row, estimate_idx, &mut malformed);
        let area = parse_finite(&table, row, area_idx, &mut malformed);

        let age_class = cell(range_idx).map(str::to_string);
        let age_range = age_class.as_deref().and_then(parse_age_range);
        if let (Some(i), Some(_), None) = (range_idx, &age_class, &age_range) {
            *malformed.entry(table.headers[i].as_str()).or_default() += 1;
        }

        let attributes: BTreeMap<String, String> = table
            .headers
            .iter()
            .enumerate()
            .filter(|(i, _)| !typed.contains(i))
            .filter_map(|(i, header)| {
                cell(Some(i)).map(|value| (header.clone(), value.to_string()))
            })
            .collect();

        records.push(Record {
            unit_id,
            unit_name,
            sub_unit,
            year,
            age_class,
            age_range,
            estimate,
            area,
            attributes,
        });
    }

    for (column, count) in &malformed {
        warn!("{} unreadable values in column '{}' left unset", count, column);
    }

    info!("Cleaned {} records", records.len());
    if !annotation.is_empty() {
        debug!("Dataset annotation: {}", annotation);
    }

    let columns = table
        .headers
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != annotation_idx)
        .map(|(_, h)| h.clone())
        .collect();

    Ok(CleanedRecords {
        records,
        annotation,
        columns,
    })
}

/// Parse one cell, counting unreadable values against their column.
fn parse_cell<'t, T: FromStr>(
    table: &'t RawTable,
    row: &[String],
    idx: Option<usize>,
    malformed: &mut HashMap<&'t str, usize>,
) -> Option<T> {
    let i = idx?;
    let text = row.get(i).map(|c| c.trim()).filter(|c| !is_missing(c))?;
    match text.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            *malformed.entry(table.headers[i].as_str()).or_default() += 1;
            None
        }
    }
}

/// Like [`parse_cell`], but `inf` and friends count as malformed.
fn parse_finite<'t>(
    table: &'t RawTable,
    row: &[String],
    idx: Option<usize>,
    malformed: &mut HashMap<&'t str, usize>,
) -> Option<f64> {
    let value: f64 = parse_cell(table, row, idx, malformed)?;
    if value.is_finite() {
        return Some(value);
    }
    if let Some(i) = idx {
        *malformed.entry(table.headers[i].as_str()).or_default() += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const MORTALITY: &str = "\
X,GBPU_ID,GBPU_NAME,MU,HUNT_YEAR,AGE_CLASS,KILL_CODE,NOTES
1,12,Flathead,4-1,1976,10-14,Hunter Kill,Data from the compulsory inspection program
2,12,Flathead,4-1,1977,15+,Hunter Kill,Age classes are estimates
3,7,Yahk,4-2,NA,'3-4,Animal Control,
4,7,Yahk,4-2,1980,Unknown,Road Kill,
";

    fn metadata() -> MetadataRows {
        MetadataRows {
            column: "NOTES".to_string(),
            rows: 3,
        }
    }

    fn cleaned() -> CleanedRecords {
        let raw = RawTable::from_reader(MORTALITY.as_bytes()).unwrap();
        clean(
            &raw,
            is_placeholder_column,
            Some("AGE_CLASS"),
            Some(&metadata()),
            &ColumnMapping::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_record_count_preserved() {
        let raw = RawTable::from_reader(MORTALITY.as_bytes()).unwrap();
        let out = cleaned();
        assert_eq!(out.records.len(), raw.len());
    }

    #[test]
    fn test_placeholder_and_annotation_columns_removed() {
        let out = cleaned();
        assert!(!out.columns.contains(&"X".to_string()));
        assert!(!out.columns.contains(&"NOTES".to_string()));
        assert!(out.columns.contains(&"AGE_CLASS".to_string()));
        for record in &out.records {
            assert!(!record.attributes.contains_key("X"));
            assert!(!record.attributes.contains_key("NOTES"));
        }
        assert_eq!(
            out.records[0].attributes.get("KILL_CODE").map(String::as_str),
            Some("Hunter Kill")
        );
    }

    #[test]
    fn test_annotation_joined() {
        assert_eq!(
            cleaned().annotation,
            "Data from the compulsory inspection program; Age classes are estimates"
        );
    }

    #[test]
    fn test_age_ranges() {
        let out = cleaned();
        let ranges: Vec<_> = out
            .records
            .iter()
            .map(|r| r.age_range.map(|a| (a.minimum_age, a.maximum_age)))
            .collect();
        assert_eq!(
            ranges,
            vec![
                Some((10, Some(14))),
                Some((15, None)),
                Some((3, Some(4))),
                None
            ]
        );
        // Raw text is kept even when it does not parse
        assert_eq!(out.records[3].age_class.as_deref(), Some("Unknown"));
    }

    #[test]
    fn test_typed_fields() {
        let out = cleaned();
        let first = &out.records[0];
        assert_eq!(first.unit_id, Some(12));
        assert_eq!(first.unit_name.as_deref(), Some("Flathead"));
        assert_eq!(first.sub_unit.as_deref(), Some("4-1"));
        assert_eq!(first.year, Some(1976));
        assert_eq!(out.records[2].year, None);
        // No estimate column in this table
        assert!(out.records.iter().all(|r| r.estimate.is_none()));
    }

    #[test]
    fn test_missing_range_column_is_an_error() {
        let raw = RawTable::from_reader(MORTALITY.as_bytes()).unwrap();
        let err = clean(
            &raw,
            |h| is_placeholder_column(h) || h == "AGE_CLASS",
            Some("AGE_CLASS"),
            None,
            &ColumnMapping::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CleanError::MissingColumn { ref column, .. } if column == "AGE_CLASS"));
    }

    #[test]
    fn test_non_finite_numbers_are_unset() {
        let raw = RawTable::from_reader(
            "GBPU_NAME,ESTIMATE,AREA_KM2\nFlathead,100,2000\nFlathead,NaN,1000\nYahk,inf,-Infinity\n"
                .as_bytes(),
        )
        .unwrap();
        let out = clean(&raw, |_| false, None, None, &ColumnMapping::default()).unwrap();

        let values: Vec<_> = out.records.iter().map(|r| (r.estimate, r.area)).collect();
        assert_eq!(
            values,
            vec![
                (Some(100.0), Some(2000.0)),
                (None, Some(1000.0)),
                (None, None)
            ]
        );
        assert!(is_missing(" nan "));
    }

    #[test]
    fn test_placeholder_names() {
        assert!(is_placeholder_column("X"));
        assert!(is_placeholder_column("X.1"));
        assert!(is_placeholder_column("Unnamed: 0"));
        assert!(is_placeholder_column(" "));
        assert!(!is_placeholder_column("MU"));
        assert!(!is_placeholder_column("X_COORD"));
    }
}
