//! Raw CSV tables, before any typing.

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// Header plus string cells, exactly as read from the source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Parse a headed CSV stream. Short rows are padded with empty cells and
    /// cells past the last header are dropped.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        let mut ragged = 0usize;

        for result in csv_reader.records() {
            let record = result?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            if row.len() != headers.len() {
                ragged += 1;
                row.resize(headers.len(), String::new());
            }
            rows.push(row);
        }

        if ragged > 0 {
            warn!("{} rows did not match the header width", ragged);
        }

        Ok(Self { headers, rows })
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cells of one column, top to bottom.
    pub fn column(&self, index: usize) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .map(move |row| row.get(index).map(String::as_str).unwrap_or(""))
    }

    /// A copy of the table without the columns whose names match `predicate`.
    pub fn without_columns<P>(&self, predicate: P) -> RawTable
    where
        P: Fn(&str) -> bool,
    {
        let keep: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !predicate(h))
            .map(|(i, _)| i)
            .collect();

        RawTable {
            headers: keep.iter().map(|&i| self.headers[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| {
                    keep.iter()
                        .map(|&i| row.get(i).cloned().unwrap_or_default())
                        .collect()
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Load a CSV table from disk, decompressing `.gz` files.
pub fn load_raw_table(path: &Path) -> Result<RawTable> {
    info!("Loading records from {}", path.display());

    let file = File::open(path)
        .with_context(|| format!("Failed to open records file: {}", path.display()))?;
    let reader: Box<dyn Read> = if path.extension().map_or(false, |e| e == "gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    let table = RawTable::from_reader(reader)
        .with_context(|| format!("Failed to parse records file: {}", path.display()))?;

    info!(
        "Loaded {} rows across {} columns",
        table.len(),
        table.headers.len()
    );
    Ok(table)
}
