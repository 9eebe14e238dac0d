//! Data-integrity errors raised by the pipeline stages.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CleanError {
    #[error("column '{column}' not found (available: {})", .available.join(", "))]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },
}

#[derive(Debug, Error)]
pub enum JoinError {
    #[error("no population unit boundaries to join against")]
    NoBoundaries,

    #[error("ambiguous latest boundary version {version}: unit '{name}' appears {count} times")]
    AmbiguousVersion {
        name: String,
        version: u32,
        count: usize,
    },

    #[error(
        "unresolved unit names after reconciliation; only in records: [{}]; only in boundaries: [{}]",
        .only_in_records.join(", "),
        .only_in_boundaries.join(", ")
    )]
    UnresolvedNames {
        only_in_records: Vec<String>,
        only_in_boundaries: Vec<String>,
    },
}
