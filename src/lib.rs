//! Grizzly - grizzly bear population records joined onto population unit
//! boundaries.
//!
//! The pipeline runs in three stages: [`clean`] turns raw CSV rows into
//! typed records, [`aggregate`] sums them per population unit, and [`join`]
//! merges the sums onto the unit polygons and classifies query points.

pub mod aggregate;
pub mod clean;
pub mod config;
pub mod error;
pub mod join;
pub mod models;
pub mod output;

pub use error::{CleanError, JoinError};
pub use models::{AggregateUnit, PopulationUnit, QueryPoint, Record, UnitStatus};
