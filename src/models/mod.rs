//! Core data models for the grizzly pipeline.

pub mod boundary;
pub mod point;
pub mod record;
pub mod unit;

pub use boundary::{PopulationUnit, UnitStatus};
pub use point::QueryPoint;
pub use record::{AgeRange, GroupKey, Record, ValueField};
pub use unit::{AggregateUnit, DENSITY_SCALE};
