//! Per-unit aggregate statistics.

use serde::{Deserialize, Serialize};

/// Density is reported per 1000 units of area.
pub const DENSITY_SCALE: f64 = 1000.0;

/// Summed statistics for one grouping key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateUnit {
    pub key: String,
    /// Sum of individual estimates
    pub count: f64,
    /// Sum of unit areas
    pub area: f64,
    /// Number of records that contributed
    pub records: usize,
    /// `count / area * 1000`, unset when the area sums to zero
    pub density: Option<f64>,
}

impl AggregateUnit {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            count: 0.0,
            area: 0.0,
            records: 0,
            density: None,
        }
    }

    /// Add one record's values. Missing values contribute zero.
    pub fn add(&mut self, count: Option<f64>, area: Option<f64>) {
        self.count += count.unwrap_or(0.0);
        self.area += area.unwrap_or(0.0);
        self.records += 1;
        self.density = density(self.count, self.area);
    }

    /// Fold another partial aggregate of the same key into this one.
    pub fn merge(&mut self, other: &AggregateUnit) {
        debug_assert_eq!(self.key, other.key);
        self.count += other.count;
        self.area += other.area;
        self.records += other.records;
        self.density = density(self.count, self.area);
    }

    pub fn has_density(&self) -> bool {
        self.density.is_some()
    }
}

/// Scaled density, `None` when `area` is zero or not finite.
pub fn density(count: f64, area: f64) -> Option<f64> {
    if area == 0.0 || !area.is_finite() || !count.is_finite() {
        return None;
    }
    Some(count / area * DENSITY_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_area_density_is_unset() {
        let mut unit = AggregateUnit::new("Stikine");
        unit.add(Some(12.0), None);
        assert_eq!(unit.count, 12.0);
        assert_eq!(unit.area, 0.0);
        assert!(unit.density.is_none());
    }

    #[test]
    fn test_density_round_trips_to_count() {
        let mut unit = AggregateUnit::new("Flathead");
        unit.add(Some(105.0), Some(3417.0));
        unit.add(None, Some(12.5));

        let density = unit.density.unwrap();
        assert!((density * unit.area / DENSITY_SCALE - unit.count).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_count_has_no_density() {
        assert_eq!(density(f64::NAN, 500.0), None);
        assert_eq!(density(f64::INFINITY, 500.0), None);
        assert_eq!(density(5.0, 500.0), Some(10.0));
    }

    #[test]
    fn test_merge_recomputes_density() {
        let mut a = AggregateUnit::new("Yahk");
        a.add(Some(5.0), None);
        let mut b = AggregateUnit::new("Yahk");
        b.add(Some(15.0), Some(2000.0));

        a.merge(&b);
        assert_eq!(a.count, 20.0);
        assert_eq!(a.records, 2);
        assert_eq!(a.density, Some(10.0));
    }
}
