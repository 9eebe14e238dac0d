//! Reconcile unit names between the record table and the boundaries.

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use crate::error::JoinError;
use crate::models::{AggregateUnit, PopulationUnit};

/// Explicit corrections from record-side unit names to boundary names,
/// e.g. `"Kettle Granby" -> "Kettle-Granby"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct NamingMap(BTreeMap<String, String>);

impl NamingMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Option<String> {
        self.0.insert(from.into(), to.into())
    }

    pub fn remove(&mut self, from: &str) -> Option<String> {
        self.0.remove(from)
    }

    /// The corrected name, or `name` itself when there is no entry.
    pub fn apply<'a>(&'a self, name: &'a str) -> &'a str {
        self.0.get(name).map(String::as_str).unwrap_or(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for NamingMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Symmetric difference between record-side keys and boundary names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameDifference {
    pub only_in_records: BTreeSet<String>,
    pub only_in_boundaries: BTreeSet<String>,
}

impl NameDifference {
    pub fn between<'a, 'b>(
        record_keys: impl IntoIterator<Item = &'a str>,
        boundary_names: impl IntoIterator<Item = &'b str>,
    ) -> Self {
        let records: BTreeSet<&str> = record_keys.into_iter().collect();
        let boundaries: BTreeSet<&str> = boundary_names.into_iter().collect();

        Self {
            only_in_records: records
                .difference(&boundaries)
                .map(|s| s.to_string())
                .collect(),
            only_in_boundaries: boundaries
                .difference(&records)
                .map(|s| s.to_string())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.only_in_records.is_empty() && self.only_in_boundaries.is_empty()
    }

    pub fn into_error(self) -> JoinError {
        JoinError::UnresolvedNames {
            only_in_records: self.only_in_records.into_iter().collect(),
            only_in_boundaries: self.only_in_boundaries.into_iter().collect(),
        }
    }
}

/// Rename aggregate keys through `naming` so they match the boundary names.
///
/// Keys that map onto the same boundary name are merged. Fails with the
/// remaining unmatched names on both sides if the two sets still differ.
pub fn reconcile(
    units: Vec<AggregateUnit>,
    boundaries: &[PopulationUnit],
    naming: &NamingMap,
) -> Result<Vec<AggregateUnit>, JoinError> {
    let boundary_names = || boundaries.iter().map(|b| b.name.as_str());

    let before = NameDifference::between(
        units.iter().map(|u| u.key.as_str()),
        boundary_names(),
    );
    if !before.is_empty() {
        debug!(
            "Names before reconciliation: only in records {:?}, only in boundaries {:?}",
            before.only_in_records, before.only_in_boundaries
        );
    }

    let mut renamed: Vec<AggregateUnit> = Vec::with_capacity(units.len());
    let mut corrections = 0usize;

    for mut unit in units {
        let target = naming.apply(&unit.key);
        if target != unit.key {
            debug!("Renaming '{}' to '{}'", unit.key, target);
            unit.key = target.to_string();
            corrections += 1;
        }

        match renamed.iter_mut().find(|u| u.key == unit.key) {
            Some(existing) => existing.merge(&unit),
            None => renamed.push(unit),
        }
    }

    let after = NameDifference::between(
        renamed.iter().map(|u| u.key.as_str()),
        boundary_names(),
    );
    if !after.is_empty() {
        return Err(after.into_error());
    }

    info!(
        "Reconciled {} unit names ({} corrected)",
        renamed.len(),
        corrections
    );
    Ok(renamed)
}
