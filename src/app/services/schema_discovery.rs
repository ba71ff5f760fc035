//! Property schema discovery across heterogeneous records
//!
//! This module maintains the mapping from property name to inferred value kind
//! while records stream past, widening kinds when records disagree. The schema
//! can be shared with an observer (for example a progress display) through a
//! mutex-guarded handle; the discovery pass is the single writer.

use indexmap::IndexMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

use crate::app::models::{PropertyKind, PropertyValue};
use crate::config::PropertyRequest;

/// Incrementally inferred column schema
///
/// A `None` kind means the property has only been seen without a concrete
/// value so far; it resolves to [`PropertyKind::Text`] when finalized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnSchema {
    columns: IndexMap<String, Option<PropertyKind>>,
    records_observed: usize,
}

impl ColumnSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record's properties into the schema
    ///
    /// New names are appended in first-seen order. Known names only ever
    /// widen, so replaying the same records always gives the same schema.
    pub fn update(&mut self, properties: &IndexMap<String, PropertyValue>) {
        for (name, value) in properties {
            let observed = value.kind();
            match self.columns.get_mut(name) {
                None => {
                    debug!("Discovered property '{}' ({:?})", name, observed);
                    self.columns.insert(name.clone(), observed);
                }
                Some(recorded) => {
                    let widened = match (*recorded, observed) {
                        (Some(current), Some(kind)) => Some(current.widen(kind)),
                        (None, kind) => kind,
                        (current, None) => current,
                    };
                    if widened != *recorded {
                        debug!(
                            "Widening property '{}' from {:?} to {:?}",
                            name, recorded, widened
                        );
                        *recorded = widened;
                    }
                }
            }
        }
        self.records_observed += 1;
    }

    /// Resolved kind for a property name
    pub fn kind_of(&self, name: &str) -> Option<PropertyKind> {
        self.columns
            .get(name)
            .map(|kind| kind.unwrap_or(PropertyKind::Text))
    }

    /// Finalized `(name, kind)` pairs in first-seen order
    pub fn resolved(&self) -> Vec<(String, PropertyKind)> {
        self.columns
            .iter()
            .map(|(name, kind)| (name.clone(), kind.unwrap_or(PropertyKind::Text)))
            .collect()
    }

    /// Finalized schema as a property request list, every column selected
    pub fn to_property_requests(&self) -> Vec<PropertyRequest> {
        self.resolved()
            .into_iter()
            .map(|(name, kind)| PropertyRequest::new(name, true, kind))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Number of parsed records folded in so far
    pub fn records_observed(&self) -> usize {
        self.records_observed
    }

    pub fn clear(&mut self) {
        self.columns.clear();
        self.records_observed = 0;
    }

    /// Get summary statistics for logging
    pub fn summary(&self) -> String {
        let count = |k: PropertyKind| {
            self.columns
                .values()
                .filter(|v| v.unwrap_or(PropertyKind::Text) == k)
                .count()
        };
        format!(
            "Discovered {} properties ({} integer, {} float, {} text) from {} records",
            self.columns.len(),
            count(PropertyKind::Integer),
            count(PropertyKind::Float),
            count(PropertyKind::Text),
            self.records_observed
        )
    }
}

/// Schema handle shared between the discovery pass and an observer
#[derive(Debug, Clone, Default)]
pub struct SharedSchema {
    inner: Arc<Mutex<ColumnSchema>>,
}

impl SharedSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the schema; a poisoned lock still yields the last written state
    pub fn lock(&self) -> MutexGuard<'_, ColumnSchema> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current schema
    pub fn snapshot(&self) -> ColumnSchema {
        self.lock().clone()
    }

    pub fn update(&self, properties: &IndexMap<String, PropertyValue>) {
        self.lock().update(properties);
    }
}
