//! Case-aware view over a mapping

use std::sync::Arc;

use mallard_sdk::{HostResult, KeyComparison, MapRef, Mapping, Value};

/// A mapping seen through a chosen key comparison.
///
/// The view does not copy: reads and writes go to the wrapped mapping.
/// Nested mappings read through the view come back wrapped with the same
/// comparison, unless they already declare it.
#[derive(Clone)]
pub struct CaseAwareMapping {
    inner: MapRef,
    comparison: KeyComparison,
}

impl CaseAwareMapping {
    pub(crate) fn new(inner: MapRef, comparison: KeyComparison) -> Self {
        Self { inner, comparison }
    }

    /// The wrapped mapping
    pub fn inner(&self) -> &MapRef {
        &self.inner
    }

    /// Check if lookups through this view distinguish case
    pub fn is_case_sensitive(&self) -> bool {
        self.comparison.is_case_sensitive()
    }

    /// Find the key as stored in the wrapped mapping
    pub fn resolve_key(&self, key: &str) -> Option<String> {
        let literal = self.inner.find_key(key, KeyComparison::Ordinal);
        if literal.is_some() || self.comparison.is_case_sensitive() {
            return literal;
        }
        self.inner.find_key(key, self.comparison)
    }

    /// Look up a value under this view's comparison
    pub fn look_up(&self, key: &str) -> Option<Value> {
        let value = match (self.comparison, self.inner.comparison()) {
            // The wrapped mapping already compares the way we do
            (wanted, Some(declared)) if wanted == declared => self.inner.get(key),
            _ => {
                let stored = self.resolve_key(key)?;
                self.inner.get(&stored)
            }
        }?;
        Some(self.rewrap(value))
    }

    /// Shared handle to this view
    pub fn into_ref(self) -> MapRef {
        Arc::new(self)
    }

    fn rewrap(&self, value: Value) -> Value {
        match value {
            Value::Map(nested) if nested.comparison() != Some(self.comparison) => {
                Value::Map(Arc::new(CaseAwareMapping::new(nested, self.comparison)))
            }
            other => other,
        }
    }
}

impl Mapping for CaseAwareMapping {
    fn comparison(&self) -> Option<KeyComparison> {
        Some(self.comparison)
    }

    fn keys(&self) -> Vec<String> {
        self.inner.keys()
    }

    fn get(&self, key: &str) -> Option<Value> {
        self.look_up(key)
    }

    fn insert(&self, key: &str, value: Value) -> HostResult<()> {
        let stored = self.resolve_key(key).unwrap_or_else(|| key.to_string());
        self.inner.insert(&stored, value)
    }

    fn is_read_only(&self) -> bool {
        self.inner.is_read_only()
    }

    fn contains_key(&self, key: &str) -> bool {
        self.resolve_key(key).is_some()
    }

    fn find_key(&self, key: &str, comparison: KeyComparison) -> Option<String> {
        self.inner.find_key(key, comparison)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl std::fmt::Debug for CaseAwareMapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaseAwareMapping")
            .field("comparison", &self.comparison)
            .field("keys", &self.inner.keys())
            .finish()
    }
}
