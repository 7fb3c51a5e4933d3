//! Case-folding key index
//!
//! Decides whether a mapping compares keys case-sensitively, provides
//! case-aware views over mappings, and deep-converts mappings to
//! case-insensitive dictionaries.
//!
//! Sensitivity comes from the mapping's declared [`KeyComparison`] when it
//! has one. Otherwise it is inferred by brute force: look up case-altered
//! variants of existing keys and see whether the mapping answers them.

mod deep;
mod view;

pub use deep::to_case_insensitive;
pub use view::CaseAwareMapping;

use mallard_sdk::{KeyComparison, MapRef, Mapping};
use tracing::trace;

/// Check whether a mapping compares keys case-sensitively
pub fn is_case_sensitive(mapping: &dyn Mapping) -> bool {
    match mapping.comparison() {
        Some(comparison) => comparison.is_case_sensitive(),
        None => brute_force_is_case_sensitive(mapping),
    }
}

/// Wrap a mapping in a case-aware view.
///
/// With `None`, the view takes the mapping's own sensitivity. Wrapping a
/// view again with the same sensitivity yields an equivalent view.
pub fn wrap(mapping: &MapRef, case_sensitive: Option<bool>) -> CaseAwareMapping {
    let case_sensitive = case_sensitive.unwrap_or_else(|| is_case_sensitive(mapping.as_ref()));
    CaseAwareMapping::new(
        mapping.clone(),
        KeyComparison::from_case_sensitive(case_sensitive),
    )
}

/// Infer sensitivity for a mapping that does not declare a key comparison.
///
/// Sensitive unless a case-altered lookup of an existing key is answered.
/// An empty mapping is treated as case-insensitive; this is a convention
/// kept for compatibility and applies to empty mappings only.
fn brute_force_is_case_sensitive(mapping: &dyn Mapping) -> bool {
    let keys = mapping.keys();
    if keys.is_empty() {
        return false;
    }

    for key in &keys {
        for variant in [key.to_lowercase(), key.to_uppercase()] {
            // Both spellings stored literally: this pair proves nothing
            if variant == *key || keys.contains(&variant) {
                continue;
            }
            if mapping.contains_key(&variant) {
                trace!(key = %key, variant = %variant, "altered-case lookup matched");
                return false;
            }
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use mallard_sdk::{Dictionary, HostResult, Value};
    use parking_lot::RwLock;
    use std::sync::Arc;

    /// Mapping without a declared comparison, like a hand-rolled host map
    struct OpaqueMap {
        case_sensitive: bool,
        data: RwLock<Vec<(String, Value)>>,
    }

    impl OpaqueMap {
        fn new(case_sensitive: bool, entries: &[(&str, Value)]) -> Self {
            Self {
                case_sensitive,
                data: RwLock::new(
                    entries
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.clone()))
                        .collect(),
                ),
            }
        }

        fn matches(&self, a: &str, b: &str) -> bool {
            if self.case_sensitive {
                a == b
            } else {
                a.to_lowercase() == b.to_lowercase()
            }
        }
    }

    impl Mapping for OpaqueMap {
        fn keys(&self) -> Vec<String> {
            self.data.read().iter().map(|(k, _)| k.clone()).collect()
        }

        fn get(&self, key: &str) -> Option<Value> {
            self.data
                .read()
                .iter()
                .find(|(k, _)| self.matches(k, key))
                .map(|(_, v)| v.clone())
        }

        fn insert(&self, key: &str, value: Value) -> HostResult<()> {
            self.data.write().push((key.to_string(), value));
            Ok(())
        }
    }

    #[test]
    fn test_declared_comparison_wins() {
        assert!(is_case_sensitive(&Dictionary::new()));
        assert!(!is_case_sensitive(&Dictionary::case_insensitive()));
    }

    #[test]
    fn test_brute_force_empty_is_insensitive() {
        assert!(!is_case_sensitive(&OpaqueMap::new(true, &[])));
    }

    #[test]
    fn test_brute_force_detects_sensitive() {
        let map = OpaqueMap::new(true, &[("Foo", Value::from("bar"))]);
        assert!(is_case_sensitive(&map));
    }

    #[test]
    fn test_brute_force_detects_insensitive() {
        let map = OpaqueMap::new(false, &[("Foo", Value::from("bar"))]);
        assert!(!is_case_sensitive(&map));
    }

    #[test]
    fn test_brute_force_caseless_keys_default_to_sensitive() {
        let sensitive = OpaqueMap::new(true, &[("123", Value::from(1))]);
        assert!(is_case_sensitive(&sensitive));

        // No key has an altered case, so even a mapping that ignores case stays sensitive
        let insensitive = OpaqueMap::new(false, &[("123", Value::from(1)), ("_", Value::from(2))]);
        assert!(is_case_sensitive(&insensitive));
    }

    #[test]
    fn test_brute_force_skips_literal_pairs() {
        let map = OpaqueMap::new(
            true,
            &[("id", Value::from(1)), ("ID", Value::from(2)), ("Name", Value::from("x"))],
        );
        assert!(is_case_sensitive(&map));
    }

    #[test]
    fn test_wrap_uses_detected_sensitivity() {
        let map: MapRef = Arc::new(OpaqueMap::new(true, &[("Foo", Value::from("bar"))]));
        assert!(wrap(&map, None).is_case_sensitive());
        assert!(!wrap(&map, Some(false)).is_case_sensitive());
    }
}
