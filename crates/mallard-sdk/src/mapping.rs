//! String-keyed mappings
//!
//! `Mapping` is the interface the engine programs against. A mapping may or
//! may not declare how it compares keys; `Dictionary` always does.

use std::borrow::Cow;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::error::{HostError, HostResult};
use crate::value::Value;

/// Key comparison policy of a mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyComparison {
    /// Keys match only when literally equal
    #[default]
    Ordinal,
    /// Keys match when equal ignoring case
    IgnoreCase,
}

impl KeyComparison {
    /// Policy for the given sensitivity
    pub fn from_case_sensitive(case_sensitive: bool) -> Self {
        if case_sensitive {
            KeyComparison::Ordinal
        } else {
            KeyComparison::IgnoreCase
        }
    }

    /// Check if this policy distinguishes case
    pub fn is_case_sensitive(self) -> bool {
        self == KeyComparison::Ordinal
    }

    /// Compare two keys under this policy
    pub fn keys_match(self, a: &str, b: &str) -> bool {
        match self {
            KeyComparison::Ordinal => a == b,
            KeyComparison::IgnoreCase => a == b || a.to_lowercase() == b.to_lowercase(),
        }
    }

    /// Normalise a key for hashing under this policy
    pub fn fold(self, key: &str) -> Cow<'_, str> {
        match self {
            KeyComparison::Ordinal => Cow::Borrowed(key),
            KeyComparison::IgnoreCase => Cow::Owned(key.to_lowercase()),
        }
    }
}

/// A string-keyed mapping from key to value.
///
/// Implementations use interior mutability: writes go through `&self`, so
/// a mapping can be shared as `Arc<dyn Mapping>` between a caller and any
/// number of adapters.
pub trait Mapping: Send + Sync {
    /// Key comparison policy, if the mapping declares one
    fn comparison(&self) -> Option<KeyComparison> {
        None
    }

    /// Keys in iteration order
    fn keys(&self) -> Vec<String>;

    /// Look up a value using the mapping's own key comparison
    fn get(&self, key: &str) -> Option<Value>;

    /// Insert or replace a value
    fn insert(&self, key: &str, value: Value) -> HostResult<()>;

    /// Check if the mapping refuses writes
    fn is_read_only(&self) -> bool {
        false
    }

    /// Check if a key is present using the mapping's own key comparison
    fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Stored spelling of the first key matching `key` under `comparison`,
    /// which may differ from the mapping's own
    fn find_key(&self, key: &str, comparison: KeyComparison) -> Option<String> {
        self.keys()
            .into_iter()
            .find(|k| comparison.keys_match(k, key))
    }

    /// Number of entries
    fn len(&self) -> usize {
        self.keys().len()
    }

    /// Check if the mapping has no entries
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all entries in iteration order
    fn entries(&self) -> Vec<(String, Value)> {
        self.keys()
            .into_iter()
            .filter_map(|k| self.get(&k).map(|v| (k, v)))
            .collect()
    }
}

#[derive(Default)]
struct DictionaryInner {
    /// Folded key → position in `entries`
    index: FxHashMap<String, usize>,
    /// Original key and value, in insertion order
    entries: Vec<(String, Value)>,
}

/// Insertion-ordered mapping with a declared key comparison policy
pub struct Dictionary {
    comparison: KeyComparison,
    read_only: bool,
    inner: RwLock<DictionaryInner>,
}

impl Dictionary {
    /// Create an empty case-sensitive dictionary
    pub fn new() -> Self {
        Self::with_comparison(KeyComparison::Ordinal)
    }

    /// Create an empty case-insensitive dictionary
    pub fn case_insensitive() -> Self {
        Self::with_comparison(KeyComparison::IgnoreCase)
    }

    /// Create an empty dictionary with the given key comparison
    pub fn with_comparison(comparison: KeyComparison) -> Self {
        Self {
            comparison,
            read_only: false,
            inner: RwLock::new(DictionaryInner::default()),
        }
    }

    /// Create a dictionary from entries. Later entries replace earlier ones
    /// whose keys match under `comparison`.
    pub fn from_entries<I, K, V>(comparison: KeyComparison, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let dict = Self::with_comparison(comparison);
        {
            let mut inner = dict.inner.write();
            for (key, value) in entries {
                Self::put(comparison, &mut inner, key.as_ref(), value.into());
            }
        }
        dict
    }

    /// Freeze the dictionary: all later writes fail with `ReadOnly`
    pub fn into_read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Remove a key, returning its value
    pub fn remove(&self, key: &str) -> HostResult<Option<Value>> {
        self.check_writable(key)?;
        let mut inner = self.inner.write();
        let folded = self.comparison.fold(key).into_owned();
        let Some(position) = inner.index.remove(&folded) else {
            return Ok(None);
        };
        let (_, value) = inner.entries.remove(position);
        for slot in inner.index.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }
        Ok(Some(value))
    }

    /// Find the value for `key`, or insert the one produced by `generate`.
    ///
    /// The write lock is held across the lookup and the insert, so two
    /// callers racing on the same key observe a single generated value.
    pub fn find_or_add<F>(&self, key: &str, generate: F) -> HostResult<Value>
    where
        F: FnOnce() -> Value,
    {
        let mut inner = self.inner.write();
        let folded = self.comparison.fold(key);
        if let Some(&position) = inner.index.get(folded.as_ref()) {
            return Ok(inner.entries[position].1.clone());
        }
        self.check_writable(key)?;
        let value = generate();
        Self::put(self.comparison, &mut inner, key, value.clone());
        Ok(value)
    }

    fn check_writable(&self, key: &str) -> HostResult<()> {
        if self.read_only {
            return Err(HostError::ReadOnly {
                member: key.to_string(),
            });
        }
        Ok(())
    }

    fn put(comparison: KeyComparison, inner: &mut DictionaryInner, key: &str, value: Value) {
        let folded = comparison.fold(key).into_owned();
        match inner.index.get(&folded) {
            Some(&position) => inner.entries[position].1 = value,
            None => {
                inner.index.insert(folded, inner.entries.len());
                inner.entries.push((key.to_string(), value));
            }
        }
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapping for Dictionary {
    fn comparison(&self) -> Option<KeyComparison> {
        Some(self.comparison)
    }

    fn keys(&self) -> Vec<String> {
        self.inner
            .read()
            .entries
            .iter()
            .map(|(k, _)| k.clone())
            .collect()
    }

    fn get(&self, key: &str) -> Option<Value> {
        let inner = self.inner.read();
        let position = *inner.index.get(self.comparison.fold(key).as_ref())?;
        Some(inner.entries[position].1.clone())
    }

    fn insert(&self, key: &str, value: Value) -> HostResult<()> {
        self.check_writable(key)?;
        let mut inner = self.inner.write();
        Self::put(self.comparison, &mut inner, key, value);
        Ok(())
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn contains_key(&self, key: &str) -> bool {
        self.inner
            .read()
            .index
            .contains_key(self.comparison.fold(key).as_ref())
    }

    fn find_key(&self, key: &str, comparison: KeyComparison) -> Option<String> {
        let inner = self.inner.read();
        // The folded index answers whenever a match under `comparison` is
        // also a match under the dictionary's own policy
        if comparison == self.comparison || comparison == KeyComparison::Ordinal {
            let position = *inner.index.get(self.comparison.fold(key).as_ref())?;
            let stored = &inner.entries[position].0;
            return comparison.keys_match(stored, key).then(|| stored.clone());
        }
        inner
            .entries
            .iter()
            .find(|(k, _)| comparison.keys_match(k, key))
            .map(|(k, _)| k.clone())
    }

    fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    fn entries(&self) -> Vec<(String, Value)> {
        self.inner.read().entries.clone()
    }
}

impl std::fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dictionary")
            .field("comparison", &self.comparison)
            .field("read_only", &self.read_only)
            .field("keys", &self.keys())
            .finish()
    }
}
