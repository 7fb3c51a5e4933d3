//! Deep conversion to case-insensitive dictionaries

use std::sync::Arc;

use mallard_sdk::{map_identity, Dictionary, HostResult, MapRef, Mapping, Value};
use rustc_hash::FxHashMap;
use tracing::debug;

/// Copy a mapping, and every mapping reachable from it, into new
/// case-insensitive dictionaries.
///
/// Each source mapping is converted once: the visited table is keyed by
/// mapping identity and registered before recursing, so self-referencing
/// structures terminate and keep their cycles in the copy. Keys that only
/// differ by case collapse into one entry, the later one winning.
pub fn to_case_insensitive(mapping: &MapRef) -> HostResult<MapRef> {
    let mut visited = FxHashMap::default();
    let converted = convert_mapping(mapping, &mut visited)?;
    debug!(mappings = visited.len(), "converted mapping graph to case-insensitive");
    Ok(converted)
}

fn convert_mapping(
    mapping: &MapRef,
    visited: &mut FxHashMap<usize, MapRef>,
) -> HostResult<MapRef> {
    let identity = map_identity(mapping);
    if let Some(done) = visited.get(&identity) {
        return Ok(done.clone());
    }

    let target = Arc::new(Dictionary::case_insensitive());
    let target_ref: MapRef = target.clone();
    visited.insert(identity, target_ref.clone());

    for (key, value) in mapping.entries() {
        let converted = convert_value(value, visited)?;
        target.insert(&key, converted)?;
    }

    Ok(target_ref)
}

fn convert_value(value: Value, visited: &mut FxHashMap<usize, MapRef>) -> HostResult<Value> {
    match value {
        Value::Map(nested) => Ok(Value::Map(convert_mapping(&nested, visited)?)),
        Value::List(items) => items
            .into_iter()
            .map(|item| convert_value(item, visited))
            .collect::<HostResult<Vec<_>>>()
            .map(Value::List),
        other => Ok(other),
    }
}
