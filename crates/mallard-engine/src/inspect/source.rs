//! Adaptation sources

use std::fmt;
use std::sync::Arc;

use mallard_sdk::{map_identity, Dictionary, DynObject, MapRef, ObjectRef, Value};

/// Something an adapter can be built over: a reflected object or a
/// string-keyed mapping. Both are shared handles; nothing is copied.
#[derive(Clone)]
pub enum Source {
    /// Host object exposing members through `Reflect`
    Object(ObjectRef),
    /// String-keyed mapping
    Map(MapRef),
}

impl Source {
    /// Take a source out of a value holding a mapping or object
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Map(map) => Some(Source::Map(map.clone())),
            Value::Object(object) => Some(Source::Object(object.clone())),
            _ => None,
        }
    }

    /// Type name for diagnostics
    pub fn type_name(&self) -> &str {
        match self {
            Source::Object(object) => object.type_name(),
            Source::Map(_) => "mapping",
        }
    }

    /// Check if this is a mapping source
    pub fn is_map(&self) -> bool {
        matches!(self, Source::Map(_))
    }

    /// The source as a value
    pub fn to_value(&self) -> Value {
        match self {
            Source::Object(object) => Value::Object(object.clone()),
            Source::Map(map) => Value::Map(map.clone()),
        }
    }
}

impl From<ObjectRef> for Source {
    fn from(object: ObjectRef) -> Self {
        Source::Object(object)
    }
}

impl From<MapRef> for Source {
    fn from(map: MapRef) -> Self {
        Source::Map(map)
    }
}

impl From<Arc<Dictionary>> for Source {
    fn from(map: Arc<Dictionary>) -> Self {
        Source::Map(map)
    }
}

impl From<Arc<DynObject>> for Source {
    fn from(object: Arc<DynObject>) -> Self {
        Source::Object(object)
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Object(object) => write!(f, "Object({})", object.type_name()),
            Source::Map(map) => write!(f, "Map({:#x})", map_identity(map)),
        }
    }
}
