//! Dynamically typed host values
//!
//! Scalars are stored inline. Mappings and objects are shared handles
//! (`Arc<dyn Mapping>`, `Arc<dyn Reflect>`): cloning a `Value` never copies
//! the structure behind them, and equality on them is identity.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mallard_types::{EnumType, ValueType};
use uuid::Uuid;

use crate::mapping::Mapping;
use crate::object::Reflect;

/// Shared handle to a string-keyed mapping
pub type MapRef = Arc<dyn Mapping>;

/// Shared handle to a reflected host object
pub type ObjectRef = Arc<dyn Reflect>;

/// Identity of a shared mapping, stable for as long as the handle lives
pub fn map_identity(map: &MapRef) -> usize {
    Arc::as_ptr(map) as *const () as usize
}

/// A value of a named enum type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    ty: Arc<EnumType>,
    variant: String,
}

impl EnumValue {
    /// Create an enum value, returning `None` if `variant` is not declared
    pub fn new(ty: Arc<EnumType>, variant: &str) -> Option<Self> {
        let variant = ty.variant(variant)?.to_string();
        Some(Self { ty, variant })
    }

    /// The enum type
    pub fn enum_type(&self) -> &Arc<EnumType> {
        &self.ty
    }

    /// Variant name
    pub fn variant(&self) -> &str {
        &self.variant
    }
}

/// Dynamically typed host value
#[derive(Clone, Default)]
pub enum Value {
    /// No value
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit float
    Float(f64),
    /// Text
    Text(String),
    /// UTC date/time
    DateTime(DateTime<Utc>),
    /// UUID
    Uuid(Uuid),
    /// Enum value
    Enum(EnumValue),
    /// List of values
    List(Vec<Value>),
    /// Shared string-keyed mapping
    Map(MapRef),
    /// Shared reflected object
    Object(ObjectRef),
}

impl Value {
    /// Wrap a mapping into a shared value
    pub fn map<M: Mapping + 'static>(mapping: M) -> Self {
        Value::Map(Arc::new(mapping))
    }

    /// Wrap a reflected object into a shared value
    pub fn object<R: Reflect + 'static>(object: R) -> Self {
        Value::Object(Arc::new(object))
    }

    /// Runtime type of this value
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Bool(_) => ValueType::Boolean,
            Value::Int(_) => ValueType::Integer,
            Value::Float(_) => ValueType::Float,
            Value::Text(_) => ValueType::Text,
            Value::DateTime(_) => ValueType::DateTime,
            Value::Uuid(_) => ValueType::Uuid,
            Value::Enum(e) => ValueType::Enum(e.enum_type().clone()),
            Value::List(_) => ValueType::List,
            Value::Map(_) => ValueType::Map,
            Value::Object(o) => ValueType::Object(o.type_name().to_string()),
        }
    }

    /// Check if this value may be stored in a slot declared as `ty`.
    ///
    /// Null fits any slot. Mappings and objects fit shape-typed slots; their
    /// members are checked when the slot is adapted, not here.
    pub fn conforms_to(&self, ty: &ValueType) -> bool {
        match (self, ty) {
            (_, ValueType::Any) | (Value::Null, _) => true,
            (Value::Map(_), ValueType::Shape(_)) | (Value::Object(_), ValueType::Shape(_)) => true,
            (Value::Object(o), ValueType::Object(name)) => o.type_name() == name,
            (value, ty) => value.value_type() == *ty,
        }
    }

    /// Get type name for diagnostics
    pub fn type_name(&self) -> String {
        self.value_type().to_string()
    }

    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Extract boolean value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract integer value
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Extract float value
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Extract text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Extract date/time value
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Extract uuid value
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            Value::Uuid(u) => Some(*u),
            _ => None,
        }
    }

    /// Extract enum value
    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Value::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// Extract list elements
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Extract mapping handle
    pub fn as_map(&self) -> Option<&MapRef> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Extract object handle
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Uuid(a), Value::Uuid(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => map_identity(a) == map_identity(b),
            (Value::Object(a), Value::Object(b)) => {
                Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Value::Null"),
            Value::Bool(b) => write!(f, "Value::Bool({})", b),
            Value::Int(i) => write!(f, "Value::Int({})", i),
            Value::Float(x) => write!(f, "Value::Float({})", x),
            Value::Text(s) => write!(f, "Value::Text({:?})", s),
            Value::DateTime(dt) => write!(f, "Value::DateTime({})", dt.to_rfc3339()),
            Value::Uuid(u) => write!(f, "Value::Uuid({})", u),
            Value::Enum(e) => write!(f, "Value::Enum({}::{})", e.enum_type().name(), e.variant()),
            Value::List(items) => f.debug_tuple("Value::List").field(items).finish(),
            // Mappings may be cyclic: print identity only
            Value::Map(m) => write!(f, "Value::Map({:#x})", map_identity(m)),
            Value::Object(o) => write!(f, "Value::Object({})", o.type_name()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::DateTime(dt)
    }
}

impl From<Uuid> for Value {
    fn from(u: Uuid) -> Self {
        Value::Uuid(u)
    }
}

impl From<EnumValue> for Value {
    fn from(e: EnumValue) -> Self {
        Value::Enum(e)
    }
}

impl From<MapRef> for Value {
    fn from(m: MapRef) -> Self {
        Value::Map(m)
    }
}

impl From<ObjectRef> for Value {
    fn from(o: ObjectRef) -> Self {
        Value::Object(o)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::Dictionary;

    #[test]
    fn test_value_types() {
        assert_eq!(Value::Null.value_type(), ValueType::Null);
        assert_eq!(Value::from(42).value_type(), ValueType::Integer);
        assert_eq!(Value::from("x").value_type(), ValueType::Text);
        assert_eq!(Value::from(1.5).value_type(), ValueType::Float);
        assert_eq!(Value::map(Dictionary::new()).value_type(), ValueType::Map);
    }

    #[test]
    fn test_conforms_to() {
        assert!(Value::from(1).conforms_to(&ValueType::Integer));
        assert!(!Value::from(1).conforms_to(&ValueType::Text));
        assert!(Value::Null.conforms_to(&ValueType::Integer));
        assert!(Value::from("x").conforms_to(&ValueType::Any));
    }

    #[test]
    fn test_map_equality_is_identity() {
        let a: MapRef = Arc::new(Dictionary::new());
        let b: MapRef = Arc::new(Dictionary::new());
        assert_eq!(Value::Map(a.clone()), Value::Map(a));
        assert_ne!(Value::Map(b.clone()), Value::Map(Arc::new(Dictionary::new())));
    }

    #[test]
    fn test_enum_value_requires_declared_variant() {
        let color = Arc::new(EnumType::new("Color", ["Red", "Green"]).unwrap());
        assert!(EnumValue::new(color.clone(), "Red").is_some());
        assert!(EnumValue::new(color, "Blue").is_none());
    }

    #[test]
    fn test_debug_format() {
        assert_eq!(format!("{:?}", Value::from(42)), "Value::Int(42)");
        assert_eq!(format!("{:?}", Value::from("a")), "Value::Text(\"a\")");
    }
}
