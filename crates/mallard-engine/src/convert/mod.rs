//! Type conversion registry
//!
//! Converters bridge a storage type (usually text) and a strongly typed
//! value. Each registration covers both directions: `parse` goes from the
//! source kind to the target kind, `format` comes back.
//!
//! The registry is built once, then shared read-only as
//! `Arc<ConverterRegistry>`; converters must be stateless.

mod builtin;

use std::sync::Arc;

use mallard_sdk::Value;
use mallard_types::{TypeKind, ValueType};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::error::ConversionError;

/// Conversion function. Receives the value and the concrete type to produce
/// (enum conversions need the target's variant list).
pub type ConvertFn = Arc<dyn Fn(&Value, &ValueType) -> Result<Value, ConversionError> + Send + Sync>;

/// A bidirectional converter between two type kinds
#[derive(Clone)]
pub struct Converter {
    source: TypeKind,
    target: TypeKind,
    parse: ConvertFn,
    format: ConvertFn,
}

impl Converter {
    /// Source kind (the storage side, e.g. text)
    pub fn source(&self) -> TypeKind {
        self.source
    }

    /// Target kind (the typed side)
    pub fn target(&self) -> TypeKind {
        self.target
    }
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Converter({} <-> {})", self.source, self.target)
    }
}

/// Registry of converters keyed by (source kind, target kind)
#[derive(Debug, Clone, Default)]
pub struct ConverterRegistry {
    converters: FxHashMap<(TypeKind, TypeKind), Converter>,
}

impl ConverterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in converters:
    /// text to and from integer, float, boolean, date/time, enum and uuid,
    /// and integer to and from float.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        builtin::register_builtins(&mut registry);
        registry
    }

    /// Register a converter, replacing any previous one for the same pair.
    ///
    /// `parse` converts `source` values to `target`; `format` converts back.
    pub fn register<P, F>(&mut self, source: TypeKind, target: TypeKind, parse: P, format: F)
    where
        P: Fn(&Value, &ValueType) -> Result<Value, ConversionError> + Send + Sync + 'static,
        F: Fn(&Value, &ValueType) -> Result<Value, ConversionError> + Send + Sync + 'static,
    {
        // A reversed registration would shadow this one in lookups
        self.converters.remove(&(target, source));
        self.converters.insert(
            (source, target),
            Converter {
                source,
                target,
                parse: Arc::new(parse),
                format: Arc::new(format),
            },
        );
    }

    /// Number of registered converters
    pub fn len(&self) -> usize {
        self.converters.len()
    }

    /// Check if the registry has no converters
    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    /// Static capability check: is a converter registered between the types?
    pub fn can_convert(&self, from: &ValueType, to: &ValueType) -> bool {
        self.find(from.kind(), to.kind()).is_some()
    }

    /// Convert a value to `to`.
    ///
    /// Null converts to null, and a value already of the requested type is
    /// returned unchanged.
    pub fn convert(&self, value: &Value, to: &ValueType) -> Result<Value, ConversionError> {
        if value.is_null() || value.conforms_to(to) {
            return Ok(value.clone());
        }

        let from = value.value_type();
        let convert = self
            .find(from.kind(), to.kind())
            .ok_or_else(|| ConversionError::NoConverter {
                from: from.clone(),
                to: to.clone(),
            })?;

        let result = convert(value, to);
        trace!(%from, %to, ok = result.is_ok(), "converted value");
        result
    }

    fn find(&self, from: TypeKind, to: TypeKind) -> Option<&ConvertFn> {
        if let Some(converter) = self.converters.get(&(from, to)) {
            return Some(&converter.parse);
        }
        self.converters.get(&(to, from)).map(|c| &c.format)
    }
}

/// Literal form of a value for error messages
pub(crate) fn literal(value: &Value) -> String {
    match value {
        Value::Text(s) => s.clone(),
        other => format!("{:?}", other),
    }
}

/// Build an `Unparseable` error for `value`
pub(crate) fn unparseable(value: &Value, to: &ValueType, reason: impl ToString) -> ConversionError {
    ConversionError::Unparseable {
        literal: literal(value),
        from: value.value_type(),
        to: to.clone(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_text_pairs() {
        let registry = ConverterRegistry::with_defaults();
        for kind in [
            ValueType::Integer,
            ValueType::Float,
            ValueType::Boolean,
            ValueType::DateTime,
            ValueType::Uuid,
        ] {
            assert!(registry.can_convert(&ValueType::Text, &kind), "text -> {}", kind);
            assert!(registry.can_convert(&kind, &ValueType::Text), "{} -> text", kind);
        }
        assert!(!registry.can_convert(&ValueType::Boolean, &ValueType::DateTime));
        assert!(!registry.can_convert(&ValueType::Text, &ValueType::Map));
    }

    #[test]
    fn test_empty_registry_converts_nothing() {
        let registry = ConverterRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(
            registry.convert(&Value::from("42"), &ValueType::Integer),
            Err(ConversionError::NoConverter {
                from: ValueType::Text,
                to: ValueType::Integer
            })
        );
    }

    #[test]
    fn test_same_type_passes_through() {
        let registry = ConverterRegistry::new();
        assert_eq!(
            registry.convert(&Value::from(5), &ValueType::Integer),
            Ok(Value::from(5))
        );
        assert_eq!(registry.convert(&Value::Null, &ValueType::Integer), Ok(Value::Null));
    }

    #[test]
    fn test_custom_registration_replaces_builtin() {
        let mut registry = ConverterRegistry::with_defaults();
        registry.register(
            TypeKind::Text,
            TypeKind::Boolean,
            |value, to| match value.as_text().map(str::trim) {
                Some("yes") => Ok(Value::Bool(true)),
                Some("no") => Ok(Value::Bool(false)),
                _ => Err(unparseable(value, to, "expected yes or no")),
            },
            |value, _| Ok(Value::from(if value.as_bool() == Some(true) { "yes" } else { "no" })),
        );

        assert_eq!(
            registry.convert(&Value::from("yes"), &ValueType::Boolean),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            registry.convert(&Value::Bool(false), &ValueType::Text),
            Ok(Value::from("no"))
        );
        assert!(registry.convert(&Value::from("true"), &ValueType::Boolean).is_err());
    }

    #[test]
    fn test_reverse_registration_is_replaced() {
        let mut registry = ConverterRegistry::new();
        registry.register(
            TypeKind::Integer,
            TypeKind::Text,
            |_, _| Ok(Value::from("int-to-text")),
            |_, _| Ok(Value::from(0)),
        );
        registry.register(
            TypeKind::Text,
            TypeKind::Integer,
            |_, _| Ok(Value::from(1)),
            |_, _| Ok(Value::from("formatted")),
        );

        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.convert(&Value::from(3), &ValueType::Text),
            Ok(Value::from("formatted"))
        );
    }
}
