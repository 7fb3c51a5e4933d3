//! Core value type definitions

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::error::{TypeError, TypeResult};
use crate::shape::Shape;

/// Enum type known by its variant names
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumType {
    name: String,
    variants: Vec<String>,
}

impl EnumType {
    /// Create an enum type. Variants must be non-empty and unique.
    pub fn new<I, S>(name: impl Into<String>, variants: I) -> TypeResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let variants: Vec<String> = variants.into_iter().map(Into::into).collect();
        if variants.is_empty() {
            return Err(TypeError::EmptyEnum { name });
        }

        let mut seen = FxHashSet::default();
        for variant in &variants {
            if !seen.insert(variant.as_str()) {
                return Err(TypeError::DuplicateVariant {
                    name,
                    variant: variant.clone(),
                });
            }
        }

        Ok(Self { name, variants })
    }

    /// Enum name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Variant names in declaration order
    pub fn variants(&self) -> &[String] {
        &self.variants
    }

    /// Find a variant by its exact name
    pub fn variant(&self, name: &str) -> Option<&str> {
        self.variants
            .iter()
            .find(|v| v.as_str() == name)
            .map(String::as_str)
    }

    /// Find a variant by exact name first, then ignoring ASCII case
    pub fn variant_ignore_case(&self, name: &str) -> Option<&str> {
        self.variant(name).or_else(|| {
            self.variants
                .iter()
                .find(|v| v.eq_ignore_ascii_case(name))
                .map(String::as_str)
        })
    }
}

/// Type kind, used to key converters independently of type parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeKind {
    /// Accepts any value
    Any,
    /// The null value
    Null,
    /// Text
    Text,
    /// 64-bit signed integer
    Integer,
    /// 64-bit float
    Float,
    /// Boolean
    Boolean,
    /// UTC date/time
    DateTime,
    /// UUID
    Uuid,
    /// Named enum
    Enum,
    /// List of values
    List,
    /// String-keyed mapping
    Map,
    /// Reflected host object
    Object,
    /// Nested interface shape
    Shape,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeKind::Any => "any",
            TypeKind::Null => "null",
            TypeKind::Text => "text",
            TypeKind::Integer => "integer",
            TypeKind::Float => "float",
            TypeKind::Boolean => "boolean",
            TypeKind::DateTime => "datetime",
            TypeKind::Uuid => "uuid",
            TypeKind::Enum => "enum",
            TypeKind::List => "list",
            TypeKind::Map => "map",
            TypeKind::Object => "object",
            TypeKind::Shape => "shape",
        };
        f.write_str(name)
    }
}

/// Declared type of a member or a value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Accepts any value without conversion
    Any,
    /// The null type
    Null,
    /// Text
    Text,
    /// 64-bit signed integer
    Integer,
    /// 64-bit float
    Float,
    /// Boolean
    Boolean,
    /// UTC date/time
    DateTime,
    /// UUID
    Uuid,
    /// Named enum
    Enum(Arc<EnumType>),
    /// List of values
    List,
    /// String-keyed mapping
    Map,
    /// Reflected host object, by type name
    Object(String),
    /// Nested interface shape
    Shape(Arc<Shape>),
}

impl ValueType {
    /// Create an enum type reference
    pub fn enumeration(ty: EnumType) -> Self {
        ValueType::Enum(Arc::new(ty))
    }

    /// Create a nested shape type reference
    pub fn shape(shape: Shape) -> Self {
        ValueType::Shape(Arc::new(shape))
    }

    /// Kind of this type
    pub fn kind(&self) -> TypeKind {
        match self {
            ValueType::Any => TypeKind::Any,
            ValueType::Null => TypeKind::Null,
            ValueType::Text => TypeKind::Text,
            ValueType::Integer => TypeKind::Integer,
            ValueType::Float => TypeKind::Float,
            ValueType::Boolean => TypeKind::Boolean,
            ValueType::DateTime => TypeKind::DateTime,
            ValueType::Uuid => TypeKind::Uuid,
            ValueType::Enum(_) => TypeKind::Enum,
            ValueType::List => TypeKind::List,
            ValueType::Map => TypeKind::Map,
            ValueType::Object(_) => TypeKind::Object,
            ValueType::Shape(_) => TypeKind::Shape,
        }
    }

    /// Check if this is a scalar type that converters can work with
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            ValueType::Text
                | ValueType::Integer
                | ValueType::Float
                | ValueType::Boolean
                | ValueType::DateTime
                | ValueType::Uuid
                | ValueType::Enum(_)
        )
    }

    /// Get the enum type if this is an enum
    pub fn as_enum(&self) -> Option<&EnumType> {
        match self {
            ValueType::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// Get the nested shape if this is a shape type
    pub fn as_shape(&self) -> Option<&Arc<Shape>> {
        match self {
            ValueType::Shape(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Enum(e) => write!(f, "enum {}", e.name()),
            ValueType::Object(name) => write!(f, "object {}", name),
            ValueType::Shape(s) => write!(f, "shape {}", s.name()),
            other => write!(f, "{}", other.kind()),
        }
    }
}
