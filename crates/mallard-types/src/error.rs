//! Type system errors

use thiserror::Error;

/// Result type for shape and type construction
pub type TypeResult<T> = Result<T, TypeError>;

/// Errors that can occur while building shapes and enum types
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TypeError {
    /// A shape declares the same member name twice
    #[error("Duplicate member '{member}' in shape {shape}")]
    DuplicateMember {
        /// Shape name
        shape: String,
        /// Member name that was repeated
        member: String,
    },

    /// A member was declared with an empty name
    #[error("Empty member name in shape {shape}")]
    EmptyMemberName {
        /// Shape name
        shape: String,
    },

    /// An enum type was declared without variants
    #[error("Enum {name} has no variants")]
    EmptyEnum {
        /// Enum name
        name: String,
    },

    /// An enum type declares the same variant twice
    #[error("Duplicate variant '{variant}' in enum {name}")]
    DuplicateVariant {
        /// Enum name
        name: String,
        /// Variant name that was repeated
        variant: String,
    },
}
