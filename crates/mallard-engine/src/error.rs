//! Engine error types

use mallard_sdk::HostError;
use mallard_types::ValueType;
use thiserror::Error;

/// Result type for engine operations
pub type DuckResult<T> = Result<T, DuckError>;

/// A value could not be converted to the requested type
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// The value's literal form does not parse as the target type
    #[error("Cannot convert {literal:?} from {from} to {to}: {reason}")]
    Unparseable {
        /// Literal form of the offending value
        literal: String,
        /// Type of the value
        from: ValueType,
        /// Requested type
        to: ValueType,
        /// Why parsing failed
        reason: String,
    },

    /// No converter is registered between the two types
    #[error("No converter from {from} to {to}")]
    NoConverter {
        /// Type of the value
        from: ValueType,
        /// Requested type
        to: ValueType,
    },
}

/// Errors raised by the duck-typing facade and its adapters
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DuckError {
    /// One or more required members cannot be resolved on the source
    #[error("Source does not satisfy shape {shape}; unresolved: {}", .unresolved.join(", "))]
    Unsatisfiable {
        /// Shape name
        shape: String,
        /// Unresolved member names (dotted paths for nested members)
        unresolved: Vec<String>,
    },

    /// A live value failed to convert
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// Write through an adapter refused
    #[error("Member '{member}' is not writable: {reason}")]
    NotWritable {
        /// Member name
        member: String,
        /// Why the write was refused
        reason: String,
    },

    /// Member not declared by the adapter's shape
    #[error("Shape {shape} has no member '{member}'")]
    UnknownMember {
        /// Shape name
        shape: String,
        /// Requested member name
        member: String,
    },

    /// Property access on a method or call on a property
    #[error("Member '{member}' is not a {expected}")]
    WrongMemberKind {
        /// Member name
        member: String,
        /// Kind the operation needed
        expected: &'static str,
    },

    /// Call arguments do not match the method signature
    #[error("Call to '{member}' does not match {signature}: {reason}")]
    SignatureMismatch {
        /// Method name
        member: String,
        /// Declared signature
        signature: String,
        /// What did not match
        reason: String,
    },

    /// A shape-typed member holds no mapping or object
    #[error("Nested member '{member}' holds {found}, not a mapping or object")]
    NotNestable {
        /// Member name
        member: String,
        /// Type actually found
        found: String,
    },

    /// The host object or mapping reported a failure
    #[error(transparent)]
    Host(#[from] HostError),
}

/// Errors loading engine options
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse TOML
    #[error("Failed to parse duck options: {0}")]
    Parse(#[from] toml::de::Error),
}
