//! Error types reported by host objects and mappings

/// Result type for host object operations
pub type HostResult<T> = Result<T, HostError>;

/// Host object model error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HostError {
    /// Member does not exist on the object
    #[error("Member '{member}' not found on {type_name}")]
    MissingMember {
        /// Type of the object
        type_name: String,
        /// Requested member name
        member: String,
    },

    /// Write attempted on a read-only member or mapping
    #[error("'{member}' is read-only")]
    ReadOnly {
        /// Member or key name
        member: String,
    },

    /// Type mismatch when storing or passing a value
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected type name
        expected: String,
        /// Actual type name
        got: String,
    },

    /// Wrong number of method arguments
    #[error("Method '{member}' expects {expected} argument(s), got {got}")]
    ArgumentCount {
        /// Method name
        member: String,
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        got: usize,
    },

    /// Method body reported a failure
    #[error("Method '{member}' failed: {message}")]
    Invocation {
        /// Method name
        member: String,
        /// Failure description
        message: String,
    },
}
