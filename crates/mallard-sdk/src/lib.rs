//! Mallard SDK - host object model for the duck-typing engine
//!
//! This crate provides the values, mappings, and reflected objects the engine
//! inspects and adapts, without depending on the engine itself. Hosts that
//! bring their own object types implement [`Reflect`] or [`Mapping`].
//!
//! # Example
//!
//! ```ignore
//! use mallard_sdk::{Dictionary, KeyComparison, Mapping, Value};
//!
//! let dict = Dictionary::from_entries(KeyComparison::Ordinal, [("Name", "Alice")]);
//! assert_eq!(dict.get("Name"), Some(Value::from("Alice")));
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod mapping;
pub mod object;
pub mod value;

pub use error::{HostError, HostResult};
pub use mapping::{Dictionary, KeyComparison, Mapping};
pub use object::{DynObject, DynObjectBuilder, MethodFn, Reflect};
pub use value::{map_identity, EnumValue, MapRef, ObjectRef, Value};
