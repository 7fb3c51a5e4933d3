//! Mallard Engine - runtime duck typing
//!
//! Checks whether a host object or a string-keyed mapping can stand in for
//! an interface shape, and if so presents it through an [`Adapter`] that
//! reads and writes the live source.
//!
//! # Architecture
//!
//! ```text
//! DuckTyper ──► Inspector ──► ResolutionPlan ──► Adapter ──► live source
//!                  │                                │
//!                  ├── casefold (key sensitivity)   │
//!                  └── ConverterRegistry ◄──────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use mallard_engine::DuckTyper;
//! use mallard_sdk::{Dictionary, KeyComparison, Value};
//! use mallard_types::{Shape, ValueType};
//!
//! let shape = Arc::new(
//!     Shape::builder("Person")
//!         .property("Name", ValueType::Text)
//!         .property("Age", ValueType::Integer)
//!         .build()?,
//! );
//! let map = Arc::new(Dictionary::from_entries(
//!     KeyComparison::IgnoreCase,
//!     [("name", "Ada"), ("age", "36")],
//! ));
//!
//! let person = DuckTyper::default().try_adapt(&shape, map)?;
//! assert_eq!(person.get("Age")?, Value::from(36));
//! ```

#![warn(missing_docs)]

pub mod adapter;
pub mod casefold;
pub mod convert;
pub mod duck;
pub mod error;
pub mod inspect;
pub mod options;

pub use adapter::Adapter;
pub use casefold::{is_case_sensitive, to_case_insensitive, wrap, CaseAwareMapping};
pub use convert::{ConvertFn, Converter, ConverterRegistry};
pub use duck::DuckTyper;
pub use error::{ConfigError, ConversionError, DuckError, DuckResult};
pub use inspect::{Inspector, MemberResolution, Resolution, ResolutionPlan, Source, UnresolvedReason};
pub use options::DuckOptions;
