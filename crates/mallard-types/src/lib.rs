//! Mallard Type System
//!
//! Value types, interface shapes, and structural conformance between shapes.

#![warn(missing_docs)]

pub mod ty;
pub mod shape;
pub mod error;
pub mod conformance;

pub use ty::{EnumType, TypeKind, ValueType};
pub use shape::{MemberKind, MemberSignature, MethodSignature, Shape, ShapeBuilder};
pub use error::{TypeError, TypeResult};
pub use conformance::ConformanceContext;
