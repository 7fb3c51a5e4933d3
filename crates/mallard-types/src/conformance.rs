//! Structural conformance between value types and shapes
//!
//! Implements the relation `S <: T`: a value declared as `S` can be read
//! wherever `T` is expected, without any conversion.

use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::shape::{MemberKind, Shape};
use crate::ty::ValueType;

/// Context for checking conformance relationships
///
/// Keeps the shape pairs currently being compared so that comparisons of
/// shapes that refer back to each other terminate.
#[derive(Debug, Default, Clone)]
pub struct ConformanceContext {
    assumed: FxHashSet<(usize, usize)>,
}

impl ConformanceContext {
    /// Create a new conformance context
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if `sub` conforms to `sup` (sub <: sup)
    pub fn is_assignable(&mut self, sub: &ValueType, sup: &ValueType) -> bool {
        // Reflexivity: T <: T
        if sub == sup {
            return true;
        }

        match (sub, sup) {
            // Everything is assignable to Any
            (_, ValueType::Any) => true,

            // Structural: width and depth subtyping on shapes
            (ValueType::Shape(s1), ValueType::Shape(s2)) => self.shape_conforms(s1, s2),

            _ => false,
        }
    }

    /// Check if every member of `target` is provided by `source`.
    ///
    /// Properties are covariant in their type; a writable target property
    /// needs a writable source property of the identical type. Methods need
    /// an identical signature.
    pub fn shape_conforms(&mut self, source: &Arc<Shape>, target: &Arc<Shape>) -> bool {
        if Arc::ptr_eq(source, target) {
            return true;
        }

        let key = (
            Arc::as_ptr(source) as usize,
            Arc::as_ptr(target) as usize,
        );
        if !self.assumed.insert(key) {
            return true;
        }

        let result = target.members().iter().all(|tm| {
            let Some(sm) = source.member(&tm.name) else {
                return tm.optional;
            };

            match (&sm.kind, &tm.kind) {
                (
                    MemberKind::Property { ty: s_ty, writable: s_w },
                    MemberKind::Property { ty: t_ty, writable: t_w },
                ) => {
                    if *t_w {
                        *s_w && s_ty == t_ty
                    } else {
                        self.is_assignable(s_ty, t_ty)
                    }
                }
                (MemberKind::Method(s_sig), MemberKind::Method(t_sig)) => s_sig == t_sig,
                _ => false,
            }
        });

        self.assumed.remove(&key);
        result
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(builder: crate::shape::ShapeBuilder) -> Arc<Shape> {
        Arc::new(builder.build().unwrap())
    }

    #[test]
    fn test_reflexivity() {
        let mut ctx = ConformanceContext::new();
        assert!(ctx.is_assignable(&ValueType::Integer, &ValueType::Integer));
        assert!(!ctx.is_assignable(&ValueType::Integer, &ValueType::Text));
    }

    #[test]
    fn test_any_is_top() {
        let mut ctx = ConformanceContext::new();
        assert!(ctx.is_assignable(&ValueType::Text, &ValueType::Any));
        assert!(!ctx.is_assignable(&ValueType::Any, &ValueType::Text));
    }

    #[test]
    fn test_width_subtyping() {
        let wide = shape(
            Shape::builder("Wide")
                .property("Id", ValueType::Integer)
                .property("Name", ValueType::Text),
        );
        let narrow = shape(Shape::builder("Narrow").property("Id", ValueType::Integer));

        let mut ctx = ConformanceContext::new();
        assert!(ctx.shape_conforms(&wide, &narrow));
        assert!(!ctx.shape_conforms(&narrow, &wide));
    }

    #[test]
    fn test_writable_needs_writable_source() {
        let read_only = shape(Shape::builder("R").property("Id", ValueType::Integer));
        let writable = shape(Shape::builder("W").writable("Id", ValueType::Integer));

        let mut ctx = ConformanceContext::new();
        assert!(ctx.shape_conforms(&writable, &read_only));
        assert!(!ctx.shape_conforms(&read_only, &writable));
    }

    #[test]
    fn test_optional_member_may_be_missing() {
        let empty = shape(Shape::builder("Empty"));
        let optional = shape(Shape::builder("Opt").optional("Nick", ValueType::Text));

        let mut ctx = ConformanceContext::new();
        assert!(ctx.shape_conforms(&empty, &optional));
    }

    #[test]
    fn test_methods_need_identical_signatures() {
        let mut ctx = ConformanceContext::new();
        let returns_text = shape(Shape::builder("A").method("Run", vec![ValueType::Text], ValueType::Text));
        let returns_any = shape(Shape::builder("B").method("Run", vec![ValueType::Text], ValueType::Any));
        let same = shape(Shape::builder("C").method("Run", vec![ValueType::Text], ValueType::Text));

        assert!(ctx.shape_conforms(&returns_text, &same));
        assert!(!ctx.shape_conforms(&returns_text, &returns_any));
        assert!(!ctx.shape_conforms(&returns_any, &returns_text));
    }
}
