//! Capability inspection
//!
//! Matches each member of a target shape against what a source exposes and
//! records how it can be satisfied. Inspection only reads: it never invokes
//! source methods or writes to the source.

mod plan;
mod source;

pub use plan::{MemberResolution, Resolution, ResolutionPlan, UnresolvedReason};
pub use source::Source;

use std::sync::Arc;

use mallard_sdk::{KeyComparison, MapRef, ObjectRef};
use mallard_types::{ConformanceContext, MemberKind, MemberSignature, MethodSignature, Shape, ValueType};
use tracing::{debug, trace};

use crate::casefold::{self, CaseAwareMapping};
use crate::convert::ConverterRegistry;
use crate::error::{DuckError, DuckResult};
use crate::options::DuckOptions;

/// Builds resolution plans for a shape against a source
pub struct Inspector<'a> {
    registry: &'a ConverterRegistry,
    options: &'a DuckOptions,
}

impl<'a> Inspector<'a> {
    /// Create an inspector using the given converters and options
    pub fn new(registry: &'a ConverterRegistry, options: &'a DuckOptions) -> Self {
        Self { registry, options }
    }

    /// Inspect the source, returning the full plan including unresolved
    /// members
    pub fn inspect(&self, shape: &Arc<Shape>, source: &Source) -> ResolutionPlan {
        match source {
            Source::Object(object) => self.inspect_object(shape, object),
            Source::Map(map) => self.inspect_map(shape, map),
        }
    }

    /// Inspect the source, failing with [`DuckError::Unsatisfiable`] when any
    /// member is unresolved
    pub fn resolve(&self, shape: &Arc<Shape>, source: &Source) -> DuckResult<ResolutionPlan> {
        let plan = self.inspect(shape, source);
        if plan.is_satisfiable() {
            Ok(plan)
        } else {
            let unresolved = plan.unresolved();
            debug!(shape = shape.name(), ?unresolved, "shape not satisfiable");
            Err(DuckError::Unsatisfiable {
                shape: shape.name().to_string(),
                unresolved,
            })
        }
    }

    /// View a mapping the way member lookups should see it
    pub(crate) fn view(&self, map: &MapRef) -> CaseAwareMapping {
        let sensitivity = if self.options.fuzzy { Some(false) } else { None };
        casefold::wrap(map, sensitivity)
    }

    fn inspect_map(&self, shape: &Arc<Shape>, map: &MapRef) -> ResolutionPlan {
        let view = self.view(map);
        let entries = shape
            .members()
            .iter()
            .map(|member| {
                let resolution = self.resolve_key(member, &view);
                trace!(member = %member.name, %resolution, "resolved mapping member");
                MemberResolution {
                    member: member.clone(),
                    resolution,
                }
            })
            .collect();
        ResolutionPlan::new(shape.clone(), view.is_case_sensitive(), entries)
    }

    fn resolve_key(&self, member: &MemberSignature, view: &CaseAwareMapping) -> Resolution {
        let Some(key) = view.resolve_key(&member.name) else {
            return absent(member);
        };
        let ty = match &member.kind {
            MemberKind::Method(_) => return Resolution::Unresolved(UnresolvedReason::MethodOnMapping),
            MemberKind::Property { ty, .. } => ty,
        };
        // Nested mappings come back viewed with this mapping's sensitivity
        let value = view.look_up(&key).unwrap_or_default();

        // Null carries no type, so it fits any declared type
        if value.is_null() {
            return Resolution::Direct { source_member: key };
        }

        if let ValueType::Shape(nested) = ty {
            return match Source::from_value(&value) {
                Some(source) => {
                    let plan = self.inspect(nested, &source);
                    if plan.is_satisfiable() {
                        Resolution::Nested { source_member: key }
                    } else {
                        Resolution::Unresolved(UnresolvedReason::Nested(plan.unresolved()))
                    }
                }
                None => Resolution::Unresolved(UnresolvedReason::TypeMismatch {
                    found: value.value_type(),
                }),
            };
        }

        if value.conforms_to(ty) {
            return Resolution::Direct { source_member: key };
        }
        self.convertible(key, value.value_type(), ty)
    }

    fn inspect_object(&self, shape: &Arc<Shape>, object: &ObjectRef) -> ResolutionPlan {
        let schema = object.schema();
        let mut ctx = ConformanceContext::new();
        let entries = shape
            .members()
            .iter()
            .map(|member| {
                let resolution = match self.find_member(&schema, &member.name) {
                    Some(found) => self.resolve_member(member, found, &mut ctx),
                    None => absent(member),
                };
                trace!(
                    member = %member.name,
                    source = object.type_name(),
                    %resolution,
                    "resolved object member"
                );
                MemberResolution {
                    member: member.clone(),
                    resolution,
                }
            })
            .collect();
        ResolutionPlan::new(shape.clone(), !self.options.fuzzy, entries)
    }

    fn find_member<'s>(&self, schema: &'s Shape, name: &str) -> Option<&'s MemberSignature> {
        schema.member(name).or_else(|| {
            if self.options.fuzzy {
                schema
                    .members()
                    .iter()
                    .find(|m| KeyComparison::IgnoreCase.keys_match(&m.name, name))
            } else {
                None
            }
        })
    }

    fn resolve_member(
        &self,
        member: &MemberSignature,
        found: &MemberSignature,
        ctx: &mut ConformanceContext,
    ) -> Resolution {
        let source_member = found.name.clone();
        match (&member.kind, &found.kind) {
            (MemberKind::Method(wanted), MemberKind::Method(have)) => {
                if method_fits(wanted, have) {
                    Resolution::Method {
                        source_member,
                        signature: have.clone(),
                    }
                } else {
                    Resolution::Unresolved(UnresolvedReason::SignatureMismatch {
                        found: have.clone(),
                    })
                }
            }
            (MemberKind::Property { ty, .. }, MemberKind::Property { ty: have, .. }) => {
                self.resolve_property(source_member, ty, have, ctx)
            }
            _ => Resolution::Unresolved(UnresolvedReason::KindMismatch),
        }
    }

    fn resolve_property(
        &self,
        source_member: String,
        ty: &ValueType,
        have: &ValueType,
        ctx: &mut ConformanceContext,
    ) -> Resolution {
        match (ty, have) {
            (ValueType::Any, _) => Resolution::Direct { source_member },
            (ValueType::Shape(wanted), ValueType::Shape(declared)) => {
                if ctx.shape_conforms(declared, wanted) {
                    Resolution::Nested { source_member }
                } else {
                    Resolution::Unresolved(UnresolvedReason::TypeMismatch {
                        found: have.clone(),
                    })
                }
            }
            // Contents only known once read; checked when the nested adapter is built
            (ValueType::Shape(_), ValueType::Map | ValueType::Object(_) | ValueType::Any) => {
                Resolution::Nested { source_member }
            }
            (ValueType::Shape(_), _) => Resolution::Unresolved(UnresolvedReason::TypeMismatch {
                found: have.clone(),
            }),
            _ if ctx.is_assignable(have, ty) => Resolution::Direct { source_member },
            _ => self.convertible(source_member, have.clone(), ty),
        }
    }

    fn convertible(&self, source_member: String, from: ValueType, to: &ValueType) -> Resolution {
        if self.options.allow_conversion && self.registry.can_convert(&from, to) {
            Resolution::Convertible {
                source_member,
                from,
                to: to.clone(),
            }
        } else {
            Resolution::Unresolved(UnresolvedReason::TypeMismatch { found: from })
        }
    }
}

fn absent(member: &MemberSignature) -> Resolution {
    if member.optional {
        Resolution::Absent
    } else {
        Resolution::Unresolved(UnresolvedReason::Missing)
    }
}

/// Method signatures are never converted: parameters and return type must
/// match exactly
fn method_fits(wanted: &MethodSignature, have: &MethodSignature) -> bool {
    wanted == have
}

#[cfg(test)]
mod tests {
    use super::*;
    use mallard_sdk::{Dictionary, DynObject, Value};

    fn person() -> Arc<Shape> {
        Arc::new(
            Shape::builder("Person")
                .property("Name", ValueType::Text)
                .property("Age", ValueType::Integer)
                .build()
                .unwrap(),
        )
    }

    fn map(entries: &[(&str, Value)]) -> Source {
        let map: MapRef = Arc::new(Dictionary::from_entries(
            KeyComparison::Ordinal,
            entries.iter().map(|(k, v)| (*k, v.clone())),
        ));
        Source::Map(map)
    }

    fn inspect(shape: &Arc<Shape>, source: &Source, options: &DuckOptions) -> ResolutionPlan {
        let registry = ConverterRegistry::with_defaults();
        Inspector::new(&registry, options).inspect(shape, source)
    }

    #[test]
    fn test_map_members_direct_and_convertible() {
        let source = map(&[("Name", Value::from("Ada")), ("Age", Value::from("36"))]);
        let plan = inspect(&person(), &source, &DuckOptions::default());

        assert!(plan.is_satisfiable());
        assert_eq!(
            plan.resolution("Name"),
            Some(&Resolution::Direct {
                source_member: "Name".into()
            })
        );
        assert_eq!(
            plan.resolution("Age"),
            Some(&Resolution::Convertible {
                source_member: "Age".into(),
                from: ValueType::Text,
                to: ValueType::Integer,
            })
        );
    }

    #[test]
    fn test_missing_member_is_named() {
        let source = map(&[("Name", Value::from("Ada"))]);
        let registry = ConverterRegistry::with_defaults();
        let options = DuckOptions::default();
        let err = Inspector::new(&registry, &options)
            .resolve(&person(), &source)
            .unwrap_err();

        assert_eq!(
            err,
            DuckError::Unsatisfiable {
                shape: "Person".into(),
                unresolved: vec!["Age".into()],
            }
        );
    }

    #[test]
    fn test_conversion_can_be_disabled() {
        let source = map(&[("Name", Value::from("Ada")), ("Age", Value::from("36"))]);
        let options = DuckOptions {
            allow_conversion: false,
            ..DuckOptions::default()
        };
        let plan = inspect(&person(), &source, &options);
        assert_eq!(plan.unresolved(), vec!["Age"]);
    }

    #[test]
    fn test_null_mapping_value_is_direct() {
        let source = map(&[("Name", Value::Null), ("Age", Value::from(3))]);
        let plan = inspect(&person(), &source, &DuckOptions::default());
        assert!(plan.is_satisfiable());
    }

    #[test]
    fn test_sensitive_map_needs_exact_case_unless_fuzzy() {
        let source = map(&[("name", Value::from("Ada")), ("age", Value::from(36))]);

        let strict = inspect(&person(), &source, &DuckOptions::default());
        assert!(strict.case_sensitive());
        assert_eq!(strict.unresolved(), vec!["Name", "Age"]);

        let fuzzy = inspect(&person(), &source, &DuckOptions::fuzzy());
        assert!(fuzzy.is_satisfiable());
        assert_eq!(fuzzy.resolution("Age").and_then(|r| r.source_member()), Some("age"));
    }

    #[test]
    fn test_methods_never_resolve_on_mappings() {
        let shape = Arc::new(
            Shape::builder("Greeter")
                .method("Greet", vec![], ValueType::Text)
                .build()
                .unwrap(),
        );
        let source = map(&[("Greet", Value::from("hi"))]);
        let plan = inspect(&shape, &source, &DuckOptions::default());
        assert_eq!(
            plan.resolution("Greet"),
            Some(&Resolution::Unresolved(UnresolvedReason::MethodOnMapping))
        );
    }

    #[test]
    fn test_object_method_signature_rules() {
        let object = DynObject::builder("Greeter")
            .method("Greet", vec![ValueType::Text], ValueType::Text, |_, args| {
                Ok(args[0].clone())
            })
            .build_ref()
            .unwrap();
        let source = Source::Object(object);

        let exact = Arc::new(
            Shape::builder("G")
                .method("Greet", vec![ValueType::Text], ValueType::Text)
                .build()
                .unwrap(),
        );
        assert!(inspect(&exact, &source, &DuckOptions::default()).is_satisfiable());

        let widened_return = Arc::new(
            Shape::builder("G")
                .method("Greet", vec![ValueType::Text], ValueType::Any)
                .build()
                .unwrap(),
        );
        let plan = inspect(&widened_return, &source, &DuckOptions::default());
        assert_eq!(plan.unresolved(), vec!["Greet"]);

        let other_params = Arc::new(
            Shape::builder("G")
                .method("Greet", vec![ValueType::Integer], ValueType::Text)
                .build()
                .unwrap(),
        );
        let plan = inspect(&other_params, &source, &DuckOptions::default());
        assert!(matches!(
            plan.resolution("Greet"),
            Some(Resolution::Unresolved(UnresolvedReason::SignatureMismatch { .. }))
        ));
    }

    #[test]
    fn test_property_vs_method_kind_mismatch() {
        let object = DynObject::builder("Thing")
            .field("Greet", ValueType::Text, "hi")
            .build_ref()
            .unwrap();
        let shape = Arc::new(
            Shape::builder("G")
                .method("Greet", vec![], ValueType::Text)
                .build()
                .unwrap(),
        );
        let plan = inspect(&shape, &Source::Object(object), &DuckOptions::default());
        assert_eq!(
            plan.resolution("Greet"),
            Some(&Resolution::Unresolved(UnresolvedReason::KindMismatch))
        );
    }

    #[test]
    fn test_nested_map_failures_use_dotted_paths() {
        let inner_shape = Shape::builder("Inner")
            .property("Id", ValueType::Integer)
            .build()
            .unwrap();
        let shape = Arc::new(
            Shape::builder("Outer")
                .property("Inner", ValueType::shape(inner_shape))
                .build()
                .unwrap(),
        );

        let inner: MapRef = Arc::new(Dictionary::from_entries(
            KeyComparison::Ordinal,
            [("Other", 1)],
        ));
        let source = map(&[("Inner", Value::Map(inner))]);

        let plan = inspect(&shape, &source, &DuckOptions::default());
        assert_eq!(plan.unresolved(), vec!["Inner.Id"]);
    }

    #[test]
    fn test_optional_member_absent() {
        let shape = Arc::new(
            Shape::builder("S")
                .property("Name", ValueType::Text)
                .optional("Nick", ValueType::Text)
                .build()
                .unwrap(),
        );
        let source = map(&[("Name", Value::from("Ada"))]);
        let plan = inspect(&shape, &source, &DuckOptions::default());
        assert!(plan.is_satisfiable());
        assert_eq!(plan.resolution("Nick"), Some(&Resolution::Absent));
    }
}
