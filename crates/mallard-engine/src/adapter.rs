//! Adapters: a source presented through a shape
//!
//! An adapter holds a shared handle to its source and a capability table
//! built from the resolution plan. Every read goes back to the live source;
//! nothing is cached or copied.

use std::fmt;
use std::sync::Arc;

use mallard_sdk::{HostError, Mapping, ObjectRef, Value};
use mallard_types::{MemberKind, MemberSignature, MethodSignature, Shape, ValueType};
use rustc_hash::FxHashMap;
use tracing::{trace, warn};

use crate::casefold::{self, CaseAwareMapping};
use crate::convert::ConverterRegistry;
use crate::error::{ConversionError, DuckError, DuckResult};
use crate::inspect::{Inspector, Resolution, ResolutionPlan, Source};
use crate::options::DuckOptions;

/// How a member is reached on the source
#[derive(Debug, Clone)]
enum Accessor {
    Direct(String),
    Convert { source_member: String, stored: ValueType },
    Nested(String),
    Method(String),
    Absent,
}

/// Source handle used for reads and writes; mappings go through a view
/// with the plan's key sensitivity
enum Target {
    Object(ObjectRef),
    Map(CaseAwareMapping),
}

#[derive(Debug, Clone)]
struct Capability {
    member: MemberSignature,
    accessor: Accessor,
}

/// A source seen through a target shape
pub struct Adapter {
    shape: Arc<Shape>,
    source: Source,
    target: Target,
    plan: Arc<ResolutionPlan>,
    capabilities: FxHashMap<String, Capability>,
    registry: Arc<ConverterRegistry>,
    options: DuckOptions,
}

impl Adapter {
    /// Build an adapter from a satisfiable plan
    pub fn build(
        shape: Arc<Shape>,
        source: Source,
        plan: Arc<ResolutionPlan>,
        registry: Arc<ConverterRegistry>,
        options: DuckOptions,
    ) -> DuckResult<Self> {
        if !plan.is_satisfiable() {
            return Err(DuckError::Unsatisfiable {
                shape: shape.name().to_string(),
                unresolved: plan.unresolved(),
            });
        }

        let mut capabilities = FxHashMap::default();
        for entry in plan.entries() {
            let accessor = match &entry.resolution {
                Resolution::Direct { source_member } => Accessor::Direct(source_member.clone()),
                Resolution::Convertible {
                    source_member,
                    from,
                    ..
                } => Accessor::Convert {
                    source_member: source_member.clone(),
                    stored: from.clone(),
                },
                Resolution::Nested { source_member } => Accessor::Nested(source_member.clone()),
                Resolution::Method { source_member, .. } => Accessor::Method(source_member.clone()),
                Resolution::Absent => Accessor::Absent,
                Resolution::Unresolved(_) => continue,
            };
            capabilities.insert(
                entry.member.name.clone(),
                Capability {
                    member: entry.member.clone(),
                    accessor,
                },
            );
        }

        let target = match &source {
            Source::Map(map) => Target::Map(casefold::wrap(map, Some(plan.case_sensitive()))),
            Source::Object(object) => Target::Object(object.clone()),
        };

        Ok(Self {
            shape,
            source,
            target,
            plan,
            capabilities,
            registry,
            options,
        })
    }

    /// Shape this adapter presents
    pub fn shape(&self) -> &Arc<Shape> {
        &self.shape
    }

    /// Plan the adapter was built from
    pub fn plan(&self) -> &Arc<ResolutionPlan> {
        &self.plan
    }

    /// The adapted source
    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Read a property from the live source.
    ///
    /// Every read is checked against the declared type: a live value that
    /// no longer matches (a mapping value that was null at inspection, or
    /// one replaced since) goes through the converters. An absent optional
    /// member reads as null.
    pub fn get(&self, name: &str) -> DuckResult<Value> {
        let capability = self.property(name)?;
        match &capability.accessor {
            Accessor::Direct(member) => {
                let raw = self.read(member)?;
                self.coerce(&raw, capability.member.value_type())
            }
            Accessor::Nested(member) => self.read(member),
            Accessor::Convert { source_member, .. } => {
                let raw = self.read(source_member)?;
                let converted = self.registry.convert(&raw, capability.member.value_type())?;
                Ok(converted)
            }
            Accessor::Absent => Ok(Value::Null),
            Accessor::Method(_) => Err(wrong_kind(name, "property")),
        }
    }

    /// Write a property through to the source.
    ///
    /// The value is converted to the declared type if needed, then back to
    /// the type stored on the source for convertible members.
    pub fn set(&self, name: &str, value: Value) -> DuckResult<()> {
        let capability = self.property(name)?;
        if !capability.member.is_writable() {
            return Err(self.refuse(name, format!("declared read-only by {}", self.shape.name())));
        }

        let declared = capability.member.value_type();
        let typed = self.coerce(&value, declared)?;

        match &capability.accessor {
            Accessor::Direct(member) | Accessor::Nested(member) => self.write(name, member, typed),
            Accessor::Convert {
                source_member,
                stored,
            } => {
                let stored_value = self.registry.convert(&typed, stored)?;
                self.write(name, source_member, stored_value)
            }
            // A mapping can take a key it did not have; an object cannot grow one
            Accessor::Absent => match &self.target {
                Target::Map(_) => self.write(name, &capability.member.name, typed),
                Target::Object(object) => Err(self.refuse(
                    name,
                    format!("{} has no such member", object.type_name()),
                )),
            },
            Accessor::Method(_) => Err(wrong_kind(name, "property")),
        }
    }

    /// Invoke a method on the source, checking the call against the
    /// signature the shape declares.
    pub fn call(&self, name: &str, args: &[Value]) -> DuckResult<Value> {
        let capability = self.capability(name)?;
        let (Accessor::Method(source_member), MemberKind::Method(signature)) =
            (&capability.accessor, &capability.member.kind)
        else {
            return Err(wrong_kind(name, "method"));
        };

        check_arguments(name, signature, args)?;

        match &self.target {
            Target::Object(object) => {
                trace!(member = name, source = object.type_name(), "forwarding call");
                Ok(object.invoke(source_member, args)?)
            }
            Target::Map(_) => Err(wrong_kind(name, "method")),
        }
    }

    /// Adapter for a shape-typed member, synthesised from its live value
    pub fn nested(&self, name: &str) -> DuckResult<Adapter> {
        let capability = self.property(name)?;
        let ValueType::Shape(nested_shape) = capability.member.value_type() else {
            return Err(wrong_kind(name, "shape-typed property"));
        };

        let value = self.get(name)?;
        let source = Source::from_value(&value).ok_or_else(|| DuckError::NotNestable {
            member: name.to_string(),
            found: value.type_name(),
        })?;

        let plan = Inspector::new(&self.registry, &self.options).resolve(nested_shape, &source)?;
        Adapter::build(
            nested_shape.clone(),
            source,
            Arc::new(plan),
            self.registry.clone(),
            self.options.clone(),
        )
    }

    fn capability(&self, name: &str) -> DuckResult<&Capability> {
        self.capabilities
            .get(name)
            .ok_or_else(|| DuckError::UnknownMember {
                shape: self.shape.name().to_string(),
                member: name.to_string(),
            })
    }

    fn property(&self, name: &str) -> DuckResult<&Capability> {
        let capability = self.capability(name)?;
        if capability.member.is_property() {
            Ok(capability)
        } else {
            Err(wrong_kind(name, "property"))
        }
    }

    fn read(&self, member: &str) -> DuckResult<Value> {
        match &self.target {
            Target::Map(view) => view.look_up(member).ok_or_else(|| {
                DuckError::Host(HostError::MissingMember {
                    type_name: self.source.type_name().to_string(),
                    member: member.to_string(),
                })
            }),
            Target::Object(object) => Ok(object.get(member)?),
        }
    }

    fn write(&self, name: &str, member: &str, value: Value) -> DuckResult<()> {
        let result = match &self.target {
            Target::Map(view) => {
                if view.is_read_only() {
                    return Err(self.refuse(name, "mapping is read-only".to_string()));
                }
                view.insert(member, value)
            }
            Target::Object(object) => {
                let settable = object
                    .schema()
                    .member(member)
                    .map(MemberSignature::is_writable)
                    .unwrap_or(false);
                if !settable {
                    return Err(self.refuse(
                        name,
                        format!("{}.{} has no setter", object.type_name(), member),
                    ));
                }
                object.set(member, value)
            }
        };

        match result {
            Err(HostError::ReadOnly { .. }) => Err(self.refuse(name, "source refused the write".to_string())),
            other => Ok(other?),
        }
    }

    fn coerce(&self, value: &Value, declared: &ValueType) -> DuckResult<Value> {
        if value.is_null() || value.conforms_to(declared) {
            return Ok(value.clone());
        }
        if !self.options.allow_conversion {
            return Err(ConversionError::NoConverter {
                from: value.value_type(),
                to: declared.clone(),
            }
            .into());
        }
        Ok(self.registry.convert(value, declared)?)
    }

    fn refuse(&self, name: &str, reason: String) -> DuckError {
        warn!(shape = self.shape.name(), member = name, %reason, "write refused");
        DuckError::NotWritable {
            member: name.to_string(),
            reason,
        }
    }
}

fn wrong_kind(member: &str, expected: &'static str) -> DuckError {
    DuckError::WrongMemberKind {
        member: member.to_string(),
        expected,
    }
}

fn check_arguments(name: &str, signature: &MethodSignature, args: &[Value]) -> DuckResult<()> {
    let mismatch = |reason: String| DuckError::SignatureMismatch {
        member: name.to_string(),
        signature: signature.to_string(),
        reason,
    };

    if args.len() != signature.params.len() {
        return Err(mismatch(format!(
            "expected {} argument(s), got {}",
            signature.params.len(),
            args.len()
        )));
    }
    for (i, (param, arg)) in signature.params.iter().zip(args).enumerate() {
        if !arg.conforms_to(param) {
            return Err(mismatch(format!(
                "argument {} expected {}, got {}",
                i,
                param,
                arg.type_name()
            )));
        }
    }
    Ok(())
}

impl fmt::Debug for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapter")
            .field("shape", &self.shape.name())
            .field("source", &self.source)
            .field("members", &self.capabilities.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mallard_sdk::{Dictionary, DynObject, KeyComparison, MapRef};

    fn adapt(shape: Shape, source: Source) -> DuckResult<Adapter> {
        let registry = Arc::new(ConverterRegistry::with_defaults());
        let options = DuckOptions::default();
        let shape = Arc::new(shape);
        let plan = Inspector::new(&registry, &options).resolve(&shape, &source)?;
        Adapter::build(shape, source, Arc::new(plan), registry, options)
    }

    fn record() -> Shape {
        Shape::builder("Record")
            .property("Id", ValueType::Integer)
            .writable("Name", ValueType::Text)
            .build()
            .unwrap()
    }

    fn dict(entries: &[(&str, Value)]) -> Arc<Dictionary> {
        Arc::new(Dictionary::from_entries(
            KeyComparison::Ordinal,
            entries.iter().map(|(k, v)| (*k, v.clone())),
        ))
    }

    #[test]
    fn test_reads_are_live() {
        let map = dict(&[("Id", Value::from("1")), ("Name", Value::from("a"))]);
        let adapter = adapt(record(), Source::Map(map.clone())).unwrap();
        assert_eq!(adapter.get("Id").unwrap(), Value::from(1));

        map.insert("Id", Value::from("2")).unwrap();
        assert_eq!(adapter.get("Id").unwrap(), Value::from(2));
    }

    #[test]
    fn test_live_conversion_failure() {
        let map = dict(&[("Id", Value::from("1")), ("Name", Value::from("a"))]);
        let adapter = adapt(record(), Source::Map(map.clone())).unwrap();

        map.insert("Id", Value::from("abc")).unwrap();
        assert!(matches!(
            adapter.get("Id"),
            Err(DuckError::Conversion(ConversionError::Unparseable { .. }))
        ));
    }

    #[test]
    fn test_direct_member_tracks_live_value_type() {
        let shape = Shape::builder("Aged")
            .property("Age", ValueType::Integer)
            .build()
            .unwrap();
        let map = dict(&[("Age", Value::Null)]);
        let adapter = adapt(shape, Source::Map(map.clone())).unwrap();
        assert_eq!(adapter.get("Age").unwrap(), Value::Null);

        map.insert("Age", Value::from("36")).unwrap();
        assert_eq!(adapter.get("Age").unwrap(), Value::Int(36));

        map.insert("Age", Value::from("abc")).unwrap();
        assert!(matches!(
            adapter.get("Age"),
            Err(DuckError::Conversion(ConversionError::Unparseable { .. }))
        ));

        map.insert("Age", Value::List(vec![])).unwrap();
        assert!(matches!(
            adapter.get("Age"),
            Err(DuckError::Conversion(ConversionError::NoConverter { .. }))
        ));
    }

    #[test]
    fn test_write_converts_back_to_stored_type() {
        let shape = Shape::builder("Counter")
            .writable("Count", ValueType::Integer)
            .build()
            .unwrap();
        let map = dict(&[("Count", Value::from("1"))]);
        let adapter = adapt(shape, Source::Map(map.clone())).unwrap();

        adapter.set("Count", Value::from(5)).unwrap();
        assert_eq!(map.get("Count"), Some(Value::from("5")));
        assert_eq!(adapter.get("Count").unwrap(), Value::from(5));
    }

    #[test]
    fn test_write_to_read_only_member() {
        let map = dict(&[("Id", Value::from(1)), ("Name", Value::from("a"))]);
        let adapter = adapt(record(), Source::Map(map)).unwrap();
        assert!(matches!(
            adapter.set("Id", Value::from(2)),
            Err(DuckError::NotWritable { .. })
        ));
    }

    #[test]
    fn test_write_to_read_only_mapping() {
        let map: MapRef = Arc::new(
            Dictionary::from_entries(KeyComparison::Ordinal, [("Id", Value::from(1)), ("Name", Value::from("a"))])
                .into_read_only(),
        );
        let adapter = adapt(record(), Source::Map(map)).unwrap();
        assert!(matches!(
            adapter.set("Name", Value::from("b")),
            Err(DuckError::NotWritable { .. })
        ));
    }

    #[test]
    fn test_write_to_object_without_setter() {
        let object = DynObject::builder("Row")
            .read_only_field("Id", ValueType::Integer, 1)
            .read_only_field("Name", ValueType::Text, "a")
            .build_ref()
            .unwrap();
        let adapter = adapt(record(), Source::Object(object)).unwrap();
        let err = adapter.set("Name", Value::from("b")).unwrap_err();
        assert!(matches!(err, DuckError::NotWritable { ref member, .. } if member == "Name"));
    }

    #[test]
    fn test_write_with_wrong_type() {
        let map = dict(&[("Id", Value::from(1)), ("Name", Value::from("a"))]);
        let adapter = adapt(record(), Source::Map(map)).unwrap();
        let list = Value::List(vec![]);
        assert!(matches!(
            adapter.set("Name", list),
            Err(DuckError::Conversion(ConversionError::NoConverter { .. }))
        ));
    }

    #[test]
    fn test_unknown_member_and_wrong_kind() {
        let map = dict(&[("Id", Value::from(1)), ("Name", Value::from("a"))]);
        let adapter = adapt(record(), Source::Map(map)).unwrap();
        assert!(matches!(adapter.get("Other"), Err(DuckError::UnknownMember { .. })));
        assert!(matches!(
            adapter.call("Name", &[]),
            Err(DuckError::WrongMemberKind { expected: "method", .. })
        ));
    }

    #[test]
    fn test_call_checks_signature() {
        let object = DynObject::builder("Greeter")
            .method("Greet", vec![ValueType::Text], ValueType::Text, |_, args| {
                Ok(Value::from(format!("hello {}", args[0].as_text().unwrap_or_default())))
            })
            .build_ref()
            .unwrap();
        let shape = Shape::builder("Greets")
            .method("Greet", vec![ValueType::Text], ValueType::Text)
            .build()
            .unwrap();
        let adapter = adapt(shape, Source::Object(object)).unwrap();

        assert_eq!(
            adapter.call("Greet", &[Value::from("ada")]).unwrap(),
            Value::from("hello ada")
        );
        assert!(matches!(
            adapter.call("Greet", &[]),
            Err(DuckError::SignatureMismatch { .. })
        ));
        assert!(matches!(
            adapter.call("Greet", &[Value::from(1)]),
            Err(DuckError::SignatureMismatch { .. })
        ));
        assert!(matches!(
            adapter.get("Greet"),
            Err(DuckError::WrongMemberKind { expected: "property", .. })
        ));
    }

    #[test]
    fn test_absent_optional_reads_null() {
        let shape = Shape::builder("S")
            .property("Id", ValueType::Integer)
            .optional("Nick", ValueType::Text)
            .build()
            .unwrap();
        let map = dict(&[("Id", Value::from(1))]);
        let adapter = adapt(shape, Source::Map(map)).unwrap();
        assert_eq!(adapter.get("Nick").unwrap(), Value::Null);
    }
}
