//! Reflected host objects
//!
//! `Reflect` is the member-introspection surface the engine needs from a
//! host object: a schema describing the visible members and their types,
//! plus by-name get, set and invoke. `DynObject` is a ready-made
//! implementation whose fields and methods are declared at run time.

use std::sync::Arc;

use mallard_types::{MemberKind, MemberSignature, MethodSignature, Shape, ValueType};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::error::{HostError, HostResult};
use crate::value::{ObjectRef, Value};

/// Member introspection for a host object.
///
/// `schema` describes the visible members: a property with `writable: true`
/// has a setter. Implementations use interior mutability for `set`.
pub trait Reflect: Send + Sync {
    /// Concrete type name
    fn type_name(&self) -> &str;

    /// Visible members and their declared types
    fn schema(&self) -> Arc<Shape>;

    /// Read a property
    fn get(&self, name: &str) -> HostResult<Value>;

    /// Write a property
    fn set(&self, name: &str, value: Value) -> HostResult<()>;

    /// Invoke a method
    fn invoke(&self, name: &str, args: &[Value]) -> HostResult<Value>;
}

/// Method body for a `DynObject`
pub type MethodFn = Arc<dyn Fn(&DynObject, &[Value]) -> HostResult<Value> + Send + Sync>;

/// Builder for constructing `DynObject` instances
pub struct DynObjectBuilder {
    type_name: String,
    members: Vec<MemberSignature>,
    fields: FxHashMap<String, Value>,
    methods: FxHashMap<String, MethodFn>,
}

impl DynObjectBuilder {
    /// Add a writable field with its initial value
    pub fn field(self, name: &str, ty: ValueType, value: impl Into<Value>) -> Self {
        self.add_field(name, ty, true, value.into())
    }

    /// Add a field without a setter
    pub fn read_only_field(self, name: &str, ty: ValueType, value: impl Into<Value>) -> Self {
        self.add_field(name, ty, false, value.into())
    }

    /// Add a method
    pub fn method<F>(mut self, name: &str, params: Vec<ValueType>, returns: ValueType, body: F) -> Self
    where
        F: Fn(&DynObject, &[Value]) -> HostResult<Value> + Send + Sync + 'static,
    {
        self.members.push(MemberSignature {
            name: name.to_string(),
            kind: MemberKind::Method(MethodSignature::new(params, returns)),
            optional: false,
        });
        self.methods.insert(name.to_string(), Arc::new(body));
        self
    }

    fn add_field(mut self, name: &str, ty: ValueType, writable: bool, value: Value) -> Self {
        self.members.push(MemberSignature {
            name: name.to_string(),
            kind: MemberKind::Property { ty, writable },
            optional: false,
        });
        self.fields.insert(name.to_string(), value);
        self
    }

    /// Build the object, checking member names and initial field values
    pub fn build(self) -> HostResult<DynObject> {
        let mut builder = Shape::builder(self.type_name.clone());
        for member in self.members {
            builder = builder.member(member);
        }
        let schema = builder.build().map_err(|e| HostError::TypeMismatch {
            expected: "distinct member names".to_string(),
            got: e.to_string(),
        })?;

        for member in schema.members() {
            if let (MemberKind::Property { ty, .. }, Some(value)) =
                (&member.kind, self.fields.get(&member.name))
            {
                check_type(ty, value)?;
            }
        }

        Ok(DynObject {
            type_name: self.type_name,
            schema: Arc::new(schema),
            fields: RwLock::new(self.fields),
            methods: self.methods,
        })
    }

    /// Build the object as a shared handle
    pub fn build_ref(self) -> HostResult<ObjectRef> {
        Ok(Arc::new(self.build()?))
    }
}

fn check_type(ty: &ValueType, value: &Value) -> HostResult<()> {
    if value.conforms_to(ty) {
        Ok(())
    } else {
        Err(HostError::TypeMismatch {
            expected: ty.to_string(),
            got: value.type_name(),
        })
    }
}

/// Host object with fields and methods declared at run time
pub struct DynObject {
    type_name: String,
    schema: Arc<Shape>,
    fields: RwLock<FxHashMap<String, Value>>,
    methods: FxHashMap<String, MethodFn>,
}

impl DynObject {
    /// Create a builder for manual object construction
    pub fn builder(type_name: &str) -> DynObjectBuilder {
        DynObjectBuilder {
            type_name: type_name.to_string(),
            members: Vec::new(),
            fields: FxHashMap::default(),
            methods: FxHashMap::default(),
        }
    }

    /// Read a field, bypassing setter rules (for method bodies)
    pub fn field(&self, name: &str) -> Option<Value> {
        self.fields.read().get(name).cloned()
    }

    fn missing(&self, name: &str) -> HostError {
        HostError::MissingMember {
            type_name: self.type_name.clone(),
            member: name.to_string(),
        }
    }
}

impl Reflect for DynObject {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn schema(&self) -> Arc<Shape> {
        self.schema.clone()
    }

    fn get(&self, name: &str) -> HostResult<Value> {
        self.fields
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| self.missing(name))
    }

    fn set(&self, name: &str, value: Value) -> HostResult<()> {
        let member = self
            .schema
            .member(name)
            .filter(|m| m.is_property())
            .ok_or_else(|| self.missing(name))?;
        if !member.is_writable() {
            return Err(HostError::ReadOnly {
                member: name.to_string(),
            });
        }
        check_type(member.value_type(), &value)?;
        self.fields.write().insert(name.to_string(), value);
        Ok(())
    }

    fn invoke(&self, name: &str, args: &[Value]) -> HostResult<Value> {
        let body = self.methods.get(name).ok_or_else(|| self.missing(name))?;
        if let Some(sig) = self.schema.member(name).and_then(|m| m.as_method()) {
            if sig.params.len() != args.len() {
                return Err(HostError::ArgumentCount {
                    member: name.to_string(),
                    expected: sig.params.len(),
                    got: args.len(),
                });
            }
            for (param, arg) in sig.params.iter().zip(args) {
                check_type(param, arg)?;
            }
        }
        body(self, args)
    }
}

impl std::fmt::Debug for DynObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynObject")
            .field("type_name", &self.type_name)
            .field("schema", &self.schema.to_string())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> DynObject {
        DynObject::builder("Person")
            .field("Name", ValueType::Text, "Alice")
            .read_only_field("Id", ValueType::Integer, 7)
            .method("Greet", vec![ValueType::Text], ValueType::Text, |this, args| {
                let name = this.field("Name").unwrap_or_default();
                Ok(Value::from(format!(
                    "{}, {}",
                    args[0].as_text().unwrap_or(""),
                    name.as_text().unwrap_or("")
                )))
            })
            .build()
            .unwrap()
    }

    #[test]
    fn test_schema_describes_members() {
        let obj = person();
        let schema = obj.schema();
        assert_eq!(schema.name(), "Person");
        assert!(schema.member("Name").unwrap().is_writable());
        assert!(!schema.member("Id").unwrap().is_writable());
        assert!(schema.member("Greet").unwrap().as_method().is_some());
    }

    #[test]
    fn test_get_set() {
        let obj = person();
        obj.set("Name", Value::from("Bob")).unwrap();
        assert_eq!(obj.get("Name").unwrap(), Value::from("Bob"));
    }

    #[test]
    fn test_set_read_only_field_fails() {
        let obj = person();
        assert_eq!(
            obj.set("Id", Value::from(8)),
            Err(HostError::ReadOnly { member: "Id".into() })
        );
    }

    #[test]
    fn test_set_wrong_type_fails() {
        let obj = person();
        assert!(matches!(
            obj.set("Name", Value::from(3)),
            Err(HostError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_invoke_checks_arity() {
        let obj = person();
        assert_eq!(
            obj.invoke("Greet", &[Value::from("Hi")]).unwrap(),
            Value::from("Hi, Alice")
        );
        assert!(matches!(
            obj.invoke("Greet", &[]),
            Err(HostError::ArgumentCount { expected: 1, got: 0, .. })
        ));
    }

    #[test]
    fn test_initial_value_type_checked() {
        let result = DynObject::builder("Bad")
            .field("Age", ValueType::Integer, "old")
            .build();
        assert!(result.is_err());
    }
}
