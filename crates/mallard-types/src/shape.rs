//! Interface shapes: the named, typed member sets a duck-typed consumer requires

use std::fmt;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHashSet;

use crate::error::{TypeError, TypeResult};
use crate::ty::ValueType;

/// Method signature
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    /// Parameter types
    pub params: Vec<ValueType>,
    /// Return type
    pub returns: ValueType,
}

impl MethodSignature {
    /// Create a method signature
    pub fn new(params: Vec<ValueType>, returns: ValueType) -> Self {
        Self { params, returns }
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, ") => {}", self.returns)
    }
}

/// What kind of member a shape requires
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// A property, readable and optionally writable
    Property {
        /// Declared value type
        ty: ValueType,
        /// Whether consumers may write through this member
        writable: bool,
    },
    /// A method
    Method(MethodSignature),
}

/// A single member of a shape
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberSignature {
    /// Member name
    pub name: String,
    /// Member kind and type
    pub kind: MemberKind,
    /// Whether the member may be missing from a source
    pub optional: bool,
}

impl MemberSignature {
    /// Declared value type (return type for methods)
    pub fn value_type(&self) -> &ValueType {
        match &self.kind {
            MemberKind::Property { ty, .. } => ty,
            MemberKind::Method(sig) => &sig.returns,
        }
    }

    /// Check if this member is a property
    pub fn is_property(&self) -> bool {
        matches!(self.kind, MemberKind::Property { .. })
    }

    /// Check if this member is a writable property
    pub fn is_writable(&self) -> bool {
        matches!(self.kind, MemberKind::Property { writable: true, .. })
    }

    /// Get the method signature if this is a method
    pub fn as_method(&self) -> Option<&MethodSignature> {
        match &self.kind {
            MemberKind::Method(sig) => Some(sig),
            _ => None,
        }
    }
}

impl fmt::Display for MemberSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            MemberKind::Property { ty, writable } => {
                if !writable {
                    write!(f, "readonly ")?;
                }
                write!(f, "{}", self.name)?;
                if self.optional {
                    write!(f, "?")?;
                }
                write!(f, ": {}", ty)
            }
            MemberKind::Method(sig) => {
                write!(f, "{}", self.name)?;
                if self.optional {
                    write!(f, "?")?;
                }
                write!(f, "{}", sig)
            }
        }
    }
}

/// Interface shape.
///
/// Members keep their declaration order, but two shapes are equal when they
/// declare the same member set, whatever their names or member order.
#[derive(Debug, Clone)]
pub struct Shape {
    name: String,
    members: Vec<MemberSignature>,
}

impl Shape {
    /// Start building a shape
    pub fn builder(name: impl Into<String>) -> ShapeBuilder {
        ShapeBuilder {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Shape name, for diagnostics only
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Members in declaration order
    pub fn members(&self) -> &[MemberSignature] {
        &self.members
    }

    /// Look up a member by exact name
    pub fn member(&self, name: &str) -> Option<&MemberSignature> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if the shape declares no members
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn sorted_members(&self) -> Vec<&MemberSignature> {
        let mut sorted: Vec<_> = self.members.iter().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));
        sorted
    }
}

impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        self.members.len() == other.members.len()
            && self.sorted_members() == other.sorted_members()
    }
}

impl Eq for Shape {}

impl Hash for Shape {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for member in self.sorted_members() {
            member.hash(state);
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{ ", self.name)?;
        for (i, member) in self.members.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", member)?;
        }
        write!(f, " }}")
    }
}

/// Builder for [`Shape`]
#[derive(Debug, Clone)]
pub struct ShapeBuilder {
    name: String,
    members: Vec<MemberSignature>,
}

impl ShapeBuilder {
    /// Add a read-only property
    pub fn property(self, name: &str, ty: ValueType) -> Self {
        self.push(name, MemberKind::Property { ty, writable: false }, false)
    }

    /// Add a readable and writable property
    pub fn writable(self, name: &str, ty: ValueType) -> Self {
        self.push(name, MemberKind::Property { ty, writable: true }, false)
    }

    /// Add a read-only property that sources may omit
    pub fn optional(self, name: &str, ty: ValueType) -> Self {
        self.push(name, MemberKind::Property { ty, writable: false }, true)
    }

    /// Add a method
    pub fn method(self, name: &str, params: Vec<ValueType>, returns: ValueType) -> Self {
        self.push(
            name,
            MemberKind::Method(MethodSignature::new(params, returns)),
            false,
        )
    }

    /// Add a fully specified member
    pub fn member(mut self, member: MemberSignature) -> Self {
        self.members.push(member);
        self
    }

    fn push(mut self, name: &str, kind: MemberKind, optional: bool) -> Self {
        self.members.push(MemberSignature {
            name: name.to_string(),
            kind,
            optional,
        });
        self
    }

    /// Build the shape, rejecting empty and duplicate member names
    pub fn build(self) -> TypeResult<Shape> {
        let mut seen = FxHashSet::default();
        for member in &self.members {
            if member.name.is_empty() {
                return Err(TypeError::EmptyMemberName {
                    shape: self.name.clone(),
                });
            }
            if !seen.insert(member.name.as_str()) {
                return Err(TypeError::DuplicateMember {
                    shape: self.name.clone(),
                    member: member.name.clone(),
                });
            }
        }

        Ok(Shape {
            name: self.name,
            members: self.members,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(shape: &Shape) -> u64 {
        let mut hasher = DefaultHasher::new();
        shape.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_equality_ignores_name_and_order() {
        let a = Shape::builder("IPerson")
            .property("Name", ValueType::Text)
            .writable("Age", ValueType::Integer)
            .build()
            .unwrap();
        let b = Shape::builder("IHuman")
            .writable("Age", ValueType::Integer)
            .property("Name", ValueType::Text)
            .build()
            .unwrap();

        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_equality_respects_member_kind() {
        let a = Shape::builder("A").property("Id", ValueType::Integer).build().unwrap();
        let b = Shape::builder("B").writable("Id", ValueType::Integer).build().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_duplicate_member_rejected() {
        let result = Shape::builder("Dup")
            .property("Id", ValueType::Integer)
            .property("Id", ValueType::Text)
            .build();

        assert_eq!(
            result,
            Err(TypeError::DuplicateMember {
                shape: "Dup".into(),
                member: "Id".into()
            })
        );
    }

    #[test]
    fn test_display() {
        let shape = Shape::builder("IGreeter")
            .optional("Nick", ValueType::Text)
            .method("Greet", vec![ValueType::Text], ValueType::Text)
            .build()
            .unwrap();

        assert_eq!(
            format!("{}", shape),
            "IGreeter { readonly Nick?: text, Greet(text) => text }"
        );
    }
}
