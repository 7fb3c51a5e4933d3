//! Resolution plans

use std::fmt;
use std::sync::Arc;

use mallard_types::{MemberSignature, MethodSignature, Shape, ValueType};

/// Why a member could not be resolved
#[derive(Debug, Clone, PartialEq)]
pub enum UnresolvedReason {
    /// No member of that name on the source
    Missing,
    /// A member exists but its type neither matches nor converts
    TypeMismatch {
        /// Type found on the source
        found: ValueType,
    },
    /// A method exists but its signature does not fit
    SignatureMismatch {
        /// Signature found on the source
        found: MethodSignature,
    },
    /// Property where a method was expected, or the other way round
    KindMismatch,
    /// Methods cannot be backed by a mapping
    MethodOnMapping,
    /// Nested shape members that did not resolve (dotted paths)
    Nested(Vec<String>),
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedReason::Missing => write!(f, "missing"),
            UnresolvedReason::TypeMismatch { found } => {
                write!(f, "found {} with no converter", found)
            }
            UnresolvedReason::SignatureMismatch { found } => {
                write!(f, "signature mismatch, found {}", found)
            }
            UnresolvedReason::KindMismatch => write!(f, "member kind mismatch"),
            UnresolvedReason::MethodOnMapping => write!(f, "mappings cannot provide methods"),
            UnresolvedReason::Nested(paths) => write!(f, "nested: {}", paths.join(", ")),
        }
    }
}

/// How one target member is satisfied
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Read and written as-is
    Direct {
        /// Member or key name on the source
        source_member: String,
    },
    /// Bridged by a registered converter
    Convertible {
        /// Member or key name on the source
        source_member: String,
        /// Type found on the source
        from: ValueType,
        /// Type the shape declares
        to: ValueType,
    },
    /// Shape-typed member backed by a nested mapping or object
    Nested {
        /// Member or key name on the source
        source_member: String,
    },
    /// Method forwarded to the source
    Method {
        /// Method name on the source
        source_member: String,
        /// Signature found on the source
        signature: MethodSignature,
    },
    /// Optional member the source does not have
    Absent,
    /// Not satisfiable
    Unresolved(UnresolvedReason),
}

impl Resolution {
    /// Source member backing this resolution, if any
    pub fn source_member(&self) -> Option<&str> {
        match self {
            Resolution::Direct { source_member }
            | Resolution::Convertible { source_member, .. }
            | Resolution::Nested { source_member }
            | Resolution::Method { source_member, .. } => Some(source_member),
            Resolution::Absent | Resolution::Unresolved(_) => None,
        }
    }

    /// Check if this member is unresolved
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Resolution::Unresolved(_))
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Direct { source_member } => write!(f, "direct ({})", source_member),
            Resolution::Convertible {
                source_member,
                from,
                to,
            } => write!(f, "convert {} -> {} ({})", from, to, source_member),
            Resolution::Nested { source_member } => write!(f, "nested ({})", source_member),
            Resolution::Method {
                source_member,
                signature,
            } => write!(f, "method {}{}", source_member, signature),
            Resolution::Absent => write!(f, "absent"),
            Resolution::Unresolved(reason) => write!(f, "unresolved: {}", reason),
        }
    }
}

/// Resolution of a single target member
#[derive(Debug, Clone, PartialEq)]
pub struct MemberResolution {
    /// Target member
    pub member: MemberSignature,
    /// How it is satisfied
    pub resolution: Resolution,
}

/// Result of inspecting a source against a shape, one entry per member in
/// declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionPlan {
    shape: Arc<Shape>,
    case_sensitive: bool,
    entries: Vec<MemberResolution>,
}

impl ResolutionPlan {
    pub(crate) fn new(shape: Arc<Shape>, case_sensitive: bool, entries: Vec<MemberResolution>) -> Self {
        Self {
            shape,
            case_sensitive,
            entries,
        }
    }

    /// Shape the plan was built for
    pub fn shape(&self) -> &Arc<Shape> {
        &self.shape
    }

    /// Whether member names were matched case-sensitively
    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Per-member entries in declaration order
    pub fn entries(&self) -> &[MemberResolution] {
        &self.entries
    }

    /// Resolution of a member by name
    pub fn resolution(&self, member: &str) -> Option<&Resolution> {
        self.entries
            .iter()
            .find(|e| e.member.name == member)
            .map(|e| &e.resolution)
    }

    /// A plan is satisfiable when no member is unresolved
    pub fn is_satisfiable(&self) -> bool {
        !self.entries.iter().any(|e| e.resolution.is_unresolved())
    }

    /// Names of unresolved members. Nested failures are reported as
    /// dotted paths (`Inner.Id`).
    pub fn unresolved(&self) -> Vec<String> {
        let mut names = Vec::new();
        for entry in &self.entries {
            match &entry.resolution {
                Resolution::Unresolved(UnresolvedReason::Nested(paths)) => {
                    names.extend(paths.iter().map(|p| format!("{}.{}", entry.member.name, p)));
                }
                Resolution::Unresolved(_) => names.push(entry.member.name.clone()),
                _ => {}
            }
        }
        names
    }
}

impl fmt::Display for ResolutionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "plan for {}:", self.shape.name())?;
        for entry in &self.entries {
            writeln!(f, "  {}: {}", entry.member, entry.resolution)?;
        }
        Ok(())
    }
}
