//! Dynamic values carried through member accessors
//!
//! Getters and setters captured at cache-build time exchange `Variant`s so the
//! dispatcher can treat every member uniformly. Conversions back into concrete
//! member types go through `TryFrom<Variant>` and fail with `VariantError`.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::node_path::NodePath;
use crate::resource::Resource;
use crate::tree::NodeId;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Variant {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Path(NodePath),
    Node(NodeId),
    Resource(Arc<Resource>),
}

impl Variant {
    /// Name of the held type, used in mismatch messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Variant::Nil => "Nil",
            Variant::Bool(_) => "bool",
            Variant::Int(_) => "int",
            Variant::Float(_) => "float",
            Variant::String(_) => "String",
            Variant::Path(_) => "NodePath",
            Variant::Node(_) => "Node",
            Variant::Resource(_) => "Resource",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Variant::Nil)
    }

    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Variant::Node(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&NodePath> {
        match self {
            Variant::Path(path) => Some(path),
            _ => None,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Nil => write!(f, "<nil>"),
            Variant::Bool(b) => write!(f, "{}", b),
            Variant::Int(i) => write!(f, "{}", i),
            Variant::Float(x) => write!(f, "{}", x),
            Variant::String(s) => write!(f, "{}", s),
            Variant::Path(p) => write!(f, "{}", p),
            Variant::Node(id) => write!(f, "{}", id),
            Variant::Resource(res) => write!(f, "{}", res.path),
        }
    }
}

/// A `Variant` could not be converted into the member's concrete type
#[derive(Error, Debug, Clone, PartialEq)]
#[error("expected {expected}, found {found}")]
pub struct VariantError {
    pub expected: &'static str,
    pub found: &'static str,
}

impl VariantError {
    pub fn new(expected: &'static str, found: &Variant) -> Self {
        Self {
            expected,
            found: found.type_name(),
        }
    }
}

// ─────────────────────────────────────────────────────────────
// Into Variant
// ─────────────────────────────────────────────────────────────

impl From<bool> for Variant {
    fn from(v: bool) -> Self {
        Variant::Bool(v)
    }
}

impl From<i64> for Variant {
    fn from(v: i64) -> Self {
        Variant::Int(v)
    }
}

impl From<f64> for Variant {
    fn from(v: f64) -> Self {
        Variant::Float(v)
    }
}

impl From<String> for Variant {
    fn from(v: String) -> Self {
        Variant::String(v)
    }
}

impl From<&str> for Variant {
    fn from(v: &str) -> Self {
        Variant::String(v.to_string())
    }
}

impl From<NodePath> for Variant {
    fn from(v: NodePath) -> Self {
        Variant::Path(v)
    }
}

impl From<NodeId> for Variant {
    fn from(v: NodeId) -> Self {
        Variant::Node(v)
    }
}

impl From<Arc<Resource>> for Variant {
    fn from(v: Arc<Resource>) -> Self {
        Variant::Resource(v)
    }
}

impl<T: Into<Variant>> From<Option<T>> for Variant {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Variant::Nil)
    }
}

// ─────────────────────────────────────────────────────────────
// From Variant
// ─────────────────────────────────────────────────────────────

impl TryFrom<Variant> for NodeId {
    type Error = VariantError;

    fn try_from(v: Variant) -> Result<Self, Self::Error> {
        match v {
            Variant::Node(id) => Ok(id),
            other => Err(VariantError::new("Node", &other)),
        }
    }
}

impl TryFrom<Variant> for NodePath {
    type Error = VariantError;

    fn try_from(v: Variant) -> Result<Self, Self::Error> {
        match v {
            Variant::Path(path) => Ok(path),
            Variant::String(s) => Ok(NodePath::new(&s)),
            other => Err(VariantError::new("NodePath", &other)),
        }
    }
}

impl TryFrom<Variant> for Arc<Resource> {
    type Error = VariantError;

    fn try_from(v: Variant) -> Result<Self, Self::Error> {
        match v {
            Variant::Resource(res) => Ok(res),
            other => Err(VariantError::new("Resource", &other)),
        }
    }
}

impl TryFrom<Variant> for i64 {
    type Error = VariantError;

    fn try_from(v: Variant) -> Result<Self, Self::Error> {
        match v {
            Variant::Int(i) => Ok(i),
            other => Err(VariantError::new("int", &other)),
        }
    }
}

impl TryFrom<Variant> for String {
    type Error = VariantError;

    fn try_from(v: Variant) -> Result<Self, Self::Error> {
        match v {
            Variant::String(s) => Ok(s),
            other => Err(VariantError::new("String", &other)),
        }
    }
}
