//! Binding metadata: members, directives, handler bindings
//!
//! Everything here describes a *type*, never an instance. A `TypeEntry<T>` is
//! built once per type by `TypeBuilder` and shared through the metadata cache.

use std::fmt;
use std::sync::Arc;

use crate::class_db::{NODE_CLASS, RESOURCE_CLASS};
use crate::tree::SceneTree;
use crate::variant::{Variant, VariantError};

/// Declared type of a bindable member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberType {
    /// Holds a node of this class (or a subclass)
    Node(&'static str),
    /// Holds a resource of this class (or a subclass)
    Resource(&'static str),
    /// Holds a node path
    NodePath,
    /// Any other value; the name is informational
    Value(&'static str),
}

impl MemberType {
    /// Any node
    pub const ANY_NODE: MemberType = MemberType::Node(NODE_CLASS);
    /// Any resource
    pub const ANY_RESOURCE: MemberType = MemberType::Resource(RESOURCE_CLASS);

    /// Declared type name; also the last fallback name when resolving nodes
    pub fn name(&self) -> &'static str {
        match self {
            MemberType::Node(class) | MemberType::Resource(class) | MemberType::Value(class) => *class,
            MemberType::NodePath => "NodePath",
        }
    }

    /// Check that `value` may be stored in a member of this type.
    /// On failure returns the name of the offending value's type.
    pub(crate) fn check(&self, tree: &SceneTree, value: &Variant) -> Result<(), String> {
        let found = || match value {
            Variant::Node(id) => tree.class(*id).unwrap_or("<freed node>").to_string(),
            Variant::Resource(res) => res.class.to_string(),
            other => other.type_name().to_string(),
        };

        let ok = match (self, value) {
            (MemberType::Node(class), Variant::Node(id)) => tree.is_class(*id, class),
            (MemberType::Resource(class), Variant::Resource(res)) => {
                *class == RESOURCE_CLASS || tree.classes().is_resource_class(&res.class, class)
            }
            (MemberType::NodePath, Variant::Path(_)) => true,
            (MemberType::Value(_), Variant::Node(_) | Variant::Resource(_)) => false,
            (MemberType::Value(_), _) => true,
            _ => false,
        };

        if ok {
            Ok(())
        } else {
            Err(found())
        }
    }
}

impl fmt::Display for MemberType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Field or property; fields are processed first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MemberKind {
    Field,
    Property,
}

/// What to bind into a member
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Node at this path; empty means "find it by convention"
    NodePath(String),
    /// Node at the path currently held by the named member
    ResolveNode(String),
    /// Resource loaded from this id
    Resource(String),
    /// Node under the singleton registry, optionally with an explicit name
    Singleton(Option<String>),
}

/// Discriminant of `Directive`; a member carries at most one of each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    NodePath,
    ResolveNode,
    Resource,
    Singleton,
}

impl Directive {
    pub fn kind(&self) -> DirectiveKind {
        match self {
            Directive::NodePath(_) => DirectiveKind::NodePath,
            Directive::ResolveNode(_) => DirectiveKind::ResolveNode,
            Directive::Resource(_) => DirectiveKind::Resource,
            Directive::Singleton(_) => DirectiveKind::Singleton,
        }
    }
}

pub type Getter<T> = fn(&T) -> Variant;
pub type Setter<T> = fn(&mut T, Variant) -> Result<(), VariantError>;
pub type Invoker<T> = fn(&mut T, &[Variant]);

/// Uniform view over one field or property of `T`
pub struct BindableMember<T> {
    pub name: Arc<str>,
    pub ty: MemberType,
    pub kind: MemberKind,
    pub directives: Vec<Directive>,
    pub(crate) get: Getter<T>,
    pub(crate) set: Setter<T>,
}

impl<T> BindableMember<T> {
    /// Current value of this member on `obj`
    pub fn get(&self, obj: &T) -> Variant {
        (self.get)(obj)
    }

    /// Store `value` into this member on `obj`
    pub fn set(&self, obj: &mut T, value: Variant) -> Result<(), VariantError> {
        (self.set)(obj, value)
    }

    pub fn directive(&self, kind: DirectiveKind) -> Option<&Directive> {
        self.directives.iter().find(|d| d.kind() == kind)
    }
}

impl<T> fmt::Debug for BindableMember<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindableMember")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("kind", &self.kind)
            .field("directives", &self.directives)
            .finish_non_exhaustive()
    }
}

/// Callable handler method of `T`
pub struct HandlerMethod<T> {
    pub name: Arc<str>,
    pub(crate) invoke: Invoker<T>,
}

impl<T> fmt::Debug for HandlerMethod<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerMethod")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Subscribe `method` to `signal` emitted by the node in `source`
/// (or by the object's own node when `source` is None)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerBinding {
    pub method: Arc<str>,
    pub signal: Arc<str>,
    pub source: Option<Arc<str>>,
}

/// Everything the resolver knows about one type
#[derive(Debug)]
pub struct TypeEntry<T> {
    pub type_name: &'static str,
    /// Fields first, then properties; declaration order within each
    pub members: Vec<BindableMember<T>>,
    pub methods: Vec<HandlerMethod<T>>,
    pub handlers: Vec<HandlerBinding>,
}

impl<T> TypeEntry<T> {
    pub fn member(&self, name: &str) -> Option<&BindableMember<T>> {
        self.members.iter().find(|m| &*m.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&HandlerMethod<T>> {
        self.methods.iter().find(|m| &*m.name == name)
    }

    /// True when the type binds nothing
    pub fn is_inert(&self) -> bool {
        self.handlers.is_empty() && self.members.iter().all(|m| m.directives.is_empty())
    }
}
