//! Type registration
//!
//! `Bindable::describe` is run once per type, the first time an instance is
//! resolved. It lists the type's bindable members (with getter/setter pairs)
//! and its handler methods:
//!
//! ```ignore
//! impl Bindable for Player {
//!     fn node(&self) -> NodeId { self.node }
//!
//!     fn describe(ty: &mut TypeBuilder<Self>) {
//!         ty.field("_weapon", MemberType::Node("Sprite2D"),
//!                  |p| p.weapon.into(),
//!                  |p, v| { p.weapon = Some(v.try_into()?); Ok(()) })
//!             .node_path("");
//!         ty.handler("on_hit", |p, _| p.hits += 1).on("damaged");
//!     }
//! }
//! ```

use std::sync::Arc;

use tracing::warn;

use crate::interner::intern;
use crate::tree::NodeId;

use super::member::{
    BindableMember, Directive, Getter, HandlerBinding, HandlerMethod, Invoker, MemberKind,
    MemberType, Setter, TypeEntry,
};

/// An object living on a scene-tree node whose members can be bound
pub trait Bindable: Sized + 'static {
    /// Register members and handlers. Called once per type.
    ///
    /// May fetch metadata for other types through a `MetadataCache`, but must
    /// not request its own type (directly or through a cycle of types): that
    /// waits on the build already in progress and never returns.
    fn describe(ty: &mut TypeBuilder<Self>);

    /// Node this instance is attached to
    fn node(&self) -> NodeId;

    /// Name used in diagnostics; defaults to the unqualified Rust type name
    fn type_name() -> &'static str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }
}

/// Collects a type's metadata during `Bindable::describe`
pub struct TypeBuilder<T> {
    type_name: &'static str,
    members: Vec<BindableMember<T>>,
    methods: Vec<HandlerMethod<T>>,
    handlers: Vec<HandlerBinding>,
}

impl<T: Bindable> TypeBuilder<T> {
    pub(crate) fn build() -> TypeEntry<T> {
        let mut builder = Self {
            type_name: T::type_name(),
            members: Vec::new(),
            methods: Vec::new(),
            handlers: Vec::new(),
        };
        T::describe(&mut builder);
        builder.finish()
    }
}

impl<T> TypeBuilder<T> {
    fn finish(mut self) -> TypeEntry<T> {
        // Stable: declaration order survives within each kind
        self.members.sort_by_key(|m| m.kind);
        TypeEntry {
            type_name: self.type_name,
            members: self.members,
            methods: self.methods,
            handlers: self.handlers,
        }
    }

    /// Register a field
    pub fn field(
        &mut self,
        name: &str,
        ty: MemberType,
        get: Getter<T>,
        set: Setter<T>,
    ) -> MemberBuilder<'_, T> {
        self.member(MemberKind::Field, name, ty, get, set)
    }

    /// Register a property
    pub fn property(
        &mut self,
        name: &str,
        ty: MemberType,
        get: Getter<T>,
        set: Setter<T>,
    ) -> MemberBuilder<'_, T> {
        self.member(MemberKind::Property, name, ty, get, set)
    }

    fn member(
        &mut self,
        kind: MemberKind,
        name: &str,
        ty: MemberType,
        get: Getter<T>,
        set: Setter<T>,
    ) -> MemberBuilder<'_, T> {
        if let Some(pos) = self.members.iter().position(|m| &*m.name == name) {
            warn!(type_name = self.type_name, member = name, "Member registered twice, keeping the last");
            self.members.remove(pos);
        }

        self.members.push(BindableMember {
            name: intern(name),
            ty,
            kind,
            directives: Vec::new(),
            get,
            set,
        });
        let type_name = self.type_name;
        let index = self.members.len() - 1;
        MemberBuilder {
            type_name,
            member: &mut self.members[index],
        }
    }

    /// Register a handler method; chain `.on(..)` to subscribe it
    pub fn handler(&mut self, method: &str, invoke: Invoker<T>) -> HandlerBuilder<'_> {
        let method = intern(method);
        match self.methods.iter_mut().find(|m| m.name == method) {
            Some(existing) => existing.invoke = invoke,
            None => self.methods.push(HandlerMethod {
                name: method.clone(),
                invoke,
            }),
        }
        HandlerBuilder {
            handlers: &mut self.handlers,
            method,
        }
    }
}

/// Attaches directives to the member just registered
pub struct MemberBuilder<'a, T> {
    type_name: &'static str,
    member: &'a mut BindableMember<T>,
}

impl<T> MemberBuilder<'_, T> {
    /// Bind the node at `path`; an empty path falls back to naming conventions
    pub fn node_path(self, path: &str) -> Self {
        self.directive(Directive::NodePath(path.to_string()))
    }

    /// Bind the node at the path held by `member`
    pub fn resolve_node(self, member: &str) -> Self {
        self.directive(Directive::ResolveNode(member.to_string()))
    }

    /// Bind the resource loaded from `id`
    pub fn resource(self, id: &str) -> Self {
        self.directive(Directive::Resource(id.to_string()))
    }

    /// Bind a registry singleton, found by the member's name or type
    pub fn singleton(self) -> Self {
        self.directive(Directive::Singleton(None))
    }

    /// Bind a registry singleton by explicit name
    pub fn singleton_named(self, name: &str) -> Self {
        self.directive(Directive::Singleton(Some(name.to_string())))
    }

    /// Attach a directive, replacing any existing one of the same kind
    pub fn directive(self, directive: Directive) -> Self {
        let kind = directive.kind();
        if let Some(slot) = self.member.directives.iter_mut().find(|d| d.kind() == kind) {
            warn!(
                type_name = self.type_name,
                member = %self.member.name,
                ?kind,
                "Directive declared twice, keeping the last"
            );
            *slot = directive;
        } else {
            self.member.directives.push(directive);
        }
        self
    }
}

/// Attaches signal subscriptions to the handler just registered
pub struct HandlerBuilder<'a> {
    handlers: &'a mut Vec<HandlerBinding>,
    method: Arc<str>,
}

impl HandlerBuilder<'_> {
    /// Run this handler when the object's own node emits `signal`
    pub fn on(self, signal: &str) -> Self {
        self.push(signal, None)
    }

    /// Run this handler when the node held by `source` emits `signal`
    pub fn on_member(self, signal: &str, source: &str) -> Self {
        self.push(signal, Some(source))
    }

    fn push(self, signal: &str, source: Option<&str>) -> Self {
        let binding = HandlerBinding {
            method: self.method.clone(),
            signal: intern(signal),
            source: source.map(intern),
        };
        if !self.handlers.contains(&binding) {
            self.handlers.push(binding);
        }
        self
    }
}
