//! Resolution entry point
//!
//! `Resolver::on_ready` is called once per object, after its node has entered
//! the tree. It fills the object's bound members, then subscribes its
//! handlers. Both halves are also exposed on their own.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::binding::{
    self, Bindable, DispatchReport, MetadataCache, ResolveContext, SignalReport, TypeEntry,
};
use crate::config::ResolverConfig;
use crate::error::Result;
use crate::resource::{FsResourceLoader, ResourceLoader};
use crate::tree::{NodeId, SceneTree};
use crate::variant::Variant;

/// Outcome of `Resolver::on_ready`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadyReport {
    pub dispatch: DispatchReport,
    pub signals: SignalReport,
}

/// Binds members and handlers of `Bindable` objects against a `SceneTree`
#[derive(Clone)]
pub struct Resolver {
    config: ResolverConfig,
    /// Backs `Directive::Resource`
    loader: Arc<dyn ResourceLoader>,
    /// Shared with every other resolver unless replaced
    cache: Arc<MetadataCache>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}

impl Resolver {
    /// Resolver loading `res://` ids from `config.resource_root`
    pub fn new(config: ResolverConfig) -> Self {
        let loader = Arc::new(FsResourceLoader::new(config.resource_root.clone()));
        Self {
            config,
            loader,
            cache: MetadataCache::global(),
        }
    }

    pub fn with_loader(mut self, loader: Arc<dyn ResourceLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// Use a private metadata cache instead of the process-wide one
    pub fn with_cache(mut self, cache: Arc<MetadataCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Cached metadata for `T`
    pub fn metadata<T: Bindable>(&self) -> Arc<TypeEntry<T>> {
        self.cache.get_or_build::<T>()
    }

    /// Bind members, then handlers
    #[instrument(skip_all, fields(type_name = T::type_name(), node = %obj.node()))]
    pub fn on_ready<T: Bindable>(&self, tree: &mut SceneTree, obj: &mut T) -> Result<ReadyReport> {
        let entry = self.metadata::<T>();
        if entry.is_inert() {
            return Ok(ReadyReport::default());
        }

        let dispatch = self.dispatch_entry(tree, &entry, obj)?;
        let signals = binding::bind_handlers(tree, &entry, obj, obj.node())?;
        debug!(
            assigned = dispatch.assigned,
            skipped = dispatch.skipped,
            connected = signals.connected,
            "Object ready"
        );
        Ok(ReadyReport { dispatch, signals })
    }

    /// Execute every member directive of `obj`
    pub fn dispatch<T: Bindable>(&self, tree: &SceneTree, obj: &mut T) -> Result<DispatchReport> {
        let entry = self.metadata::<T>();
        self.dispatch_entry(tree, &entry, obj)
    }

    /// Subscribe every handler of `obj`; already-present subscriptions are kept
    pub fn bind_handlers<T: Bindable>(&self, tree: &mut SceneTree, obj: &T) -> Result<SignalReport> {
        let entry = self.metadata::<T>();
        binding::bind_handlers(tree, &entry, obj, obj.node())
    }

    /// Emit `signal` on `source` and run the handlers of `obj` subscribed to
    /// it. Returns how many ran.
    pub fn deliver<T: Bindable>(
        &self,
        tree: &SceneTree,
        obj: &mut T,
        source: NodeId,
        signal: &str,
        args: &[Variant],
    ) -> usize {
        let entry = self.metadata::<T>();
        let node = obj.node();
        binding::deliver(tree, &entry, obj, node, source, signal, args)
    }

    /// Invoke a handler method by name; false when `T` has none
    pub fn call<T: Bindable>(&self, obj: &mut T, method: &str, args: &[Variant]) -> bool {
        let entry = self.metadata::<T>();
        binding::call(&entry, obj, method, args)
    }

    fn dispatch_entry<T: Bindable>(
        &self,
        tree: &SceneTree,
        entry: &TypeEntry<T>,
        obj: &mut T,
    ) -> Result<DispatchReport> {
        let ctx = ResolveContext {
            tree,
            node: obj.node(),
            type_name: entry.type_name,
            config: &self.config,
            loader: self.loader.as_ref(),
        };
        binding::dispatch(&ctx, entry, obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{MemberType, TypeBuilder};

    struct Crate {
        node: NodeId,
        opened: u32,
    }

    impl Bindable for Crate {
        fn describe(ty: &mut TypeBuilder<Self>) {
            ty.handler("open", |c, _| c.opened += 1).on("interacted");
            ty.field("label", MemberType::Value("String"), |_| Variant::Nil, |_, _| Ok(()));
        }

        fn node(&self) -> NodeId {
            self.node
        }
    }

    #[test]
    fn on_ready_wires_handlers_once() {
        let resolver = Resolver::default().with_cache(Arc::new(MetadataCache::new()));
        let mut tree = SceneTree::new();
        let node = tree.add_child(tree.root(), "Crate", "Area2D").unwrap();
        let mut obj = Crate { node, opened: 0 };

        let first = resolver.on_ready(&mut tree, &mut obj).unwrap();
        let second = resolver.on_ready(&mut tree, &mut obj).unwrap();
        assert_eq!(first.signals.connected, 1);
        assert_eq!(second.signals, SignalReport { connected: 0, already_connected: 1 });

        assert_eq!(resolver.deliver(&tree, &mut obj, node, "interacted", &[]), 1);
        assert_eq!(obj.opened, 1);
    }

    #[test]
    fn private_cache_is_used() {
        let cache = Arc::new(MetadataCache::new());
        let resolver = Resolver::default().with_cache(Arc::clone(&cache));
        let mut obj = Crate {
            node: SceneTree::new().root(),
            opened: 0,
        };

        assert!(resolver.call(&mut obj, "open", &[]));
        assert!(cache.contains::<Crate>());
        assert_eq!(obj.opened, 1);
    }
}
