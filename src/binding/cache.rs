//! Per-type metadata cache
//!
//! Entries are built on first use by running `Bindable::describe` and are
//! never rebuilt. Each type owns a `OnceCell` slot: the map's shard lock is
//! held only long enough to fetch or insert the slot, and the build itself
//! runs inside the slot's initializer. Concurrent first requests for one type
//! wait on that slot, so `describe` runs exactly once and a reader never
//! observes a half-built entry. `describe` may request metadata for other
//! types.

use std::any::{Any, TypeId};
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::{Lazy, OnceCell};
use tracing::debug;

use super::describe::{Bindable, TypeBuilder};
use super::member::TypeEntry;

type ErasedEntry = Arc<dyn Any + Send + Sync>;
type Slot = Arc<OnceCell<ErasedEntry>>;

/// Type-keyed table of `TypeEntry<T>`
pub struct MetadataCache {
    entries: DashMap<TypeId, Slot>,
}

static GLOBAL_CACHE: Lazy<Arc<MetadataCache>> = Lazy::new(|| Arc::new(MetadataCache::new()));

impl Default for MetadataCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataCache {
    /// Create an empty, isolated cache
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Process-wide cache shared by every `Resolver` that doesn't bring its own
    pub fn global() -> Arc<MetadataCache> {
        Arc::clone(&GLOBAL_CACHE)
    }

    /// Fetch the entry for `T`, building it on first request
    pub fn get_or_build<T: Bindable>(&self) -> Arc<TypeEntry<T>> {
        let key = TypeId::of::<T>();

        // Fast path: shared read lock only
        let slot = match self.entries.get(&key) {
            Some(hit) => Arc::clone(hit.value()),
            None => Arc::clone(self.entries.entry(key).or_default().value()),
        };
        // Shard guards are gone; only this type's slot is locked from here on

        let erased = slot.get_or_init(|| {
            let entry = TypeBuilder::<T>::build();
            debug!(
                type_name = entry.type_name,
                members = entry.members.len(),
                handlers = entry.handlers.len(),
                "Built binding metadata"
            );
            Arc::new(entry) as ErasedEntry
        });

        match Arc::clone(erased).downcast::<TypeEntry<T>>() {
            Ok(entry) => entry,
            Err(_) => unreachable!("metadata cache entries are keyed by their own TypeId"),
        }
    }

    /// True once `T` has been built
    pub fn contains<T: Bindable>(&self) -> bool {
        self.entries
            .get(&TypeId::of::<T>())
            .is_some_and(|slot| slot.get().is_some())
    }

    /// Number of types built so far
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|slot| slot.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::member::MemberType;
    use crate::tree::NodeId;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static DESCRIBE_CALLS: AtomicUsize = AtomicUsize::new(0);

    struct Counted {
        node: NodeId,
        target: Option<NodeId>,
    }

    impl Bindable for Counted {
        fn describe(ty: &mut TypeBuilder<Self>) {
            DESCRIBE_CALLS.fetch_add(1, Ordering::SeqCst);
            ty.field(
                "_target",
                MemberType::ANY_NODE,
                |c| c.target.into(),
                |c, v| {
                    c.target = Some(v.try_into()?);
                    Ok(())
                },
            )
            .node_path("");
        }

        fn node(&self) -> NodeId {
            self.node
        }
    }

    struct Plain;

    impl Bindable for Plain {
        fn describe(_: &mut TypeBuilder<Self>) {}

        fn node(&self) -> NodeId {
            NodeId::from_raw(0)
        }
    }

    #[test]
    fn describe_runs_once_per_type() {
        let cache = MetadataCache::new();
        let first = cache.get_or_build::<Counted>();
        let second = cache.get_or_build::<Counted>();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(DESCRIBE_CALLS.load(Ordering::SeqCst), 1);
        assert_eq!(first.members.len(), 1);
        assert_eq!(&*first.members[0].name, "_target");
        assert_eq!(first.type_name, "Counted");
    }

    #[test]
    fn types_get_separate_entries() {
        let cache = MetadataCache::new();
        assert!(cache.is_empty());
        assert!(!cache.contains::<Plain>());

        let plain = cache.get_or_build::<Plain>();
        assert!(plain.is_inert());
        assert!(cache.contains::<Plain>());
        assert_eq!(cache.len(), 1);
    }

    static RACED_CALLS: AtomicUsize = AtomicUsize::new(0);

    struct Raced;

    impl Bindable for Raced {
        fn describe(ty: &mut TypeBuilder<Self>) {
            RACED_CALLS.fetch_add(1, Ordering::SeqCst);
            // Widen the window for a second thread to arrive mid-build
            std::thread::sleep(std::time::Duration::from_millis(20));
            ty.handler("on_tick", |_, _| {}).on("timeout");
        }

        fn node(&self) -> NodeId {
            NodeId::from_raw(0)
        }
    }

    #[test]
    fn concurrent_first_requests_build_once() {
        let cache = Arc::new(MetadataCache::new());
        let barrier = Arc::new(std::sync::Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    cache.get_or_build::<Raced>()
                })
            })
            .collect();
        let entries: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(RACED_CALLS.load(Ordering::SeqCst), 1);
        assert!(entries.iter().all(|e| Arc::ptr_eq(e, &entries[0])));
        assert_eq!(entries[0].handlers.len(), 1);
        assert_eq!(cache.len(), 1);
    }

    struct Inner;

    impl Bindable for Inner {
        fn describe(_: &mut TypeBuilder<Self>) {}

        fn node(&self) -> NodeId {
            NodeId::from_raw(0)
        }
    }

    struct Outer;

    impl Bindable for Outer {
        fn describe(ty: &mut TypeBuilder<Self>) {
            // Looking up another type from inside describe must not block
            if MetadataCache::global().get_or_build::<Inner>().is_inert() {
                ty.handler("on_inner_ready", |_, _| {}).on("ready");
            }
        }

        fn node(&self) -> NodeId {
            NodeId::from_raw(0)
        }
    }

    #[test]
    fn describe_can_request_other_types() {
        let outer = MetadataCache::global().get_or_build::<Outer>();

        assert_eq!(outer.handlers.len(), 1);
        assert!(MetadataCache::global().contains::<Inner>());
        assert!(MetadataCache::global().contains::<Outer>());
    }

    #[test]
    fn global_is_shared() {
        assert!(Arc::ptr_eq(&MetadataCache::global(), &MetadataCache::global()));
    }
}
