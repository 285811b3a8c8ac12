//! String interning for node, signal and method names
//!
//! Node names, signal names and handler method names recur across every
//! instance of a type. Interning stores each one once, so every node, handler
//! and subscription holding a name shares one allocation. Comparisons still
//! go by content.
//!
//! Uses DashMap so the global interner can be shared without a lock.

use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;

/// Global name interner (thread-safe, lock-free)
static INTERNER: Lazy<Interner> = Lazy::new(Interner::new);

/// Thread-safe string interner using DashMap
pub struct Interner {
    /// Interned names; the key is the canonical Arc
    names: DashMap<Arc<str>, ()>,
}

impl Interner {
    pub fn new() -> Self {
        Self {
            names: DashMap::new(),
        }
    }

    /// Intern a name, returning the shared Arc<str>
    pub fn intern(&self, s: &str) -> Arc<str> {
        if let Some(existing) = self.names.get(s) {
            return Arc::clone(existing.key());
        }

        // entry() keeps two racing callers from storing different Arcs
        let entry = self.names.entry(Arc::from(s)).or_insert(());
        Arc::clone(entry.key())
    }

    /// True when `s` has been interned
    pub fn contains(&self, s: &str) -> bool {
        self.names.contains_key(s)
    }

    /// Number of interned names
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

/// Intern a name using the global interner
#[inline]
pub fn intern(s: &str) -> Arc<str> {
    INTERNER.intern(s)
}

/// True when `s` is in the global interner
pub fn is_interned(s: &str) -> bool {
    INTERNER.contains(s)
}
