//! Class hierarchy for nodes and resources
//!
//! Type checks during binding ask "is a node of class X usable where class Y
//! is declared?". Classes form a single-inheritance chain ending at one of the
//! two built-in roots, `Node` and `Resource`. A class that was never
//! registered derives directly from the root of whatever it is checked as:
//! `Node` for nodes, `Resource` for loaded resources.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::interner::intern;

pub const NODE_CLASS: &str = "Node";
pub const RESOURCE_CLASS: &str = "Resource";

#[derive(Debug, Clone)]
pub struct ClassDb {
    /// class -> base class
    bases: FxHashMap<Arc<str>, Arc<str>>,
}

impl Default for ClassDb {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassDb {
    /// Hierarchy with the built-in classes registered
    pub fn new() -> Self {
        let mut db = Self {
            bases: FxHashMap::default(),
        };
        for (class, base) in [
            ("CanvasItem", NODE_CLASS),
            ("Node2D", "CanvasItem"),
            ("Sprite2D", "Node2D"),
            ("CollisionObject2D", "Node2D"),
            ("Area2D", "CollisionObject2D"),
            ("Control", "CanvasItem"),
            ("Label", "Control"),
            ("Timer", NODE_CLASS),
            ("Texture", RESOURCE_CLASS),
            ("AudioStream", RESOURCE_CLASS),
            ("PackedScene", RESOURCE_CLASS),
        ] {
            db.register(class, base);
        }
        db
    }

    /// Declare `class` as deriving from `base`; re-registering replaces the base
    pub fn register(&mut self, class: &str, base: &str) {
        self.bases.insert(intern(class), intern(base));
    }

    /// Base of `class`; unregistered classes derive from `Node`
    pub fn base_of(&self, class: &str) -> Option<&str> {
        self.base_under(class, NODE_CLASS)
    }

    fn base_under<'a>(&'a self, class: &str, fallback: &'a str) -> Option<&'a str> {
        if class == NODE_CLASS || class == RESOURCE_CLASS {
            return None;
        }
        Some(self.bases.get(class).map_or(fallback, |b| &**b))
    }

    /// True when `class` is `base` or inherits from it
    pub fn is_class(&self, class: &str, base: &str) -> bool {
        self.walk(class, base, NODE_CLASS)
    }

    /// Like `is_class`, but for a resource class: one that was never
    /// registered derives from `Resource`
    pub fn is_resource_class(&self, class: &str, base: &str) -> bool {
        self.walk(class, base, RESOURCE_CLASS)
    }

    fn walk(&self, class: &str, base: &str, fallback: &str) -> bool {
        let mut current = Some(class);
        // The depth cap guards against a cycle introduced by re-registration
        for _ in 0..=self.bases.len() + 1 {
            match current {
                Some(c) if c == base => return true,
                Some(c) => current = self.base_under(c, fallback),
                None => return false,
            }
        }
        false
    }
}
