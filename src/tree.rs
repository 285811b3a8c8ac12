//! Scene tree runtime
//!
//! An arena of named, parented nodes. Each node has a class (checked through
//! `ClassDb`), an optional owner (the root of the scene it was instanced
//! from), optional membership in the owner's unique-name scope, and groups.
//! The tree also carries the signal hub so subscriptions die with the nodes
//! they mention.
//!
//! Ids are never reused: a freed node's id stays invalid.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::class_db::{ClassDb, NODE_CLASS};
use crate::error::{BindError, Result};
use crate::interner::intern;
use crate::node_path::{NodePath, Segment};
use crate::signal::{Callable, SignalHub};

/// Name of the root node; absolute paths start with `/root`
pub const ROOT_NAME: &str = "root";

/// Characters a node name may not contain
const RESERVED_NAME_CHARS: &[char] = &['/', ':', '.', '@', '%', '"'];

/// Handle to a node in a `SceneTree`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[cfg(test)]
    pub(crate) fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug)]
struct NodeData {
    name: Arc<str>,
    class: Arc<str>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    owner: Option<NodeId>,
    unique: bool,
    /// Unique names registered by nodes this node owns
    owned_unique: FxHashMap<Arc<str>, NodeId>,
    groups: Vec<Arc<str>>,
}

impl NodeData {
    fn new(name: Arc<str>, class: Arc<str>, parent: Option<NodeId>) -> Self {
        Self {
            name,
            class,
            parent,
            children: Vec::new(),
            owner: None,
            unique: false,
            owned_unique: FxHashMap::default(),
            groups: Vec::new(),
        }
    }
}

/// Hierarchical node tree with owner scopes and signals
#[derive(Debug)]
pub struct SceneTree {
    nodes: Vec<Option<NodeData>>,
    classes: ClassDb,
    signals: SignalHub,
}

impl Default for SceneTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneTree {
    /// Tree holding only the root node
    pub fn new() -> Self {
        Self::with_classes(ClassDb::new())
    }

    pub fn with_classes(classes: ClassDb) -> Self {
        let root = NodeData::new(intern(ROOT_NAME), intern(NODE_CLASS), None);
        Self {
            nodes: vec![Some(root)],
            classes,
            signals: SignalHub::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn classes(&self) -> &ClassDb {
        &self.classes
    }

    pub fn classes_mut(&mut self) -> &mut ClassDb {
        &mut self.classes
    }

    pub fn signals(&self) -> &SignalHub {
        &self.signals
    }

    // ─────────────────────────────────────────────────────────────
    // Structure
    // ─────────────────────────────────────────────────────────────

    fn data(&self, id: NodeId) -> Result<&NodeData> {
        self.nodes
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(BindError::InvalidNode(id))
    }

    fn data_mut(&mut self, id: NodeId) -> Result<&mut NodeData> {
        self.nodes
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(BindError::InvalidNode(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.data(id).is_ok()
    }

    /// Create a node named `name` of class `class` under `parent`
    pub fn add_child(&mut self, parent: NodeId, name: &str, class: &str) -> Result<NodeId> {
        validate_name(name)?;
        if self.child_named(parent, name)?.is_some() {
            return Err(BindError::DuplicateName {
                parent: self.describe(parent),
                name: name.to_string(),
            });
        }

        let id = NodeId(self.nodes.len() as u32);
        self.nodes
            .push(Some(NodeData::new(intern(name), intern(class), Some(parent))));
        self.data_mut(parent)?.children.push(id);
        Ok(id)
    }

    fn child_named(&self, parent: NodeId, name: &str) -> Result<Option<NodeId>> {
        let data = self.data(parent)?;
        Ok(data
            .children
            .iter()
            .copied()
            .find(|c| self.data(*c).is_ok_and(|d| &*d.name == name)))
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.data(id).ok().map(|d| &*d.name)
    }

    pub fn class(&self, id: NodeId) -> Option<&str> {
        self.data(id).ok().map(|d| &*d.class)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).ok().and_then(|d| d.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.data(id).map(|d| d.children.as_slice()).unwrap_or(&[])
    }

    pub fn owner(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).ok().and_then(|d| d.owner)
    }

    /// True when `ancestor` is a strict ancestor of `node`
    pub fn is_ancestor_of(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.parent(node);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.parent(c);
        }
        false
    }

    /// True when the node's class is `class` or derives from it
    pub fn is_class(&self, id: NodeId, class: &str) -> bool {
        self.class(id)
            .is_some_and(|c| self.classes.is_class(c, class))
    }

    /// Absolute path of a node (`/root/Level/Player`)
    pub fn path_of(&self, id: NodeId) -> Option<NodePath> {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(c) = current {
            let data = self.data(c).ok()?;
            names.push(Arc::clone(&data.name));
            current = data.parent;
        }
        names.reverse();
        Some(NodePath::absolute_from(names))
    }

    fn describe(&self, id: NodeId) -> String {
        self.path_of(id)
            .map(|p| p.to_string())
            .unwrap_or_else(|| id.to_string())
    }

    // ─────────────────────────────────────────────────────────────
    // Owners and unique names
    // ─────────────────────────────────────────────────────────────

    /// Set or clear a node's owner. The owner must be a strict ancestor.
    /// A unique name moves along to the new owner's scope.
    pub fn set_owner(&mut self, node: NodeId, owner: Option<NodeId>) -> Result<()> {
        if let Some(o) = owner {
            if !self.is_ancestor_of(o, node) {
                return Err(BindError::InvalidOwner {
                    node: self.describe(node),
                    owner: self.describe(o),
                });
            }
        }

        let data = self.data(node)?;
        let (old_owner, unique, name) = (data.owner, data.unique, Arc::clone(&data.name));
        if old_owner == owner {
            return Ok(());
        }

        if unique {
            let Some(new_owner) = owner else {
                return Err(BindError::UniqueNameWithoutOwner {
                    node: self.describe(node),
                });
            };
            self.register_unique(new_owner, &name, node)?;
            if let Some(old) = old_owner {
                self.data_mut(old)?.owned_unique.remove(&name);
            }
        }

        self.data_mut(node)?.owner = owner;
        Ok(())
    }

    /// Make a node addressable as `%Name` within its owner's scope
    pub fn set_unique_name(&mut self, node: NodeId, unique: bool) -> Result<()> {
        let data = self.data(node)?;
        if data.unique == unique {
            return Ok(());
        }
        let name = Arc::clone(&data.name);
        let Some(owner) = data.owner else {
            return Err(BindError::UniqueNameWithoutOwner {
                node: self.describe(node),
            });
        };

        if unique {
            self.register_unique(owner, &name, node)?;
        } else {
            self.data_mut(owner)?.owned_unique.remove(&name);
        }
        self.data_mut(node)?.unique = unique;
        Ok(())
    }

    fn register_unique(&mut self, owner: NodeId, name: &Arc<str>, node: NodeId) -> Result<()> {
        let scope = &self.data(owner)?.owned_unique;
        if scope.get(name).is_some_and(|existing| *existing != node) {
            return Err(BindError::UniqueNameConflict {
                name: name.to_string(),
                owner: self.describe(owner),
            });
        }
        self.data_mut(owner)?
            .owned_unique
            .insert(Arc::clone(name), node);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────
    // Lookup
    // ─────────────────────────────────────────────────────────────

    /// Resolve `path` relative to `from`
    pub fn get_node_or_null(&self, from: NodeId, path: &NodePath) -> Option<NodeId> {
        if path.is_empty() {
            return None;
        }

        let mut segments = path.segments().iter();
        let mut current = if path.is_absolute() {
            // First segment names the root itself
            let root_name = self.name(self.root())?;
            match segments.next()? {
                Segment::Child(name) if &**name == root_name => self.root(),
                _ => return None,
            }
        } else {
            self.data(from).ok()?;
            from
        };

        for segment in segments {
            current = match segment {
                Segment::Current => current,
                Segment::Parent => self.parent(current)?,
                Segment::Child(name) => self.child_named(current, name).ok()??,
                Segment::Unique(name) => self.unique_lookup(current, name)?,
            };
        }

        Some(current)
    }

    /// `%Name` lookup: the node's own scope, then its owner's
    fn unique_lookup(&self, current: NodeId, name: &str) -> Option<NodeId> {
        let data = self.data(current).ok()?;
        if let Some(found) = data.owned_unique.get(name) {
            return Some(*found);
        }
        let owner = self.data(data.owner?).ok()?;
        owner.owned_unique.get(name).copied()
    }

    /// Convenience over `get_node_or_null` taking a path string
    pub fn get_node(&self, from: NodeId, path: &str) -> Option<NodeId> {
        self.get_node_or_null(from, &NodePath::new(path))
    }

    pub fn has_node(&self, from: NodeId, path: &NodePath) -> bool {
        self.get_node_or_null(from, path).is_some()
    }

    // ─────────────────────────────────────────────────────────────
    // Removal
    // ─────────────────────────────────────────────────────────────

    /// Remove a node and its whole subtree, dropping their subscriptions
    pub fn free(&mut self, node: NodeId) -> Result<()> {
        if node == self.root() {
            return Err(BindError::CannotFreeRoot);
        }
        let parent = self.data(node)?.parent;

        let mut doomed = vec![node];
        let mut i = 0;
        while i < doomed.len() {
            let id = doomed[i];
            doomed.extend_from_slice(self.children(id));
            i += 1;
        }

        for id in &doomed {
            let data = self.data(*id)?;
            if let (true, Some(owner)) = (data.unique, data.owner) {
                let name = Arc::clone(&data.name);
                if let Ok(owner_data) = self.data_mut(owner) {
                    owner_data.owned_unique.remove(&name);
                }
            }
        }
        for id in &doomed {
            self.signals.forget_node(*id);
            self.nodes[id.index()] = None;
        }
        if let Some(p) = parent {
            self.data_mut(p)?.children.retain(|c| *c != node);
        }

        debug!(node = %node, freed = doomed.len(), "Freed subtree");
        Ok(())
    }

    /// Free every child of `node`
    pub fn free_children(&mut self, node: NodeId) -> Result<()> {
        let children = self.children(node).to_vec();
        for child in children {
            self.free(child)?;
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────
    // Groups and typed queries
    // ─────────────────────────────────────────────────────────────

    pub fn add_to_group(&mut self, node: NodeId, group: &str) -> Result<()> {
        let group = intern(group);
        let data = self.data_mut(node)?;
        if !data.groups.contains(&group) {
            data.groups.push(group);
        }
        Ok(())
    }

    /// Add the node to the group named after its class
    pub fn add_to_class_group(&mut self, node: NodeId) -> Result<()> {
        let class = Arc::clone(&self.data(node)?.class);
        self.add_to_group(node, &class)
    }

    pub fn is_in_group(&self, node: NodeId, group: &str) -> bool {
        self.data(node)
            .is_ok_and(|d| d.groups.iter().any(|g| &**g == group))
    }

    /// Members of a group in creation order
    pub fn nodes_in_group(&self, group: &str) -> Vec<NodeId> {
        (0..self.nodes.len() as u32)
            .map(NodeId)
            .filter(|id| self.is_in_group(*id, group))
            .collect()
    }

    pub fn children_of_class(&self, node: NodeId, class: &str) -> Vec<NodeId> {
        self.children(node)
            .iter()
            .copied()
            .filter(|c| self.is_class(*c, class))
            .collect()
    }

    pub fn first_child_of_class(&self, node: NodeId, class: &str) -> Option<NodeId> {
        self.children(node)
            .iter()
            .copied()
            .find(|c| self.is_class(*c, class))
    }

    /// Closest node of `class` walking from `node` (inclusive) up to the root
    pub fn ancestor_of_class(&self, node: NodeId, class: &str) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(c) = current {
            if self.is_class(c, class) {
                return Some(c);
            }
            current = self.parent(c);
        }
        None
    }

    pub fn last_child(&self, node: NodeId) -> Option<NodeId> {
        self.children(node).last().copied()
    }

    // ─────────────────────────────────────────────────────────────
    // Signals
    // ─────────────────────────────────────────────────────────────

    pub fn is_connected(&self, source: NodeId, signal: &str, callable: &Callable) -> bool {
        self.signals.is_connected(source, signal, callable)
    }

    /// Subscribe `callable` to `signal` on `source`. Returns false when the
    /// subscription already existed.
    pub fn connect(&mut self, source: NodeId, signal: &str, callable: Callable) -> Result<bool> {
        self.data(source)?;
        self.data(callable.target)?;
        Ok(self.signals.connect(source, signal, callable))
    }

    pub fn disconnect(&mut self, source: NodeId, signal: &str, callable: &Callable) -> bool {
        self.signals.disconnect(source, signal, callable)
    }

    /// Subscribers to run for one emission of `signal` on `source`
    pub fn emit_signal(&self, source: NodeId, signal: &str) -> Vec<Callable> {
        let subscribers = self.signals.subscribers(source, signal);
        debug!(source = %source, signal, subscribers = subscribers.len(), "Signal emitted");
        subscribers
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains(RESERVED_NAME_CHARS) {
        return Err(BindError::InvalidNodeName {
            name: name.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// root/Level(owner of everything below)/Player/Weapon
    fn scene() -> (SceneTree, NodeId, NodeId, NodeId) {
        let mut tree = SceneTree::new();
        let level = tree.add_child(tree.root(), "Level", "Node2D").unwrap();
        let player = tree.add_child(level, "Player", "Node2D").unwrap();
        let weapon = tree.add_child(player, "Weapon", "Sprite2D").unwrap();
        tree.set_owner(player, Some(level)).unwrap();
        tree.set_owner(weapon, Some(level)).unwrap();
        (tree, level, player, weapon)
    }

    #[test]
    fn relative_and_absolute_lookup() {
        let (tree, level, player, weapon) = scene();
        assert_eq!(tree.get_node(player, "Weapon"), Some(weapon));
        assert_eq!(tree.get_node(weapon, "../.."), Some(level));
        assert_eq!(tree.get_node(weapon, "/root/Level/Player"), Some(player));
        assert_eq!(tree.get_node(weapon, "/Level"), None);
        assert_eq!(tree.get_node(player, ""), None);
        assert_eq!(tree.get_node(player, "Nope"), None);
    }

    #[test]
    fn path_of_round_trips() {
        let (tree, _, _, weapon) = scene();
        let path = tree.path_of(weapon).unwrap();
        assert_eq!(path.to_string(), "/root/Level/Player/Weapon");
        assert_eq!(tree.get_node_or_null(tree.root(), &path), Some(weapon));
    }

    #[test]
    fn unique_name_lookup_uses_owner_scope() {
        let (mut tree, level, player, weapon) = scene();
        tree.set_unique_name(weapon, true).unwrap();

        // From the owner itself and from a sibling owned by it
        assert_eq!(tree.get_node(level, "%Weapon"), Some(weapon));
        assert_eq!(tree.get_node(player, "%Weapon"), Some(weapon));

        tree.set_unique_name(weapon, false).unwrap();
        assert_eq!(tree.get_node(player, "%Weapon"), None);
    }

    #[test]
    fn unique_name_requires_owner() {
        let mut tree = SceneTree::new();
        let orphan = tree.add_child(tree.root(), "Orphan", "Node").unwrap();
        assert!(matches!(
            tree.set_unique_name(orphan, true),
            Err(BindError::UniqueNameWithoutOwner { .. })
        ));
    }

    #[test]
    fn unique_name_conflict() {
        let (mut tree, level, player, weapon) = scene();
        let other = tree.add_child(level, "Holder", "Node").unwrap();
        let second = tree.add_child(other, "Weapon", "Node").unwrap();
        tree.set_owner(second, Some(level)).unwrap();

        tree.set_unique_name(weapon, true).unwrap();
        assert!(matches!(
            tree.set_unique_name(second, true),
            Err(BindError::UniqueNameConflict { .. })
        ));
        assert_eq!(tree.get_node(player, "%Weapon"), Some(weapon));
    }

    #[test]
    fn owner_must_be_ancestor() {
        let (mut tree, _, player, weapon) = scene();
        assert!(matches!(
            tree.set_owner(player, Some(weapon)),
            Err(BindError::InvalidOwner { .. })
        ));
    }

    #[test]
    fn names_are_validated_and_unique_among_siblings() {
        let (mut tree, _, player, _) = scene();
        assert!(matches!(
            tree.add_child(player, "Weapon", "Node"),
            Err(BindError::DuplicateName { .. })
        ));
        assert!(matches!(
            tree.add_child(player, "a/b", "Node"),
            Err(BindError::InvalidNodeName { .. })
        ));
        assert!(matches!(
            tree.add_child(player, "", "Node"),
            Err(BindError::InvalidNodeName { .. })
        ));
    }

    #[test]
    fn free_removes_subtree_scopes_and_signals() {
        let (mut tree, level, player, weapon) = scene();
        tree.set_unique_name(weapon, true).unwrap();
        tree.connect(weapon, "fired", Callable::new(level, "on_fired"))
            .unwrap();

        tree.free(player).unwrap();

        assert!(!tree.contains(player));
        assert!(!tree.contains(weapon));
        assert!(tree.children(level).is_empty());
        assert_eq!(tree.get_node(level, "%Weapon"), None);
        assert!(tree.signals().is_empty());
        assert!(matches!(tree.free(tree.root()), Err(BindError::CannotFreeRoot)));
    }

    #[test]
    fn class_queries() {
        let (mut tree, level, player, weapon) = scene();
        let timer = tree.add_child(player, "Cooldown", "Timer").unwrap();

        assert_eq!(tree.first_child_of_class(player, "Sprite2D"), Some(weapon));
        assert_eq!(tree.children_of_class(player, NODE_CLASS), vec![weapon, timer]);
        assert_eq!(tree.ancestor_of_class(weapon, "Node2D"), Some(weapon));
        assert_eq!(tree.ancestor_of_class(timer, "Node2D"), Some(player));
        assert_eq!(tree.last_child(player), Some(timer));
        assert_eq!(tree.last_child(weapon), None);

        tree.free_children(player).unwrap();
        assert!(tree.children(player).is_empty());
        assert!(tree.contains(level));
    }

    #[test]
    fn groups() {
        let (mut tree, _, player, weapon) = scene();
        tree.add_to_group(player, "actors").unwrap();
        tree.add_to_group(player, "actors").unwrap();
        tree.add_to_class_group(weapon).unwrap();

        assert!(tree.is_in_group(player, "actors"));
        assert_eq!(tree.nodes_in_group("actors"), vec![player]);
        assert_eq!(tree.nodes_in_group("Sprite2D"), vec![weapon]);
    }

    #[test]
    fn connect_requires_live_nodes() {
        let (mut tree, level, player, _) = scene();
        let callable = Callable::new(level, "on_moved");

        assert!(tree.connect(player, "moved", callable.clone()).unwrap());
        assert!(!tree.connect(player, "moved", callable.clone()).unwrap());
        assert_eq!(tree.emit_signal(player, "moved"), vec![callable.clone()]);

        tree.free(player).unwrap();
        assert!(matches!(
            tree.connect(player, "moved", callable),
            Err(BindError::InvalidNode(_))
        ));
    }
}
