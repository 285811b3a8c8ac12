//! Candidate-name construction and lookup
//!
//! A member is matched against an ordered list of candidate paths. Each
//! candidate is tried relative to the object's node first and then relative
//! to its owner (the scene root it was instanced under), so members can name
//! either a child or a sibling elsewhere in the same scene.

use crate::node_path::{NodePath, UNIQUE_NAME_PREFIX};
use crate::tree::{NodeId, SceneTree};

/// `_weapon` → `Weapon`. None unless the name starts with `_` and has
/// something after it.
pub fn capitalized_variant(name: &str) -> Option<String> {
    let rest = name.strip_prefix('_')?;
    let mut chars = rest.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().chain(chars).collect())
}

/// Candidates for a node-path binding, in lookup order:
/// declared path, member name, `%`member, capitalized, `%`capitalized,
/// declared type name. Empty entries are dropped.
pub fn node_candidates(declared: &str, member: &str, type_name: &str) -> Vec<String> {
    let capitalized = capitalized_variant(member);
    let unique = |name: &str| format!("{}{}", UNIQUE_NAME_PREFIX, name);

    let mut names = vec![declared.to_string(), member.to_string(), unique(member)];
    if let Some(cap) = capitalized {
        names.push(unique(&cap));
        names.insert(names.len() - 1, cap);
    }
    names.push(type_name.to_string());
    names.retain(|n| !n.is_empty());
    names
}

/// Candidates for a singleton binding, each placed under `prefix`:
/// explicit name, member name, capitalized, declared type name.
///
/// An explicit name containing `/` is taken as a full path.
pub fn singleton_candidates(
    prefix: &str,
    explicit: Option<&str>,
    member: &str,
    type_name: &str,
) -> Vec<String> {
    let under_root = |name: &str| format!("{}/{}", prefix, name);

    let mut names = Vec::with_capacity(4);
    match explicit {
        Some(name) if name.contains('/') => names.push(name.to_string()),
        Some(name) if !name.is_empty() => names.push(under_root(name)),
        _ => {}
    }
    if !member.is_empty() {
        names.push(under_root(member));
    }
    if let Some(cap) = capitalized_variant(member) {
        names.push(under_root(&cap));
    }
    if !type_name.is_empty() {
        names.push(under_root(type_name));
    }
    names
}

/// First node matched by `candidates`, trying `node` then its owner for each
pub fn resolve_candidates<S: AsRef<str>>(
    tree: &SceneTree,
    node: NodeId,
    candidates: &[S],
) -> Option<NodeId> {
    let owner = tree.owner(node).filter(|owner| *owner != node);

    candidates
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| !name.is_empty())
        .find_map(|name| {
            let path = NodePath::new(name);
            tree.get_node_or_null(node, &path)
                .or_else(|| owner.and_then(|owner| tree.get_node_or_null(owner, &path)))
        })
}
