//! Directive dispatch
//!
//! Walks a type's members in cache order and executes each directive against
//! one instance. Fail-fast: the first error aborts the pass, leaving members
//! already assigned in place.

use tracing::{debug, warn};

use crate::config::{MissingNodePolicy, ResolverConfig};
use crate::error::{BindError, Result};
use crate::node_path::NodePath;
use crate::resource::ResourceLoader;
use crate::tree::{NodeId, SceneTree};
use crate::variant::Variant;

use super::member::{BindableMember, Directive, MemberType, TypeEntry};
use super::resolve::{node_candidates, resolve_candidates, singleton_candidates};

/// Everything one resolution pass reads besides the object itself
pub(crate) struct ResolveContext<'a> {
    pub tree: &'a SceneTree,
    pub node: NodeId,
    pub type_name: &'static str,
    pub config: &'a ResolverConfig,
    pub loader: &'a dyn ResourceLoader,
}

/// Outcome of one dispatch pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Members written
    pub assigned: usize,
    /// Node-path bindings left untouched under `MissingNodePolicy::Warn`
    pub skipped: usize,
}

pub(crate) fn dispatch<T>(
    ctx: &ResolveContext<'_>,
    entry: &TypeEntry<T>,
    obj: &mut T,
) -> Result<DispatchReport> {
    let mut report = DispatchReport::default();

    for member in &entry.members {
        for directive in &member.directives {
            match directive {
                Directive::NodePath(path) => {
                    let candidates = node_candidates(path, &member.name, member.ty.name());
                    assign_node(ctx, member, obj, candidates, &mut report)?;
                }

                Directive::ResolveNode(target) => {
                    let path = path_held_by(ctx, entry, member, obj, target)?;
                    let candidates: Vec<String> = std::iter::once(path.to_string())
                        .filter(|p| !p.is_empty())
                        .collect();
                    assign_node(ctx, member, obj, candidates, &mut report)?;
                }

                Directive::Resource(id) => {
                    let resource = ctx
                        .loader
                        .load(id)
                        .map_err(|e| e.to_string())
                        .and_then(|found| found.ok_or_else(|| "resource not found".to_string()))
                        .map_err(|reason| BindError::ResourceLoadFailure {
                            type_name: ctx.type_name.to_string(),
                            member: member.name.to_string(),
                            resource: id.clone(),
                            reason,
                        })?;
                    assign(ctx, member, obj, Variant::Resource(resource))?;
                    report.assigned += 1;
                }

                Directive::Singleton(explicit) => {
                    let candidates = singleton_candidates(
                        ctx.config.registry_prefix(),
                        explicit.as_deref(),
                        &member.name,
                        member.ty.name(),
                    );
                    let Some(found) = resolve_candidates(ctx.tree, ctx.node, &candidates) else {
                        return Err(BindError::SingletonNotFound {
                            type_name: ctx.type_name.to_string(),
                            member: member.name.to_string(),
                            candidates,
                        });
                    };
                    assign(ctx, member, obj, Variant::Node(found))?;
                    report.assigned += 1;
                }
            }
        }
    }

    Ok(report)
}

/// Path currently stored in the `target` member, for `ResolveNode`
fn path_held_by<T>(
    ctx: &ResolveContext<'_>,
    entry: &TypeEntry<T>,
    member: &BindableMember<T>,
    obj: &T,
    target: &str,
) -> Result<NodePath> {
    let target_member = entry.member(target).ok_or_else(|| BindError::MissingTarget {
        type_name: ctx.type_name.to_string(),
        member: member.name.to_string(),
        target: target.to_string(),
    })?;

    let mismatch = |found: &str| BindError::TypeMismatch {
        type_name: ctx.type_name.to_string(),
        member: target_member.name.to_string(),
        expected: MemberType::NodePath.name().to_string(),
        found: found.to_string(),
    };

    if target_member.ty != MemberType::NodePath {
        return Err(mismatch(target_member.ty.name()));
    }
    match target_member.get(obj) {
        Variant::Path(path) => Ok(path),
        other => Err(mismatch(other.type_name())),
    }
}

/// Resolve `candidates` and assign the hit, applying the missing-node policy
fn assign_node<T>(
    ctx: &ResolveContext<'_>,
    member: &BindableMember<T>,
    obj: &mut T,
    candidates: Vec<String>,
    report: &mut DispatchReport,
) -> Result<()> {
    match resolve_candidates(ctx.tree, ctx.node, &candidates) {
        Some(found) => {
            assign(ctx, member, obj, Variant::Node(found))?;
            report.assigned += 1;
            Ok(())
        }
        None => match ctx.config.missing_node {
            MissingNodePolicy::Fail => Err(BindError::BindingNotFound {
                type_name: ctx.type_name.to_string(),
                member: member.name.to_string(),
                candidates,
            }),
            MissingNodePolicy::Warn => {
                warn!(
                    type_name = ctx.type_name,
                    member = %member.name,
                    candidates = %candidates.join(","),
                    "Unable to find node, leaving member unset"
                );
                report.skipped += 1;
                Ok(())
            }
        },
    }
}

/// Type-check `value` against the member's declared type, then store it
fn assign<T>(
    ctx: &ResolveContext<'_>,
    member: &BindableMember<T>,
    obj: &mut T,
    value: Variant,
) -> Result<()> {
    let mismatch = |expected: &str, found: &str| BindError::TypeMismatch {
        type_name: ctx.type_name.to_string(),
        member: member.name.to_string(),
        expected: expected.to_string(),
        found: found.to_string(),
    };

    member
        .ty
        .check(ctx.tree, &value)
        .map_err(|found| mismatch(member.ty.name(), &found))?;

    debug!(type_name = ctx.type_name, member = %member.name, value = %value, "Assigning member");
    member
        .set(obj, value)
        .map_err(|e| mismatch(e.expected, e.found))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::describe::{Bindable, TypeBuilder};
    use crate::resource::MemoryResourceLoader;

    #[derive(Default)]
    struct Turret {
        node: Option<NodeId>,
        barrel_path: Option<NodePath>,
        barrel: Option<NodeId>,
        sight: Option<NodeId>,
    }

    impl Bindable for Turret {
        fn describe(ty: &mut TypeBuilder<Self>) {
            ty.field(
                "barrel_path",
                MemberType::NodePath,
                |t| t.barrel_path.clone().into(),
                |t, v| {
                    t.barrel_path = Some(v.try_into()?);
                    Ok(())
                },
            );
            ty.field(
                "_barrel",
                MemberType::Node("Node2D"),
                |t| t.barrel.into(),
                |t, v| {
                    t.barrel = Some(v.try_into()?);
                    Ok(())
                },
            )
            .resolve_node("barrel_path");
            ty.property(
                "_sight",
                MemberType::ANY_NODE,
                |t| t.sight.into(),
                |t, v| {
                    t.sight = Some(v.try_into()?);
                    Ok(())
                },
            )
            .node_path("");
        }

        fn node(&self) -> NodeId {
            self.node.unwrap_or_else(|| NodeId::from_raw(0))
        }
    }

    fn run(tree: &SceneTree, node: NodeId, config: &ResolverConfig, turret: &mut Turret) -> Result<DispatchReport> {
        let loader = MemoryResourceLoader::new();
        let ctx = ResolveContext {
            tree,
            node,
            type_name: Turret::type_name(),
            config,
            loader: &loader,
        };
        dispatch(&ctx, &TypeBuilder::<Turret>::build(), turret)
    }

    fn turret_scene() -> (SceneTree, NodeId) {
        let mut tree = SceneTree::new();
        let turret = tree.add_child(tree.root(), "Turret", "Node2D").unwrap();
        tree.add_child(turret, "Barrel", "Sprite2D").unwrap();
        tree.add_child(turret, "Sight", "Node2D").unwrap();
        (tree, turret)
    }

    #[test]
    fn indirect_path_follows_the_target_member() {
        let (tree, node) = turret_scene();
        let mut turret = Turret {
            barrel_path: Some(NodePath::new("Barrel")),
            ..Default::default()
        };

        let report = run(&tree, node, &ResolverConfig::default(), &mut turret).unwrap();
        assert_eq!(report.assigned, 2);
        assert_eq!(turret.barrel.and_then(|b| tree.name(b)), Some("Barrel"));
        assert_eq!(turret.sight.and_then(|s| tree.name(s)), Some("Sight"));
    }

    #[test]
    fn indirect_path_requires_a_path_value() {
        let (tree, node) = turret_scene();
        let mut turret = Turret::default();

        let err = run(&tree, node, &ResolverConfig::default(), &mut turret).unwrap_err();
        assert!(matches!(
            err,
            BindError::TypeMismatch { ref member, ref found, .. } if member == "barrel_path" && found == "Nil"
        ));
        assert!(turret.barrel.is_none());
    }

    #[test]
    fn warn_policy_skips_missing_nodes() {
        let mut tree = SceneTree::new();
        let node = tree.add_child(tree.root(), "Turret", "Node2D").unwrap();
        let mut turret = Turret {
            barrel_path: Some(NodePath::new("Nowhere")),
            ..Default::default()
        };
        let config = ResolverConfig {
            missing_node: MissingNodePolicy::Warn,
            ..Default::default()
        };

        let report = run(&tree, node, &config, &mut turret).unwrap();
        assert_eq!(report, DispatchReport { assigned: 0, skipped: 2 });
        assert!(turret.barrel.is_none());
        assert!(turret.sight.is_none());
    }

    #[test]
    fn fail_policy_reports_every_candidate() {
        let mut tree = SceneTree::new();
        let node = tree.add_child(tree.root(), "Turret", "Node2D").unwrap();
        // Satisfy the indirect binding so the convention-based one is reached
        tree.add_child(node, "Barrel", "Node2D").unwrap();
        let mut turret = Turret {
            barrel_path: Some(NodePath::new("Barrel")),
            ..Default::default()
        };

        let err = run(&tree, node, &ResolverConfig::default(), &mut turret).unwrap_err();
        match err {
            BindError::BindingNotFound { member, candidates, .. } => {
                assert_eq!(member, "_sight");
                assert_eq!(candidates, vec!["_sight", "%_sight", "Sight", "%Sight", "Node"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn node_of_wrong_class_is_a_type_mismatch() {
        let mut tree = SceneTree::new();
        let node = tree.add_child(tree.root(), "Turret", "Node2D").unwrap();
        tree.add_child(node, "Barrel", "Label").unwrap();
        let mut turret = Turret {
            barrel_path: Some(NodePath::new("Barrel")),
            ..Default::default()
        };

        let err = run(&tree, node, &ResolverConfig::default(), &mut turret).unwrap_err();
        assert!(err.to_string().contains("cannot set value of type Label on member type Node2D"));
    }
}
