//! Quick benchmark to verify binding resolution performance

use nodewire::binding::{node_candidates, resolve_candidates, MemberType, TypeBuilder};
use nodewire::{Bindable, NodeId, Resolver, SceneTree};
use std::time::Instant;

struct Player {
    node: NodeId,
    weapon: Option<NodeId>,
    shield: Option<NodeId>,
}

impl Bindable for Player {
    fn describe(ty: &mut TypeBuilder<Self>) {
        ty.field(
            "_weapon",
            MemberType::Node("Sprite2D"),
            |p| p.weapon.into(),
            |p, v| {
                p.weapon = Some(v.try_into()?);
                Ok(())
            },
        )
        .node_path("");
        ty.field(
            "_shield",
            MemberType::ANY_NODE,
            |p| p.shield.into(),
            |p, v| {
                p.shield = Some(v.try_into()?);
                Ok(())
            },
        )
        .node_path("");
        ty.handler("on_hit", |_, _| {}).on("damaged");
    }

    fn node(&self) -> NodeId {
        self.node
    }
}

fn main() {
    // Level with the player's gear spread between self and owner scope
    let mut tree = SceneTree::new();
    let level = tree.add_child(tree.root(), "Level", "Node2D").unwrap();
    let player = tree.add_child(level, "Player", "Node2D").unwrap();
    let weapon = tree.add_child(player, "Weapon", "Sprite2D").unwrap();
    let shield = tree.add_child(level, "Shield", "Node2D").unwrap();
    for id in [player, weapon, shield] {
        tree.set_owner(id, Some(level)).unwrap();
    }
    tree.set_unique_name(shield, true).unwrap();

    println!("Binding Resolution Performance Test");
    println!("===================================\n");

    let cases = [("_weapon", "Sprite2D"), ("_shield", "Node"), ("_missing", "Node")];
    for (member, type_name) in cases {
        let candidates = node_candidates("", member, type_name);
        let iterations = 100_000;
        let start = Instant::now();

        for _ in 0..iterations {
            let _ = resolve_candidates(&tree, player, &candidates);
        }

        let elapsed = start.elapsed();
        println!("Member: {:20}", member);
        println!("  Time for {} iterations: {:?}", iterations, elapsed);
        println!("  Per operation: {:?}\n", elapsed / iterations);
    }

    // Full on_ready (cache already warm after the first call)
    let resolver = Resolver::default();
    let iterations = 100_000;
    let start = Instant::now();
    for _ in 0..iterations {
        let mut obj = Player {
            node: player,
            weapon: None,
            shield: None,
        };
        let _ = resolver.on_ready(&mut tree, &mut obj);
    }
    let elapsed = start.elapsed();

    println!("on_ready (2 members, 1 handler)");
    println!("  Time for {} iterations: {:?}", iterations, elapsed);
    println!("  Per operation: {:?}", elapsed / iterations);
}
