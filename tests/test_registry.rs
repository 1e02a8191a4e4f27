mod common;

use arcade_runtime::entities::{Capabilities, Entity, EntityKind, Vec2};
use arcade_runtime::registry::EntityRegistry;

use common::RecordingSink;

fn bullet_at(x: f32, y: f32) -> Entity {
    Entity::new(EntityKind::Bullet, Vec2::new(x, y), 8.0, 20.0)
}

// ── render_all ────────────────────────────────────────────────────────────────

#[test]
fn render_is_ordered_by_z_and_stable_for_ties() {
    let mut registry = EntityRegistry::new();
    for (x, z) in [(0.0, 5), (1.0, -10), (2.0, 0), (3.0, 5), (4.0, 0)] {
        registry.add(bullet_at(x, 0.0).with_z(z));
    }

    let mut sink = RecordingSink::default();
    registry.render_all(&mut sink);

    let order: Vec<(i32, f32)> = sink
        .submitted
        .iter()
        .map(|(_, z, position)| (*z, position.x))
        .collect();
    assert_eq!(order, vec![(-10, 1.0), (0, 2.0), (0, 4.0), (5, 0.0), (5, 3.0)]);
}

#[test]
fn render_skips_destroyed_entities() {
    let mut registry = EntityRegistry::new();
    let doomed = registry.add(bullet_at(0.0, 0.0));
    registry.add(bullet_at(1.0, 0.0));
    registry.get_mut(doomed).unwrap().destroy();

    let mut sink = RecordingSink::default();
    registry.render_all(&mut sink);
    assert_eq!(sink.submitted.len(), 1);
    assert_eq!(sink.submitted[0].2.x, 1.0);
}

// ── add / remove ──────────────────────────────────────────────────────────────

#[test]
fn removing_twice_is_a_no_op() {
    let mut registry = EntityRegistry::new();
    let id = registry.add(bullet_at(0.0, 0.0));
    registry.add(bullet_at(1.0, 0.0));

    assert!(registry.remove(id).is_some());
    assert!(registry.remove(id).is_none());
    assert_eq!(registry.len(), 1);
    assert!(!registry.contains(id));
}

#[test]
fn removal_keeps_insertion_order() {
    let mut registry = EntityRegistry::new();
    let a = registry.add(bullet_at(0.0, 0.0));
    let b = registry.add(bullet_at(1.0, 0.0));
    let c = registry.add(bullet_at(2.0, 0.0));

    registry.remove(b);
    assert_eq!(registry.ids(), vec![a, c]);
}

#[test]
fn ids_are_never_reused() {
    let mut registry = EntityRegistry::new();
    let first = registry.add(bullet_at(0.0, 0.0));
    registry.remove(first);
    let second = registry.add(bullet_at(0.0, 0.0));
    assert_ne!(first, second);
}

#[test]
fn scheduled_removals_apply_later() {
    let mut registry = EntityRegistry::new();
    let a = registry.add(bullet_at(0.0, 0.0));
    let b = registry.add(bullet_at(1.0, 0.0));

    registry.schedule_removal(a);
    registry.schedule_removal(a);
    assert!(registry.contains(a));

    assert_eq!(registry.apply_removals(), vec![a]);
    assert_eq!(registry.ids(), vec![b]);
    assert!(registry.apply_removals().is_empty());
}

#[test]
fn pair_mut_rejects_same_and_missing_ids() {
    let mut registry = EntityRegistry::new();
    let a = registry.add(bullet_at(0.0, 0.0));
    let b = registry.add(bullet_at(1.0, 0.0));

    assert!(registry.pair_mut(a, a).is_none());

    let (first, second) = registry.pair_mut(b, a).unwrap();
    assert_eq!(first.position.x, 1.0);
    assert_eq!(second.position.x, 0.0);

    registry.remove(b);
    assert!(registry.pair_mut(a, b).is_none());
}

// ── prune ─────────────────────────────────────────────────────────────────────

#[test]
fn spawned_and_destroyed_in_one_frame_is_pruned() {
    let mut registry = EntityRegistry::new();
    let id = registry.add(bullet_at(0.0, 100.0));
    registry.get_mut(id).unwrap().destroy();

    assert_eq!(registry.prune(), vec![id]);
    assert!(registry.is_empty());
}

#[test]
fn off_view_threshold_is_exclusive() {
    let mut registry = EntityRegistry::new();
    let gone = registry.add(bullet_at(0.0, -51.0));
    let kept = registry.add(bullet_at(0.0, -49.0));
    let edge = registry.add(bullet_at(0.0, -50.0));

    let removed = registry.prune();
    assert_eq!(removed, vec![gone]);
    assert!(registry.contains(kept));
    assert!(registry.contains(edge));
}

#[test]
fn scenery_is_never_pruned_for_position() {
    let mut registry = EntityRegistry::new();
    let backdrop = registry.add(
        Entity::new(EntityKind::Background, Vec2::new(0.0, -500.0), 10.0, 10.0)
            .with_caps(Capabilities::SCENERY),
    );
    registry.prune();
    assert!(registry.contains(backdrop));
}
