//! Pairwise AABB collision between two entity sets.
//!
//! The detector only reads geometry and flags; any consequence of a hit
//! (destroying a projectile, damaging an enemy) belongs to the callback.

use crate::entities::{Entity, Rect};
use crate::registry::{EntityId, EntityRegistry};
use crate::Result;

/// Half-open overlap: rectangles that only share an edge do not collide.
pub fn overlaps(a: &Rect, b: &Rect) -> bool {
    a.x < b.right() && b.x < a.right() && a.y < b.bottom() && b.y < a.bottom()
}

/// How pairs are enumerated. Implementations must call `on_hit` once per
/// overlapping pair in (A order, then B order) and stop pairing an A entity
/// as soon as it is destroyed or no longer collidable.
pub trait CollisionStrategy {
    fn scan<F>(
        &self,
        registry: &mut EntityRegistry,
        set_a: &[EntityId],
        set_b: &[EntityId],
        on_hit: F,
    ) -> Result<()>
    where
        F: FnMut(HitPair<'_>) -> Result<()>;
}

/// One overlapping pair handed to the collision callback.
pub struct HitPair<'a> {
    pub a_id: EntityId,
    pub a: &'a mut Entity,
    pub b_id: EntityId,
    pub b: &'a mut Entity,
}

/// Compares every A against every B.
#[derive(Clone, Copy, Debug, Default)]
pub struct BruteForceAabb;

impl CollisionStrategy for BruteForceAabb {
    fn scan<F>(
        &self,
        registry: &mut EntityRegistry,
        set_a: &[EntityId],
        set_b: &[EntityId],
        mut on_hit: F,
    ) -> Result<()>
    where
        F: FnMut(HitPair<'_>) -> Result<()>,
    {
        for &a_id in set_a {
            for &b_id in set_b {
                // re-checked every time: the callback may have destroyed `a`
                match registry.get(a_id) {
                    Some(a) if a.can_collide() => {}
                    _ => break,
                }
                let Some((a, b)) = registry.pair_mut(a_id, b_id) else {
                    continue;
                };
                if !b.can_collide() || !overlaps(&a.bounds(), &b.bounds()) {
                    continue;
                }
                on_hit(HitPair { a_id, a, b_id, b })?;
            }
        }
        Ok(())
    }
}

/// Collision query bound to one "A" set, e.g. all live bullets.
pub struct AabbCollisionDetector<S = BruteForceAabb> {
    strategy: S,
    set_a: Vec<EntityId>,
}

impl AabbCollisionDetector<BruteForceAabb> {
    pub fn new(set_a: Vec<EntityId>) -> Self {
        AabbCollisionDetector::with_strategy(BruteForceAabb, set_a)
    }
}

impl<S: CollisionStrategy> AabbCollisionDetector<S> {
    pub fn with_strategy(strategy: S, set_a: Vec<EntityId>) -> Self {
        AabbCollisionDetector { strategy, set_a }
    }

    /// Run `on_hit` for every overlapping (A, B) pair. A callback error aborts
    /// the scan and is returned as-is.
    pub fn detect_collisions<F>(
        &self,
        registry: &mut EntityRegistry,
        set_b: &[EntityId],
        on_hit: F,
    ) -> Result<()>
    where
        F: FnMut(HitPair<'_>) -> Result<()>,
    {
        self.strategy.scan(registry, &self.set_a, set_b, on_hit)
    }
}
