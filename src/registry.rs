//! Live-entity collection owned by a single game state.
//!
//! Entries are kept in insertion order; that order drives notification
//! delivery. Rendering sorts a view by z-order instead. Removals requested
//! while something else is walking the registry go through
//! [`EntityRegistry::schedule_removal`] and land on the next
//! [`EntityRegistry::apply_removals`] / [`EntityRegistry::prune`].

use log::{debug, warn};

use crate::entities::Entity;

/// Anything lower than this on screen has left the viewport for good.
pub const OFF_VIEW_Y: f32 = -50.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Presentation collaborator. Called once per visible entity per frame, in
/// ascending z-order.
pub trait RenderSink {
    fn submit(&mut self, entity: &Entity, z_order: i32);
}

#[derive(Debug, Default)]
pub struct EntityRegistry {
    entries: Vec<(EntityId, Entity)>,
    next_id: u64,
    pending_removals: Vec<EntityId>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entity: Entity) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        debug!("spawn {} as #{}", entity.kind_name(), id.0);
        self.entries.push((id, entity));
        id
    }

    /// Remove immediately. Removing an id that is not present is a no-op.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        match self.index_of(id) {
            Some(index) => {
                let (_, entity) = self.entries.remove(index);
                debug!("remove #{}", id.0);
                Some(entity)
            }
            None => {
                warn!("remove of unknown entity #{} ignored", id.0);
                None
            }
        }
    }

    /// Queue a removal for the next [`apply_removals`](Self::apply_removals).
    pub fn schedule_removal(&mut self, id: EntityId) {
        if !self.pending_removals.contains(&id) {
            self.pending_removals.push(id);
        }
    }

    pub fn apply_removals(&mut self) -> Vec<EntityId> {
        let pending = std::mem::take(&mut self.pending_removals);
        let mut removed = Vec::with_capacity(pending.len());
        for id in pending {
            if self.remove(id).is_some() {
                removed.push(id);
            }
        }
        removed
    }

    /// End-of-frame cleanup: applies queued removals, then drops destroyed
    /// entities and movable ones that went above [`OFF_VIEW_Y`].
    pub fn prune(&mut self) -> Vec<EntityId> {
        let mut removed = self.apply_removals();
        self.entries.retain(|(id, entity)| {
            let off_view = entity.caps.movable && entity.position.y < OFF_VIEW_Y;
            if entity.destroyed || off_view {
                removed.push(*id);
                false
            } else {
                true
            }
        });
        if !removed.is_empty() {
            debug!("pruned {} entities", removed.len());
        }
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.pending_removals.clear();
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        let index = self.index_of(id)?;
        Some(&self.entries[index].1)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let index = self.index_of(id)?;
        Some(&mut self.entries[index].1)
    }

    /// Two distinct entities borrowed mutably at once.
    pub fn pair_mut(&mut self, a: EntityId, b: EntityId) -> Option<(&mut Entity, &mut Entity)> {
        let i = self.index_of(a)?;
        let j = self.index_of(b)?;
        if i == j {
            return None;
        }
        if i < j {
            let (left, right) = self.entries.split_at_mut(j);
            Some((&mut left[i].1, &mut right[0].1))
        } else {
            let (left, right) = self.entries.split_at_mut(i);
            Some((&mut right[0].1, &mut left[j].1))
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entries.iter().map(|(id, entity)| (*id, entity))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut Entity)> {
        self.entries.iter_mut().map(|(id, entity)| (*id, entity))
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.entries.iter().map(|(id, _)| *id).collect()
    }

    /// Submit every live entity in non-decreasing z-order; ties keep
    /// insertion order.
    pub fn render_all(&self, sink: &mut dyn RenderSink) {
        let mut visible: Vec<&Entity> = self
            .entries
            .iter()
            .map(|(_, entity)| entity)
            .filter(|entity| !entity.destroyed)
            .collect();
        // sort_by_key is stable
        visible.sort_by_key(|entity| entity.z_order);
        for entity in visible {
            sink.submit(entity, entity.z_order);
        }
    }

    fn index_of(&self, id: EntityId) -> Option<usize> {
        self.entries.iter().position(|(entry, _)| *entry == id)
    }
}
