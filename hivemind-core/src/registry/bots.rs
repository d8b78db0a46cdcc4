//! Bot entity registry: dense storage with id recycling.
//!
//! Entities live in a dense `Vec` so full sweeps never see holes. A
//! per-id slot table maps stable ids to dense indices; removal swaps the
//! last entity into the freed slot and pushes the id onto a LIFO free list.

use std::collections::HashMap;
use std::ops::{Index, IndexMut};

use tracing::{debug, warn};

use super::entity::BotEntity;
use crate::error::{HivemindError, Result};
use crate::types::EntityId;

/// Owns every [`BotEntity`] for the session.
#[derive(Debug, Default)]
pub struct BotRegistry {
    entities: Vec<BotEntity>,
    /// `slots[id]` is the dense index of entity `id`, or `None` when free.
    slots: Vec<Option<usize>>,
    free_ids: Vec<u32>,
    by_external: HashMap<u64, EntityId>,
}

impl BotRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry with room for `capacity` entities.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entities: Vec::with_capacity(capacity),
            slots: Vec::with_capacity(capacity),
            free_ids: Vec::new(),
            by_external: HashMap::with_capacity(capacity),
        }
    }

    /// Create a new active entity and return its id.
    ///
    /// Reuses the most recently freed id if there is one.
    pub fn add(&mut self) -> EntityId {
        let id = match self.free_ids.pop() {
            Some(raw) => EntityId(raw),
            None => {
                let raw = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
                self.slots.push(None);
                EntityId(raw)
            }
        };
        self.slots[id.index()] = Some(self.entities.len());
        self.entities.push(BotEntity::new(id));
        debug!(entity = %id, live = self.entities.len(), "Bot entity added");
        id
    }

    /// Create an entity and map `external_id` to it.
    ///
    /// If `external_id` was already mapped, the mapping moves to the new entity.
    pub fn add_with_external(&mut self, external_id: u64) -> EntityId {
        let id = self.add();
        if let Some(previous) = self.by_external.insert(external_id, id) {
            warn!(external_id, previous = %previous, entity = %id, "External id remapped");
            if let Some(old) = self.get_mut(previous) {
                old.external_id = None;
            }
        }
        self[id].external_id = Some(external_id);
        id
    }

    /// Remove an entity. Returns `false` if `id` is not live.
    ///
    /// Relationship fields on other entities are not touched; separate the
    /// entity from its group first (see [`crate::hive::separate_from_group`]).
    pub fn remove(&mut self, id: EntityId) -> bool {
        let Some(dense) = self.slots.get(id.index()).copied().flatten() else {
            return false;
        };
        let removed = self.entities.swap_remove(dense);
        if let Some(moved) = self.entities.get(dense) {
            self.slots[moved.id.index()] = Some(dense);
        }
        self.slots[id.index()] = None;
        self.free_ids.push(id.0);
        if let Some(external) = removed.external_id {
            if self.by_external.get(&external) == Some(&id) {
                self.by_external.remove(&external);
            }
        }
        debug!(entity = %id, live = self.entities.len(), "Bot entity removed");
        true
    }

    /// Reset to a pristine empty state, forgetting all ids.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.slots.clear();
        self.free_ids.clear();
        self.by_external.clear();
    }

    /// Number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// No live entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Whether `id` is live.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.dense_index(id).is_some()
    }

    /// Dense index of `id`.
    #[must_use]
    pub fn dense_index(&self, id: EntityId) -> Option<usize> {
        self.slots.get(id.index()).copied().flatten()
    }

    /// Look up a live entity.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&BotEntity> {
        self.dense_index(id).map(|i| &self.entities[i])
    }

    /// Look up a live entity mutably.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut BotEntity> {
        let i = self.dense_index(id)?;
        Some(&mut self.entities[i])
    }

    /// Look up a live entity, or fail with [`HivemindError::EntityNotFound`].
    ///
    /// # Errors
    /// Returns `EntityNotFound` if `id` is not live.
    pub fn entity(&self, id: EntityId) -> Result<&BotEntity> {
        self.get(id).ok_or(HivemindError::EntityNotFound(id))
    }

    /// Mutable counterpart of [`Self::entity`].
    ///
    /// # Errors
    /// Returns `EntityNotFound` if `id` is not live.
    pub fn entity_mut(&mut self, id: EntityId) -> Result<&mut BotEntity> {
        self.get_mut(id).ok_or(HivemindError::EntityNotFound(id))
    }

    /// Resolve a host-issued id.
    #[must_use]
    pub fn try_get_by_external(&self, external_id: u64) -> Option<EntityId> {
        self.by_external.get(&external_id).copied()
    }

    /// Resolve a host-issued id or fail.
    ///
    /// # Errors
    /// Returns `ExternalIdNotFound` if nothing is mapped to `external_id`.
    pub fn by_external(&self, external_id: u64) -> Result<EntityId> {
        self.try_get_by_external(external_id)
            .ok_or(HivemindError::ExternalIdNotFound(external_id))
    }

    /// Dense, gap-free view of all live entities.
    #[must_use]
    pub fn as_slice(&self) -> &[BotEntity] {
        &self.entities
    }

    /// Mutable dense view. Do not add or remove while holding this.
    pub fn as_mut_slice(&mut self) -> &mut [BotEntity] {
        &mut self.entities
    }

    /// Iterate live entities in dense order.
    pub fn iter(&self) -> std::slice::Iter<'_, BotEntity> {
        self.entities.iter()
    }

    /// Iterate live entities mutably in dense order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, BotEntity> {
        self.entities.iter_mut()
    }

    /// Ids of all live entities in dense order.
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter().map(|e| e.id)
    }
}

impl Index<EntityId> for BotRegistry {
    type Output = BotEntity;

    /// # Panics
    /// Panics if `id` is not live.
    fn index(&self, id: EntityId) -> &Self::Output {
        match self.get(id) {
            Some(entity) => entity,
            None => panic!("no live entity {id}"),
        }
    }
}

impl IndexMut<EntityId> for BotRegistry {
    fn index_mut(&mut self, id: EntityId) -> &mut Self::Output {
        match self.get_mut(id) {
            Some(entity) => entity,
            None => panic!("no live entity {id}"),
        }
    }
}

impl<'a> IntoIterator for &'a BotRegistry {
    type Item = &'a BotEntity;
    type IntoIter = std::slice::Iter<'a, BotEntity>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_dense(registry: &BotRegistry) {
        for (i, entity) in registry.iter().enumerate() {
            assert_eq!(registry.dense_index(entity.id), Some(i));
        }
    }

    #[test]
    fn ids_are_sequential_when_nothing_freed() {
        let mut registry = BotRegistry::new();
        let a = registry.add();
        let b = registry.add();
        let c = registry.add();
        assert_eq!((a.0, b.0, c.0), (0, 1, 2));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn freed_ids_are_reused_last_freed_first() {
        let mut registry = BotRegistry::new();
        let ids: Vec<_> = (0..5).map(|_| registry.add()).collect();
        assert!(registry.remove(ids[1]));
        assert!(registry.remove(ids[3]));
        assert_eq!(registry.add(), ids[3]);
        assert_eq!(registry.add(), ids[1]);
        assert_eq!(registry.add(), EntityId(5));
    }

    #[test]
    fn remove_swaps_last_into_hole() {
        let mut registry = BotRegistry::new();
        let a = registry.add();
        let _b = registry.add();
        let c = registry.add();
        assert!(registry.remove(a));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.as_slice()[0].id, c);
        assert_dense(&registry);
    }

    #[test]
    fn remove_rejects_unknown_and_repeated() {
        let mut registry = BotRegistry::new();
        let a = registry.add();
        assert!(!registry.remove(EntityId(42)));
        assert!(registry.remove(a));
        assert!(!registry.remove(a));
    }

    #[test]
    fn recycled_entity_has_default_state() {
        let mut registry = BotRegistry::new();
        let a = registry.add();
        registry[a].sensors.in_combat = true;
        registry[a].consecutive_failed_assignments = 4;
        registry.remove(a);
        let again = registry.add();
        assert_eq!(again, a);
        assert!(!registry[again].sensors.in_combat);
        assert_eq!(registry[again].consecutive_failed_assignments, 0);
    }

    #[test]
    fn sparse_external_ids_map_without_dense_allocation() {
        let mut registry = BotRegistry::new();
        let big = registry.add_with_external(4_000_000_000);
        let small = registry.add_with_external(7);
        assert_eq!(registry.try_get_by_external(4_000_000_000), Some(big));
        assert_eq!(registry.try_get_by_external(7), Some(small));
        assert_eq!(registry.try_get_by_external(8), None);
        assert!(registry.slots.len() <= 2);
    }

    #[test]
    fn removing_entity_drops_external_mapping() {
        let mut registry = BotRegistry::new();
        let id = registry.add_with_external(99);
        registry.remove(id);
        assert!(registry.try_get_by_external(99).is_none());
        assert!(matches!(
            registry.by_external(99),
            Err(HivemindError::ExternalIdNotFound(99))
        ));
    }

    #[test]
    fn remapping_external_id_moves_it() {
        let mut registry = BotRegistry::new();
        let first = registry.add_with_external(10);
        let second = registry.add_with_external(10);
        assert_eq!(registry.try_get_by_external(10), Some(second));
        assert_eq!(registry[first].external_id, None);
        // Removing the stale owner must not drop the live mapping.
        registry.remove(first);
        assert_eq!(registry.try_get_by_external(10), Some(second));
    }

    #[test]
    fn clear_resets_everything() {
        let mut registry = BotRegistry::new();
        let a = registry.add_with_external(1);
        registry.add();
        registry.remove(a);
        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.try_get_by_external(1).is_none());
        assert_eq!(registry.add(), EntityId(0));
        assert_eq!(registry.add(), EntityId(1));
    }

    #[test]
    fn typed_lookup_reports_missing() {
        let registry = BotRegistry::new();
        assert!(matches!(
            registry.entity(EntityId(0)),
            Err(HivemindError::EntityNotFound(EntityId(0)))
        ));
    }

    #[test]
    #[should_panic(expected = "no live entity")]
    fn direct_index_panics_on_missing() {
        let registry = BotRegistry::new();
        let _ = &registry[EntityId(0)];
    }
}
