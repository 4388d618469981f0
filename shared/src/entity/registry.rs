use std::{
    collections::BTreeMap,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::{
    entity::{entity::Entity, error::EntityError},
    types::EntityId,
};

/// Id-indexed entity store backing a world.
///
/// Ids are handed out by [`EntityRegistry::reserve`] and stay taken until
/// removed, whether or not an entity has been placed yet.
#[derive(Default)]
pub struct EntityRegistry {
    entities: RwLock<BTreeMap<EntityId, Option<Arc<Entity>>>>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<EntityId, Option<Arc<Entity>>>> {
        self.entities.read().unwrap_or_else(|err| err.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<EntityId, Option<Arc<Entity>>>> {
        self.entities.write().unwrap_or_else(|err| err.into_inner())
    }

    /// Reserve an id. `hint` is honored when it is free; otherwise the
    /// lowest free id is taken.
    pub fn reserve(&self, hint: Option<EntityId>) -> EntityId {
        let mut entities = self.write();
        let id = match hint {
            Some(id) if !entities.contains_key(&id) => id,
            _ => lowest_free(&entities),
        };
        entities.insert(id, None);
        id
    }

    /// Place an entity, assigning it an id.
    pub fn spawn(
        &self,
        entity: Entity,
        hint: Option<EntityId>,
    ) -> Result<(EntityId, Arc<Entity>), EntityError> {
        let id = match entity.id() {
            Some(id) => id,
            None => {
                let id = self.reserve(hint);
                entity.set_id(id)?;
                id
            }
        };
        let entity = Arc::new(entity);
        self.write().insert(id, Some(entity.clone()));
        Ok((id, entity))
    }

    pub fn get(&self, id: EntityId) -> Option<Arc<Entity>> {
        self.read().get(&id).cloned().flatten()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.read().contains_key(&id)
    }

    /// Release an id, returning the entity placed under it.
    pub fn remove(&self, id: EntityId) -> Option<Arc<Entity>> {
        let entity = self.write().remove(&id).flatten();
        if let Some(entity) = &entity {
            entity.reset_world();
        }
        entity
    }

    /// Number of taken ids.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn placed(&self) -> Vec<Arc<Entity>> {
        self.read().values().flatten().cloned().collect()
    }

    /// Commit staged deltas of every entity. Returns the ids that changed.
    pub fn adjust_all(&self) -> Vec<EntityId> {
        self.placed()
            .into_iter()
            .filter(|entity| entity.adjust())
            .filter_map(|entity| entity.id())
            .collect()
    }

    /// Step the clock of every dynamic entity and return those whose tick
    /// period expired, in id order.
    pub fn clock_dynamic(&self) -> Vec<Arc<Entity>> {
        self.placed()
            .into_iter()
            .filter(|entity| entity.is_dynamic() && entity.clock())
            .collect()
    }
}

fn lowest_free(entities: &BTreeMap<EntityId, Option<Arc<Entity>>>) -> EntityId {
    let mut id = 0;
    for taken in entities.keys() {
        if *taken != id {
            break;
        }
        id += 1;
    }
    id
}
