use std::{collections::HashMap, sync::Arc};

use crate::{
    entity::{
        entity::Entity,
        error::EntityError,
        state::{EntityState, StateRow},
        EntityKind,
    },
    world::World,
};

/// Per-kind behavior of an entity.
///
/// Handlers receive the state already locked by the [`Entity`] wrapper and
/// must not call back into the entity's own locking API.
pub trait EntityBehavior: Send + Sync {
    /// Compound read. Runs under the read lock.
    fn do_request(
        &self,
        kind: EntityKind,
        _state: &EntityState,
        id: u64,
        _args: &[u8],
    ) -> Result<Vec<u8>, EntityError> {
        Err(EntityError::UnsupportedRequest { kind, request: id })
    }

    /// Compound read-modify-write. Runs under the write lock.
    fn do_modify(
        &self,
        kind: EntityKind,
        _state: &mut EntityState,
        id: u64,
        _args: &[u8],
    ) -> Result<(), EntityError> {
        Err(EntityError::UnsupportedModification {
            kind,
            modification: id,
        })
    }

    /// Live loop of a dynamic entity. Called without any lock held.
    fn tick(&self, _entity: &Entity, _world: &dyn World) {}
}

/// Behavior of entities that only hold rows.
pub struct Inert;

impl EntityBehavior for Inert {}

/// Template every entity of a kind is cloned from.
#[derive(Clone)]
pub struct Prototype {
    state: EntityState,
    behavior: Arc<dyn EntityBehavior>,
}

impl Prototype {
    pub fn new(behavior: Arc<dyn EntityBehavior>) -> Self {
        Self {
            state: EntityState::new(false, crate::entity::DEFAULT_TICK_PERIOD),
            behavior,
        }
    }

    /// Make entities of this kind dynamic, ticking every `tick_period`
    /// clock steps.
    pub fn dynamic(mut self, tick_period: u64) -> Self {
        self.state = {
            let mut state = EntityState::new(true, tick_period);
            for row in &self.state.rows()[2..] {
                state.push_row(*row);
            }
            state
        };
        self
    }

    pub fn with_row(mut self, id: u64, scale: i64, value: i64) -> Self {
        self.state.push_row(StateRow::new(id, scale, value));
        self
    }

    pub fn state(&self) -> &EntityState {
        &self.state
    }
}

/// Registry of entity kinds, built once at start-up.
#[derive(Clone, Default)]
pub struct EntityKinds {
    prototypes: HashMap<EntityKind, Prototype>,
}

impl EntityKinds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: EntityKind, prototype: Prototype) -> Result<(), EntityError> {
        if self.prototypes.contains_key(&kind) {
            return Err(EntityError::DuplicateKind { kind });
        }
        self.prototypes.insert(kind, prototype);
        Ok(())
    }

    pub fn contains(&self, kind: EntityKind) -> bool {
        self.prototypes.contains_key(&kind)
    }

    /// Create a new entity from the prototype of `kind`. The entity has no
    /// id until a world assigns one.
    pub fn spawn(&self, kind: EntityKind) -> Result<Entity, EntityError> {
        let prototype = self
            .prototypes
            .get(&kind)
            .ok_or(EntityError::UnknownKind { kind })?;

        Ok(Entity::from_state(
            kind,
            prototype.behavior.clone(),
            prototype.state.clone(),
        ))
    }
}
