//! World and solver doubles for E2E testing

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::warn;

use lockstep_shared::{
    ids, sets, ActorId, Command, DebugValue, Entity, EntityId, EntityKind, EntityKinds,
    EntityRegistry, Event, Inert, Prototype, Solver, World,
};

/// Entity kind spawned for every reserved actor.
pub const AVATAR: EntityKind = 1;

/// Row of an avatar accumulating the actor's debug values.
pub const SCORE: u64 = sets::USER_START;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// World that records every performed event and keeps one avatar entity per
/// actor.
pub struct TestWorld {
    kinds: EntityKinds,
    registry: EntityRegistry,
    performed: Mutex<Vec<Event>>,
}

impl Default for TestWorld {
    fn default() -> Self {
        let mut kinds = EntityKinds::new();
        let avatar = Prototype::new(Arc::new(Inert)).with_row(SCORE, sets::SCALE_ONE, 0);
        if let Err(err) = kinds.add(AVATAR, avatar) {
            warn!("{}", err);
        }

        Self {
            kinds,
            registry: EntityRegistry::new(),
            performed: Mutex::new(Vec::new()),
        }
    }
}

impl TestWorld {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn performed(&self) -> Vec<Event> {
        lock(&self.performed).clone()
    }

    pub fn performed_ids(&self) -> Vec<u16> {
        lock(&self.performed).iter().map(|event| event.id).collect()
    }

    /// Debug values performed so far, with the actor that sent them.
    pub fn debug_values(&self) -> Vec<(Option<ActorId>, i64)> {
        lock(&self.performed)
            .iter()
            .filter_map(|event| DebugValue::from_event(event).map(|debug| (event.actor, debug.value)))
            .collect()
    }

    pub fn has_actor(&self, actor: ActorId) -> bool {
        self.registry.contains(actor)
    }

    pub fn avatar(&self, actor: ActorId) -> Option<Arc<Entity>> {
        self.registry.get(actor)
    }

    pub fn score(&self, actor: ActorId) -> Option<i64> {
        self.avatar(actor).and_then(|avatar| avatar.get_by_id(SCORE))
    }
}

impl World for TestWorld {
    fn reserve(&self, hint: Option<ActorId>) -> ActorId {
        let spawned = self
            .kinds
            .spawn(AVATAR)
            .and_then(|avatar| self.registry.spawn(avatar, hint));

        match spawned {
            Ok((actor, _)) => actor,
            Err(err) => {
                warn!("{}", err);
                self.registry.reserve(hint)
            }
        }
    }

    fn release(&self, actor: ActorId) {
        self.registry.remove(actor);
    }

    fn perform(&self, event: &Event) {
        lock(&self.performed).push(event.clone());

        // remotes learn about actors from the event stream only
        match (event.id, event.actor) {
            (ids::SLOT_CREATE, Some(actor)) if !self.has_actor(actor) => {
                self.reserve(Some(actor));
                return;
            }
            (ids::SLOT_REMOVE, Some(actor)) => {
                self.release(actor);
                return;
            }
            (ids::DEBUG, _) => {}
            _ => return,
        }
        let (Some(debug), Some(avatar)) = (
            DebugValue::from_event(event),
            event.actor.and_then(|actor| self.avatar(actor)),
        ) else {
            return;
        };
        if let Some(index) = avatar.index_of(SCORE) {
            avatar.apply_delta(index, debug.value);
            avatar.adjust();
        }
    }

    fn remove(&self, entity: EntityId) {
        self.registry.remove(entity);
    }
}

/// What a [`RecordingSolver`] was handed.
#[derive(Clone, Debug, Default)]
pub struct SolverLog {
    pub seed: Option<u64>,
    pub applied: Vec<Event>,
    pub elapsed_msec: u64,
}

/// Solver that only records its inputs. Clones share the same log, so a
/// test can keep one while the host owns another.
#[derive(Clone, Default)]
pub struct RecordingSolver {
    log: Arc<Mutex<SolverLog>>,
}

impl RecordingSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> SolverLog {
        lock(&self.log).clone()
    }
}

impl Solver for RecordingSolver {
    fn apply(&mut self, event: Event) {
        lock(&self.log).applied.push(event);
    }

    fn set_seed(&mut self, seed: u64) {
        lock(&self.log).seed = Some(seed);
    }

    fn advance(&mut self, delta_msec: u64) {
        lock(&self.log).elapsed_msec += delta_msec;
    }
}
