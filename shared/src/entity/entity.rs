use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError, Weak,
    },
    thread,
    time::{Duration, Instant},
};

use log::error;

use crate::{
    entity::{
        entity_kinds::EntityBehavior, error::EntityError, state::EntityState, EntityKind,
        LOCK_TIMEOUT,
    },
    types::{EntityId, UNDEFINED},
    world::World,
};

/// Lock attempts that only yield before the wait starts sleeping.
const LOCK_SPINS: u32 = 16;

const LOCK_BACKOFF: Duration = Duration::from_micros(200);

/// A simulation object: a lockable bag of integer state rows with deferred
/// commits.
///
/// `get` observes committed values only. `set` and `apply_delta` stage a
/// delta which `adjust` folds in, so a whole update round becomes visible at
/// once. Every locking call waits at most [`LOCK_TIMEOUT`]; the `try_*`
/// variants report a timeout, the plain ones log it and fall back.
pub struct Entity {
    id: AtomicU64,
    kind: EntityKind,
    behavior: Arc<dyn EntityBehavior>,
    state: RwLock<EntityState>,
    world: RwLock<Option<Weak<dyn World>>>,
}

impl Entity {
    pub fn new(kind: EntityKind, behavior: Arc<dyn EntityBehavior>) -> Self {
        Self::from_state(
            kind,
            behavior,
            EntityState::new(false, super::DEFAULT_TICK_PERIOD),
        )
    }

    pub fn from_state(
        kind: EntityKind,
        behavior: Arc<dyn EntityBehavior>,
        state: EntityState,
    ) -> Self {
        Self {
            id: AtomicU64::new(UNDEFINED),
            kind,
            behavior,
            state: RwLock::new(state),
            world: RwLock::new(None),
        }
    }

    /// The id assigned by the world, if any.
    pub fn id(&self) -> Option<EntityId> {
        match self.id.load(Ordering::Acquire) {
            UNDEFINED => None,
            id => Some(id),
        }
    }

    /// Assign the id. Refused once an id is set.
    pub fn set_id(&self, id: EntityId) -> Result<(), EntityError> {
        self.id
            .compare_exchange(UNDEFINED, id, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|current| EntityError::AlreadyAssigned { current })
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn set_world(&self, world: &Arc<dyn World>) {
        *self.world.write().unwrap_or_else(|err| err.into_inner()) = Some(Arc::downgrade(world));
    }

    pub fn reset_world(&self) {
        *self.world.write().unwrap_or_else(|err| err.into_inner()) = None;
    }

    /// The owning world, or `None` once it is gone.
    pub fn world(&self) -> Option<Arc<dyn World>> {
        self.world
            .read()
            .unwrap_or_else(|err| err.into_inner())
            .as_ref()
            .and_then(Weak::upgrade)
    }

    // Locking

    /// Try to take the read lock within [`LOCK_TIMEOUT`]
    pub fn try_state(&self) -> Result<RwLockReadGuard<'_, EntityState>, EntityError> {
        let deadline = Instant::now() + LOCK_TIMEOUT;
        let mut attempt = 0;
        loop {
            match self.state.try_read() {
                Ok(state) => return Ok(state),
                Err(TryLockError::Poisoned(err)) => return Ok(err.into_inner()),
                Err(TryLockError::WouldBlock) => self.wait_until(deadline, &mut attempt)?,
            }
        }
    }

    /// Try to take the write lock within [`LOCK_TIMEOUT`]
    pub fn try_state_mut(&self) -> Result<RwLockWriteGuard<'_, EntityState>, EntityError> {
        let deadline = Instant::now() + LOCK_TIMEOUT;
        let mut attempt = 0;
        loop {
            match self.state.try_write() {
                Ok(state) => return Ok(state),
                Err(TryLockError::Poisoned(err)) => return Ok(err.into_inner()),
                Err(TryLockError::WouldBlock) => self.wait_until(deadline, &mut attempt)?,
            }
        }
    }

    /// Back off before the next lock attempt: a few yields, then short
    /// sleeps, until the deadline passes.
    fn wait_until(&self, deadline: Instant, attempt: &mut u32) -> Result<(), EntityError> {
        if Instant::now() >= deadline {
            return Err(EntityError::LockTimeout {
                entity: self.id.load(Ordering::Relaxed),
                timeout_ms: LOCK_TIMEOUT.as_millis() as u64,
            });
        }
        *attempt += 1;
        if *attempt <= LOCK_SPINS {
            thread::yield_now();
        } else {
            thread::sleep(LOCK_BACKOFF);
        }
        Ok(())
    }

    fn read_or<T>(&self, fallback: T, f: impl FnOnce(&EntityState) -> T) -> T {
        match self.try_state() {
            Ok(state) => f(&state),
            Err(err) => {
                error!("{}", err);
                fallback
            }
        }
    }

    fn write_or_skip(&self, f: impl FnOnce(&mut EntityState)) {
        match self.try_state_mut() {
            Ok(mut state) => f(&mut state),
            Err(err) => error!("{}", err),
        }
    }

    // Rows

    pub fn try_get(&self, index: usize) -> Result<i64, EntityError> {
        Ok(self.try_state()?.get(index))
    }

    /// Committed value of a row. Zero if the lock times out.
    pub fn get(&self, index: usize) -> i64 {
        self.read_or(0, |state| state.get(index))
    }

    pub fn get_by_id(&self, id: u64) -> Option<i64> {
        self.read_or(None, |state| state.get_by_id(id))
    }

    pub fn try_set(&self, index: usize, value: i64) -> Result<(), EntityError> {
        self.try_state_mut()?.set(index, value);
        Ok(())
    }

    pub fn set(&self, index: usize, value: i64) {
        self.write_or_skip(|state| state.set(index, value))
    }

    pub fn try_apply_delta(&self, index: usize, delta: i64) -> Result<(), EntityError> {
        self.try_state_mut()?.apply_delta(index, delta);
        Ok(())
    }

    pub fn apply_delta(&self, index: usize, delta: i64) {
        self.write_or_skip(|state| state.apply_delta(index, delta))
    }

    /// Try to commit every staged delta. Returns whether anything changed.
    pub fn try_adjust(&self) -> Result<bool, EntityError> {
        Ok(self.try_state_mut()?.adjust())
    }

    pub fn adjust(&self) -> bool {
        match self.try_adjust() {
            Ok(is_changed) => is_changed,
            Err(err) => {
                error!("{}", err);
                false
            }
        }
    }

    pub fn index_of(&self, id: u64) -> Option<usize> {
        self.read_or(None, |state| state.index_of(id))
    }

    pub fn id_of(&self, index: usize) -> u64 {
        self.read_or(UNDEFINED, |state| state.id_of(index))
    }

    pub fn scale_of(&self, index: usize) -> i64 {
        self.read_or(0, |state| state.scale_of(index))
    }

    pub fn row_count(&self) -> usize {
        self.read_or(0, EntityState::len)
    }

    // Compound operations

    /// Run a compound read of this entity's kind under the read lock.
    pub fn request(&self, id: u64, args: &[u8]) -> Result<Vec<u8>, EntityError> {
        let state = self.try_state()?;
        self.behavior.do_request(self.kind, &state, id, args)
    }

    /// Run a compound modification of this entity's kind under the write
    /// lock.
    pub fn modify(&self, id: u64, args: &[u8]) -> Result<(), EntityError> {
        let mut state = self.try_state_mut()?;
        self.behavior.do_modify(self.kind, &mut state, id, args)
    }

    // Ticking

    pub fn is_changed(&self) -> bool {
        self.read_or(false, EntityState::is_changed)
    }

    pub fn is_dynamic(&self) -> bool {
        self.read_or(false, EntityState::is_dynamic)
    }

    pub fn tick_period(&self) -> u64 {
        self.read_or(0, EntityState::tick_period)
    }

    pub fn set_dynamic(&self, is_dynamic: bool) {
        self.write_or_skip(|state| state.set(EntityState::N_IS_DYNAMIC, i64::from(is_dynamic)))
    }

    pub fn set_tick_period(&self, tick_period: u64) {
        self.write_or_skip(|state| state.set(EntityState::N_TICK_PERIOD, tick_period as i64))
    }

    pub fn set_clock(&self, clock: u64) {
        self.write_or_skip(|state| state.set_clock(clock))
    }

    /// Restart the countdown from the tick period.
    pub fn reset_clock(&self) {
        self.write_or_skip(|state| {
            let period = state.tick_period();
            state.set_clock(period);
        })
    }

    /// Count down one step. True when the tick period expired.
    pub fn clock(&self) -> bool {
        let mut fired = false;
        self.write_or_skip(|state| fired = state.step_clock());
        fired
    }

    /// Run the kind's live loop if this entity is dynamic.
    pub fn tick(&self, world: &dyn World) {
        if self.is_dynamic() {
            self.behavior.tick(self, world);
        }
    }

    /// Force observers to treat the entity as changed.
    pub fn desync(&self) {
        self.write_or_skip(EntityState::mark_changed)
    }

    /// Remove this entity from its world.
    pub fn self_destruct(&self, world: &dyn World) {
        if let Some(id) = self.id() {
            world.remove(id);
        }
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id())
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
