use crate::{
    protocol::Event,
    types::{ActorId, EntityId},
};

/// The simulation world, as seen by the transport.
///
/// Game logic lives behind this trait. The host reserves actor ids through
/// it and, while the server is still preparing, performs decoded events on
/// it directly.
pub trait World: Send + Sync {
    /// Reserve a new actor id. `hint` asks for a specific id, which the
    /// world may ignore.
    fn reserve(&self, hint: Option<ActorId>) -> ActorId;

    /// Release an actor id so it no longer resolves.
    fn release(&self, actor: ActorId);

    /// Perform an event synchronously.
    fn perform(&self, event: &Event);

    /// Remove an entity, for entities that destroy themselves.
    fn remove(&self, _entity: EntityId) {}
}

/// Deterministic stepper that replays ordered events during live play.
pub trait Solver: Send {
    /// Hand over an ordered event. The solver assigns its execution time and
    /// applies it when its clock reaches it.
    fn apply(&mut self, event: Event);

    fn set_seed(&mut self, _seed: u64) {}

    /// Advance the simulation clock.
    fn advance(&mut self, _delta_msec: u64) {}
}
