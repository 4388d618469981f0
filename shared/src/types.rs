/// Externally visible identity of a connected participant.
pub type ActorId = u64;

/// Identity of an entity inside its world.
pub type EntityId = u64;

/// Wire value used for every "undefined" index, time or id.
pub const UNDEFINED: u64 = u64::MAX;

/// Run state shared by the host and its remotes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ServerState {
    /// Before the match: events are performed directly on the world.
    #[default]
    Prepare,
    /// Live play: events go through the solver.
    Action,
    Pause,
}
