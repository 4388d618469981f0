use std::time::Duration;

mod entity;
mod entity_kinds;
mod error;
mod registry;
mod state;

pub use entity::Entity;
pub use entity_kinds::{EntityBehavior, EntityKinds, Inert, Prototype};
pub use error::EntityError;
pub use registry::EntityRegistry;
pub use state::{EntityState, StateRow};

/// Tag selecting the behavior of an entity.
pub type EntityKind = u16;

/// Longest time any entity call waits for the state lock.
pub const LOCK_TIMEOUT: Duration = Duration::from_millis(100);

pub const DEFAULT_TICK_PERIOD: u64 = 10;

/// Semantic ids of built-in state rows.
pub mod sets {
    pub const IS_DYNAMIC: u64 = 1;
    pub const TICK_PERIOD: u64 = 2;

    /// First id free for application rows.
    pub const USER_START: u64 = 64;

    pub const SCALE_ONE: i64 = 1;
}
