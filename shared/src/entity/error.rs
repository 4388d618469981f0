use thiserror::Error;

use crate::entity::EntityKind;

/// Errors that can occur during entity operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityError {
    /// The state lock could not be taken in time
    #[error("Timed out after {timeout_ms} ms waiting for the state lock of entity {entity}")]
    LockTimeout { entity: u64, timeout_ms: u64 },

    /// The kind was never added to `EntityKinds`
    #[error("Entity kind {kind} not registered. Must call `add()` on EntityKinds during start-up")]
    UnknownKind { kind: EntityKind },

    /// The kind was added twice
    #[error("Entity kind {kind} is already registered")]
    DuplicateKind { kind: EntityKind },

    /// The entity kind does not handle this request
    #[error("Entity kind {kind} does not support request {request}")]
    UnsupportedRequest { kind: EntityKind, request: u64 },

    /// The entity kind does not handle this modification
    #[error("Entity kind {kind} does not support modification {modification}")]
    UnsupportedModification { kind: EntityKind, modification: u64 },

    /// The request or modification arguments are malformed
    #[error("Invalid arguments for entity kind {kind}, operation {operation}")]
    InvalidArguments { kind: EntityKind, operation: u64 },

    /// The entity id was set by its world already
    #[error("Entity already has id {current}. An id may only be assigned once")]
    AlreadyAssigned { current: u64 },
}
