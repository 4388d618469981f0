use thiserror::Error;

use lockstep_shared::{CipherError, TransportError};

/// Errors that can occur while running a Host
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The datagram socket failed
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// A slot could not create its cipher session
    #[error("Cipher error: {0}")]
    Cipher(#[from] CipherError),

    /// `listen` was called on a host that is already listening
    #[error("Host is already listening on port {port}")]
    AlreadyListening { port: u16 },
}
