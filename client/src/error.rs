use thiserror::Error;

use lockstep_shared::{CipherError, TransportError};

/// Errors that can occur while running a Remote
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The datagram socket failed
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The cipher session could not generate a key pair
    #[error("Cipher error: {0}")]
    Cipher(#[from] CipherError),

    /// `connect` was called on a remote that is already connected
    #[error("Remote is already connected to {address}")]
    AlreadyConnected { address: std::net::SocketAddr },
}
