use std::net::SocketAddr;

use thiserror::Error;

/// Errors that can occur during datagram transport operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Failed to bind the local socket
    #[error("Failed to bind datagram socket to {address}: {reason}")]
    Bind { address: SocketAddr, reason: String },

    /// Failed to send a datagram
    #[error("Failed to send datagram to {address}: {reason}")]
    Send { address: SocketAddr, reason: String },

    /// Failed to receive a datagram
    #[error("Failed to receive datagram: {reason}")]
    Receive { reason: String },

    /// The destination is not reachable through this socket
    #[error("Address {address} is not reachable through this socket")]
    Unreachable { address: SocketAddr },
}
