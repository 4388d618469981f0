use std::net::SocketAddr;

mod error;

cfg_if! {
    if #[cfg(feature = "transport_udp")] {
        mod udp_node;
        pub use udp_node::UdpNode;
    }
}

pub use error::TransportError;

/// Largest datagram a node will read.
pub const MAX_DATAGRAM_SIZE: usize = 65536;

/// A non-blocking, unreliable datagram endpoint.
pub trait DatagramSocket: Send {
    /// Address the socket is bound to, if any
    fn local_addr(&self) -> Option<SocketAddr>;

    /// Sends a datagram. Delivery is not guaranteed.
    fn send_to(&mut self, address: &SocketAddr, payload: &[u8]) -> Result<(), TransportError>;

    /// Receives a datagram, or `None` if nothing is waiting
    fn receive(&mut self) -> Result<Option<(SocketAddr, &[u8])>, TransportError>;
}
