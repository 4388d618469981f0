use std::{
    io::ErrorKind,
    net::{Ipv4Addr, SocketAddr, UdpSocket},
};

use log::info;

use super::{error::TransportError, DatagramSocket, MAX_DATAGRAM_SIZE};

/// Non-blocking UDP socket.
pub struct UdpNode {
    socket: UdpSocket,
    buffer: Box<[u8]>,
}

impl UdpNode {
    /// Bind to `port` on every interface. Port 0 picks any free port.
    pub fn bind(port: u16) -> Result<Self, TransportError> {
        Self::bind_to(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))
    }

    pub fn bind_to(address: SocketAddr) -> Result<Self, TransportError> {
        let bind_error = |err: std::io::Error| TransportError::Bind {
            address,
            reason: err.to_string(),
        };

        let socket = UdpSocket::bind(address).map_err(bind_error)?;
        socket.set_nonblocking(true).map_err(bind_error)?;

        info!("UDP node bound to {:?}", socket.local_addr().ok());

        Ok(Self {
            socket,
            buffer: vec![0; MAX_DATAGRAM_SIZE].into_boxed_slice(),
        })
    }

    pub fn port(&self) -> u16 {
        self.local_addr().map_or(0, |address| address.port())
    }
}

impl DatagramSocket for UdpNode {
    fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.local_addr().ok()
    }

    fn send_to(&mut self, address: &SocketAddr, payload: &[u8]) -> Result<(), TransportError> {
        match self.socket.send_to(payload, address) {
            Ok(_) => Ok(()),
            // A full send buffer drops the datagram, as the network would.
            Err(err) if err.kind() == ErrorKind::WouldBlock => Ok(()),
            Err(err) => Err(TransportError::Send {
                address: *address,
                reason: err.to_string(),
            }),
        }
    }

    fn receive(&mut self) -> Result<Option<(SocketAddr, &[u8])>, TransportError> {
        loop {
            match self.socket.recv_from(&mut self.buffer) {
                Ok((len, address)) => return Ok(Some((address, &self.buffer[..len]))),
                Err(err) if err.kind() == ErrorKind::WouldBlock => return Ok(None),
                // Windows reports ICMP port unreachable on the next read.
                Err(err) if err.kind() == ErrorKind::ConnectionReset => continue,
                Err(err) => {
                    return Err(TransportError::Receive {
                        reason: err.to_string(),
                    })
                }
            }
        }
    }
}
