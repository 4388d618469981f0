use std::net::SocketAddr;

use lockstep_shared::{append_frame, protocol::set_index, DatagramSocket, Decoder};

use crate::local_socket::{LocalNetwork, LocalSocket};

/// Plaintext endpoint that speaks raw frames, for driving a host or a
/// remote one datagram at a time.
pub struct RawPeer {
    socket: LocalSocket,
    target: SocketAddr,
    decoder: Decoder,
}

impl RawPeer {
    pub fn new(network: &LocalNetwork, port: u16, target: SocketAddr) -> Self {
        Self {
            socket: network.socket(port),
            target,
            decoder: Decoder::new(),
        }
    }

    pub fn address(&self) -> SocketAddr {
        self.socket.address()
    }

    /// Send the sequences framed into one datagram.
    pub fn send(&mut self, seqs: &[Vec<u8>]) {
        let mut datagram = Vec::new();
        for seq in seqs {
            if let Err(err) = append_frame(&mut datagram, seq) {
                panic!("unable to frame sequence: {}", err);
            }
        }
        self.send_datagram(&datagram);
    }

    pub fn send_datagram(&mut self, datagram: &[u8]) {
        if let Err(err) = self.socket.send_to(&self.target, datagram) {
            panic!("unable to send: {}", err);
        }
    }

    /// Every frame received since the last call.
    pub fn receive(&mut self) -> Vec<Vec<u8>> {
        while let Ok(Some((_, datagram))) = self.socket.receive() {
            self.decoder.extend(datagram);
        }

        let mut frames = Vec::new();
        while let Ok(Some(frame)) = self.decoder.next_frame() {
            frames.push(frame);
        }
        frames
    }
}

/// Stamp an encoded ordered command with an absolute index.
pub fn indexed(mut seq: Vec<u8>, index: u64) -> Vec<u8> {
    assert!(set_index(&mut seq, index), "not an ordered command");
    seq
}
