use std::net::SocketAddr;

use lockstep_shared::{
    ActorId, CipherError, CipherSession, Decoder, DecoderError, Encoder, EventQueue,
};

/// Host-side state of one remote connection.
pub struct Slot {
    pub(crate) address: SocketAddr,
    pub(crate) actor: Option<ActorId>,
    pub(crate) decoder: Decoder,
    pub(crate) queue: EventQueue,
    pub(crate) encoder: Encoder,
    pub(crate) cipher: CipherSession,
    /// Set once every byte queued up to the key exchange reply went out in
    /// clear, so the peer can install the key before encrypted traffic
    /// arrives.
    pub(crate) encrypt: bool,
    /// Encoder bytes that still have to be sent in clear.
    pub(crate) clear_len: usize,
}

impl Slot {
    pub fn try_new(address: SocketAddr, max_queue_ahead: u64) -> Result<Self, CipherError> {
        Ok(Self {
            address,
            actor: None,
            decoder: Decoder::new(),
            queue: EventQueue::new(max_queue_ahead),
            encoder: Encoder::new(),
            cipher: CipherSession::try_new()?,
            encrypt: false,
            clear_len: 0,
        })
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn actor(&self) -> Option<ActorId> {
        self.actor
    }

    pub fn is_encrypted(&self) -> bool {
        self.encrypt
    }

    /// Peel every complete frame off the inbound buffer. Stops at the first
    /// desync, which discards the rest of the buffer.
    pub(crate) fn take_frames(&mut self) -> (Vec<Vec<u8>>, Option<DecoderError>) {
        let mut frames = Vec::new();
        loop {
            match self.decoder.next_frame() {
                Ok(Some(seq)) => frames.push(seq),
                Ok(None) => return (frames, None),
                Err(err) => return (frames, Some(err)),
            }
        }
    }
}
