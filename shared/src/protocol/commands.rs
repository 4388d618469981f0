//! The native command set.

use crate::{
    protocol::{
        command::{empty_commands, Command},
        event::{self, ID_SIZE},
        ids, serial,
    },
    types::{ActorId, UNDEFINED},
};

/// Largest public key a `public-key` command may carry.
pub const MAX_KEY_SIZE: usize = 1024;

/// Largest number of indices a single `request-events` may list.
pub const REQUEST_EVENTS_MAX: usize = 64;

// Control commands

/// Key exchange offer or reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey {
    pub cipher: u16,
    pub key: Vec<u8>,
}

impl PublicKey {
    pub fn new(cipher: u16, key: &[u8]) -> Self {
        let size = key.len().min(MAX_KEY_SIZE);
        Self {
            cipher,
            key: key[..size].to_vec(),
        }
    }

    pub fn cipher_of(seq: &[u8]) -> Option<u16> {
        serial::rd_u16(seq, ID_SIZE)
    }

    pub fn key_of(seq: &[u8]) -> &[u8] {
        seq.get(ID_SIZE + 2..).unwrap_or(&[])
    }
}

impl Command for PublicKey {
    const ID: u16 = ids::PUBLIC_KEY;

    fn payload_fits(len: usize) -> bool {
        (2..=2 + MAX_KEY_SIZE).contains(&len)
    }

    fn write_payload(&self, out: &mut Vec<u8>) {
        serial::push_u16(out, self.cipher);
        out.extend_from_slice(&self.key);
    }

    fn read_payload(payload: &[u8]) -> Option<Self> {
        Some(Self {
            cipher: serial::rd_u16(payload, 0)?,
            key: payload[2..].to_vec(),
        })
    }
}

/// Asks the peer to resend the listed absolute event indices.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestEvents {
    pub events: Vec<u64>,
}

impl RequestEvents {
    pub fn new(events: &[u64]) -> Self {
        let count = events.len().min(REQUEST_EVENTS_MAX);
        Self {
            events: events[..count].to_vec(),
        }
    }
}

impl Command for RequestEvents {
    const ID: u16 = ids::REQUEST_EVENTS;

    fn payload_fits(len: usize) -> bool {
        len >= 2 && (len - 2) % 8 == 0 && (len - 2) / 8 <= REQUEST_EVENTS_MAX
    }

    // The count field must agree with the payload length.
    fn scan(seq: &[u8]) -> bool {
        if event::id_of(seq) != Some(Self::ID) || seq.len() < ID_SIZE {
            return false;
        }
        let payload = &seq[ID_SIZE..];
        match serial::rd_u16(payload, 0) {
            Some(count) => {
                Self::payload_fits(payload.len()) && payload.len() == 2 + 8 * count as usize
            }
            None => false,
        }
    }

    fn write_payload(&self, out: &mut Vec<u8>) {
        serial::push_u16(out, self.events.len() as u16);
        for index in &self.events {
            serial::push_u64(out, *index);
        }
    }

    fn read_payload(payload: &[u8]) -> Option<Self> {
        let count = serial::rd_u16(payload, 0)? as usize;
        if payload.len() != 2 + 8 * count {
            return None;
        }
        let events = (0..count)
            .map(|i| serial::rd_u64(payload, 2 + 8 * i))
            .collect::<Option<Vec<_>>>()?;
        Some(Self { events })
    }
}

/// Echoed back verbatim by the host.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ping {
    pub payload: Vec<u8>,
}

impl Command for Ping {
    const ID: u16 = ids::PING;

    fn payload_fits(len: usize) -> bool {
        len <= u16::MAX as usize - ID_SIZE
    }

    fn write_payload(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.payload);
    }

    fn read_payload(payload: &[u8]) -> Option<Self> {
        Some(Self {
            payload: payload.to_vec(),
        })
    }
}

// Ordered commands

empty_commands! {
    ServerIdle => ids::SERVER_IDLE;
    ServerInit => ids::SERVER_INIT;
    /// Starts the match. Propagated to every remote.
    ServerLaunch => ids::SERVER_LAUNCH;
    ServerAction => ids::SERVER_ACTION;
    ServerPause => ids::SERVER_PAUSE;
    ServerQuit => ids::SERVER_QUIT;
    ClientEnter => ids::CLIENT_ENTER;
    ClientLeave => ids::CLIENT_LEAVE;
    ClientReady => ids::CLIENT_READY;
    ClientDesync => ids::CLIENT_DESYNC;
    SlotRemove => ids::SLOT_REMOVE;
}

/// Sets the tick duration of every participant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ServerClock {
    pub tick_duration_msec: u64,
}

impl ServerClock {
    pub fn new(tick_duration_msec: u64) -> Self {
        Self { tick_duration_msec }
    }
}

impl Command for ServerClock {
    const ID: u16 = ids::SERVER_CLOCK;

    fn payload_fits(len: usize) -> bool {
        len == 8
    }

    fn write_payload(&self, out: &mut Vec<u8>) {
        serial::push_u64(out, self.tick_duration_msec);
    }

    fn read_payload(payload: &[u8]) -> Option<Self> {
        serial::rd_u64(payload, 0).map(Self::new)
    }
}

/// Sets the simulation random seed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ServerSeed {
    pub seed: u64,
}

impl ServerSeed {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl Command for ServerSeed {
    const ID: u16 = ids::SERVER_SEED;

    fn payload_fits(len: usize) -> bool {
        len == 8
    }

    fn write_payload(&self, out: &mut Vec<u8>) {
        serial::push_u64(out, self.seed);
    }

    fn read_payload(payload: &[u8]) -> Option<Self> {
        serial::rd_u64(payload, 0).map(Self::new)
    }
}

/// Announces a new slot. The header actor is the slot's actor; `recipient`
/// is rewritten by the host for every receiver to that receiver's own actor
/// id, so each remote can tell its own slot apart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SlotCreate {
    pub recipient: Option<ActorId>,
}

impl SlotCreate {
    pub fn is_local(&self, slot_actor: Option<ActorId>) -> bool {
        self.recipient.is_some() && self.recipient == slot_actor
    }

    /// Rewrite the recipient of an encoded `slot-create` in place.
    pub fn alter(seq: &mut [u8], recipient: Option<ActorId>) -> bool {
        Self::scan(seq)
            && serial::wr_u64(
                seq,
                event::payload_offset(Self::ID),
                recipient.unwrap_or(UNDEFINED),
            )
    }
}

impl Command for SlotCreate {
    const ID: u16 = ids::SLOT_CREATE;

    fn payload_fits(len: usize) -> bool {
        len == 8
    }

    fn write_payload(&self, out: &mut Vec<u8>) {
        serial::push_u64(out, self.recipient.unwrap_or(UNDEFINED));
    }

    fn read_payload(payload: &[u8]) -> Option<Self> {
        let recipient = serial::rd_u64(payload, 0)?;
        Some(Self {
            recipient: (recipient != UNDEFINED).then_some(recipient),
        })
    }
}

/// Carries a single value. Used for diagnostics and transport tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DebugValue {
    pub value: i64,
}

impl DebugValue {
    pub fn new(value: i64) -> Self {
        Self { value }
    }
}

impl Command for DebugValue {
    const ID: u16 = ids::DEBUG;

    fn payload_fits(len: usize) -> bool {
        len == 8
    }

    fn write_payload(&self, out: &mut Vec<u8>) {
        serial::push_i64(out, self.value);
    }

    fn read_payload(payload: &[u8]) -> Option<Self> {
        serial::rd_i64(payload, 0).map(Self::new)
    }
}
