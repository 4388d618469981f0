use crate::{
    event_order::EventOrder,
    protocol::{ids, serial},
    types::{ActorId, UNDEFINED},
};

// Byte offsets inside an encoded sequence.
pub const N_ID: usize = 0;
pub const N_INDEX: usize = 2;
pub const N_TIME: usize = 10;
pub const N_ACTOR: usize = 18;

/// Size of the order header carried by every ordered command.
pub const HEADER_SIZE: usize = 26;

/// Size of the id prefix carried by every command.
pub const ID_SIZE: usize = 2;

/// Offset of the payload for a command with the given id.
pub fn payload_offset(id: u16) -> usize {
    if ids::is_control(id) {
        ID_SIZE
    } else {
        HEADER_SIZE
    }
}

pub fn id_of(seq: &[u8]) -> Option<u16> {
    serial::rd_u16(seq, N_ID)
}

/// The order index of an encoded event. Control commands and events that
/// were never given an index have none.
pub fn index_of(seq: &[u8]) -> Option<u64> {
    header_field(seq, N_INDEX)
}

/// The absolute execution time of an encoded event, if the solver assigned
/// one.
pub fn time_of(seq: &[u8]) -> Option<u64> {
    header_field(seq, N_TIME)
}

pub fn actor_of(seq: &[u8]) -> Option<ActorId> {
    header_field(seq, N_ACTOR)
}

/// Stamp the order index on an encoded ordered event.
pub fn set_index(seq: &mut [u8], index: u64) -> bool {
    is_ordered(seq) && serial::wr_u64(seq, N_INDEX, index)
}

pub fn set_actor(seq: &mut [u8], actor: Option<ActorId>) -> bool {
    is_ordered(seq) && serial::wr_u64(seq, N_ACTOR, actor.unwrap_or(UNDEFINED))
}

fn is_ordered(seq: &[u8]) -> bool {
    match id_of(seq) {
        Some(id) => !ids::is_control(id) && seq.len() >= HEADER_SIZE,
        None => false,
    }
}

fn header_field(seq: &[u8], offset: usize) -> Option<u64> {
    if !is_ordered(seq) {
        return None;
    }
    match serial::rd_u64(seq, offset) {
        Some(UNDEFINED) | None => None,
        value => value,
    }
}

fn defined(value: u64) -> Option<u64> {
    if value == UNDEFINED {
        None
    } else {
        Some(value)
    }
}

/// A serializable simulation command.
///
/// Ordered events carry their header on the wire:
/// `id u16 | index u64 | time u64 | actor u64 | payload`. Control commands
/// are encoded as `id u16 | payload`. Only the root index of the order
/// travels over the network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub id: u16,
    pub actor: Option<ActorId>,
    pub order: EventOrder,
    pub time: Option<u64>,
    pub payload: Vec<u8>,
}

impl Event {
    pub fn new(id: u16, payload: Vec<u8>) -> Self {
        Self {
            id,
            actor: None,
            order: EventOrder::empty(),
            time: None,
            payload,
        }
    }

    /// Split a sequence into header fields and payload. Any sequence with a
    /// complete header is accepted; structural validation of the payload is
    /// the factory's job.
    pub fn from_bytes(seq: &[u8]) -> Option<Self> {
        let id = id_of(seq)?;

        if ids::is_control(id) {
            return Some(Self::new(id, seq[ID_SIZE..].to_vec()));
        }

        if seq.len() < HEADER_SIZE {
            return None;
        }

        let index = defined(serial::rd_u64(seq, N_INDEX)?);
        Some(Self {
            id,
            actor: defined(serial::rd_u64(seq, N_ACTOR)?),
            order: index.map(EventOrder::new).unwrap_or_default(),
            time: defined(serial::rd_u64(seq, N_TIME)?),
            payload: seq[HEADER_SIZE..].to_vec(),
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(payload_offset(self.id) + self.payload.len());
        serial::push_u16(&mut out, self.id);

        if !self.is_control() {
            serial::push_u64(&mut out, self.order.index().unwrap_or(UNDEFINED));
            serial::push_u64(&mut out, self.time.unwrap_or(UNDEFINED));
            serial::push_u64(&mut out, self.actor.unwrap_or(UNDEFINED));
        }

        out.extend_from_slice(&self.payload);
        out
    }

    pub fn is_control(&self) -> bool {
        ids::is_control(self.id)
    }

    pub fn index(&self) -> Option<u64> {
        self.order.index()
    }

    pub fn with_actor(mut self, actor: Option<ActorId>) -> Self {
        self.actor = actor;
        self
    }

    pub fn with_order(mut self, order: EventOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_time(mut self, time: Option<u64>) -> Self {
        self.time = time;
        self
    }
}

/// Sort events into their deterministic execution order. Events with equal
/// orders keep their relative position.
pub fn sort_events(events: &mut [Event]) {
    events.sort_by(|a, b| a.order.cmp(&b.order));
}
