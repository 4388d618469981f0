//! # Lockstep Shared
//! Common functionality shared between lockstep-server & lockstep-client
//! crates: the entity state model, event ordering, the wire protocol, the
//! cipher session and the datagram transport.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

#[macro_use]
extern crate cfg_if;

mod cipher;
mod connection;
mod entity;
mod event_order;
pub mod protocol;
mod transport;
mod types;
mod world;

pub use cipher::{CipherError, CipherSession, COUNTER_SIZE, TAG_SIZE};
pub use connection::{
    channel_config::ChannelConfig,
    decoder::Decoder,
    encoder::{append_frame, chunk_len, Encoder, LENGTH_SIZE, MAX_FRAME_PAYLOAD},
    error::{DecoderError, EncoderError},
    event_queue::{Admission, EventQueue},
};
pub use entity::{
    sets, Entity, EntityBehavior, EntityError, EntityKind, EntityKinds, EntityRegistry,
    EntityState, Inert, Prototype, StateRow, DEFAULT_TICK_PERIOD, LOCK_TIMEOUT,
};
pub use event_order::{EventOrder, EventOrderError};
pub use protocol::{
    commands::{
        ClientDesync, ClientEnter, ClientLeave, ClientReady, DebugValue, Ping, PublicKey,
        RequestEvents, ServerAction, ServerClock, ServerIdle, ServerInit, ServerLaunch,
        ServerPause, ServerQuit, ServerSeed, SlotCreate, SlotRemove, MAX_KEY_SIZE,
        REQUEST_EVENTS_MAX,
    },
    ids, BasicFactory, Command, Event, Factory, ParseError,
};
pub use transport::{DatagramSocket, TransportError, MAX_DATAGRAM_SIZE};
pub use types::{ActorId, EntityId, ServerState, UNDEFINED};
pub use world::{Solver, World};

cfg_if! {
    if #[cfg(feature = "transport_udp")] {
        pub use transport::UdpNode;
    }
}
