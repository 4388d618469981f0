//! # Lockstep Server
//! A host that accepts client slots over UDP, keeps the authoritative
//! ordered event log, and feeds accepted events to the world while preparing
//! or to the solver during live play.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

#[macro_use]
extern crate cfg_if;

pub mod shared {
    pub use lockstep_shared::{
        ids, BasicFactory, ChannelConfig, Command, DatagramSocket, Event, EventOrder, Factory,
        ServerState, Solver, World,
    };
}

mod error;
mod host;
mod host_config;
mod slot;

pub use error::HostError;
pub use host::Host;
pub use host_config::HostConfig;
pub use slot::Slot;
