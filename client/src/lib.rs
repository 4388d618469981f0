//! # Lockstep Client
//! A remote that connects to a lockstep host, submits ordered events and
//! performs the host's authoritative event stream in log order.

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
        ids, BasicFactory, ChannelConfig, Command, DatagramSocket, Event, Factory, ServerState,
        Solver, World,
    };
}

mod error;
mod remote;
mod remote_config;

pub use error::RemoteError;
pub use remote::Remote;
pub use remote_config::RemoteConfig;
