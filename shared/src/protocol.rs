mod command;
pub mod commands;
mod error;
mod event;
mod factory;
pub mod ids;
pub mod serial;

pub use command::Command;
pub use error::ParseError;
pub use event::{
    actor_of, id_of, index_of, payload_offset, set_actor, set_index, sort_events, time_of, Event,
    HEADER_SIZE, ID_SIZE,
};
pub use factory::{parse_line, print_with, BasicFactory, Factory};
