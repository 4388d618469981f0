pub mod raw_peer;
pub mod session;

pub use packet_exchange::{exchange, exchange_n_times};
pub use raw_peer::{indexed, RawPeer};
pub use session::{start_host, start_remote, HOST_PORT, TICK_MSEC};
