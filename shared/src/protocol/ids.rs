//! Native command ids and their names.
//!
//! A command id indexes [`TABLE`]. Applications add their own commands
//! starting at [`USER_START`].

pub const UNDEFINED: u16 = u16::MAX;

// Control commands. These carry no order header and are handled as soon as
// they arrive.
pub const PUBLIC_KEY: u16 = 1;
pub const REQUEST_EVENTS: u16 = 2;
pub const PING: u16 = 3;

// Ordered commands.
pub const SERVER_IDLE: u16 = 4;
pub const SERVER_INIT: u16 = 5;
pub const SERVER_LAUNCH: u16 = 6;
pub const SERVER_ACTION: u16 = 7;
pub const SERVER_PAUSE: u16 = 8;
pub const SERVER_CLOCK: u16 = 9;
pub const SERVER_SEED: u16 = 10;
pub const SERVER_QUIT: u16 = 11;
pub const CLIENT_ENTER: u16 = 12;
pub const CLIENT_LEAVE: u16 = 13;
pub const CLIENT_READY: u16 = 14;
pub const CLIENT_DESYNC: u16 = 15;
pub const SLOT_CREATE: u16 = 16;
pub const SLOT_REMOVE: u16 = 17;
pub const DEBUG: u16 = 18;

pub const NATIVE_COUNT: u16 = 19;

/// First id available to application commands.
pub const USER_START: u16 = 64;

pub const TABLE: [&str; NATIVE_COUNT as usize] = [
    "",
    "public-key",
    "request-events",
    "ping",
    "server-idle",
    "server-init",
    "server-launch",
    "server-action",
    "server-pause",
    "server-clock",
    "server-seed",
    "server-quit",
    "client-enter",
    "client-leave",
    "client-ready",
    "client-desync",
    "slot-create",
    "slot-remove",
    "debug",
];

/// Cipher kinds offered in `public-key`.
pub const CIPHER_X25519_CHACHA20: u16 = 1;

/// Control commands are stateless: no order, no time, no actor.
pub fn is_control(id: u16) -> bool {
    matches!(id, PUBLIC_KEY | REQUEST_EVENTS | PING)
}

pub fn name_by_id(id: u16) -> Option<&'static str> {
    match TABLE.get(id as usize) {
        Some(name) if !name.is_empty() => Some(name),
        _ => None,
    }
}

pub fn id_by_name(name: &str) -> Option<u16> {
    if name.is_empty() {
        return None;
    }
    TABLE
        .iter()
        .position(|entry| *entry == name)
        .map(|index| index as u16)
}
