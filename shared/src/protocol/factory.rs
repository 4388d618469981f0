use std::fmt::Write;

use crate::protocol::{
    command::Command,
    commands::{
        ClientDesync, ClientEnter, ClientLeave, ClientReady, DebugValue, Ping, PublicKey,
        RequestEvents, ServerAction, ServerClock, ServerIdle, ServerInit, ServerLaunch,
        ServerPause, ServerQuit, ServerSeed, SlotCreate, SlotRemove,
    },
    error::ParseError,
    event::{self, Event},
    ids, serial,
};

/// Structural checks for the native commands, in decoding priority.
const NATIVE_SCANS: &[fn(&[u8]) -> bool] = &[
    PublicKey::scan,
    ClientDesync::scan,
    RequestEvents::scan,
    ServerIdle::scan,
    ServerInit::scan,
    ServerLaunch::scan,
    ServerAction::scan,
    ServerPause::scan,
    ServerClock::scan,
    ServerSeed::scan,
    ServerQuit::scan,
    Ping::scan,
    ClientEnter::scan,
    ClientLeave::scan,
    ClientReady::scan,
    DebugValue::scan,
    SlotCreate::scan,
    SlotRemove::scan,
];

/// Turns byte sequences into events and back.
///
/// The default text methods use the native command table; factories for an
/// application command set override `decode` (usually falling back to
/// [`BasicFactory::decode_native`]) and the name lookups.
pub trait Factory: Send + Sync {
    /// Decode a sequence into an event, or `None` if it matches no known
    /// command.
    fn decode(&self, seq: &[u8]) -> Option<Event>;

    fn id_by_name(&self, name: &str) -> Option<u16> {
        ids::id_by_name(name)
    }

    fn name_by_id(&self, id: u16) -> Option<&str> {
        ids::name_by_id(id)
    }

    /// Parse one line of text form.
    fn parse(&self, command: &str) -> Result<Vec<u8>, ParseError> {
        parse_line(|name| self.id_by_name(name), command, 1)
    }

    /// Print a sequence in text form. Unknown ids print as an empty string.
    fn print(&self, seq: &[u8]) -> String {
        print_with(|id| self.name_by_id(id), seq)
    }

    /// Parse one command per line. Blank lines are skipped.
    fn parse_multi(&self, commands: &str) -> Result<Vec<Vec<u8>>, ParseError> {
        commands
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| parse_line(|name| self.id_by_name(name), line, n + 1))
            .collect()
    }

    fn print_multi(&self, seqs: &[&[u8]]) -> String {
        let mut out = String::new();
        for seq in seqs {
            out.push_str(&self.print(seq));
            out.push('\n');
        }
        out
    }
}

/// Factory for the native command set.
#[derive(Clone, Copy, Debug, Default)]
pub struct BasicFactory;

impl BasicFactory {
    pub fn new() -> Self {
        Self
    }

    pub fn decode_native(seq: &[u8]) -> Option<Event> {
        if NATIVE_SCANS.iter().any(|scan| scan(seq)) {
            Event::from_bytes(seq)
        } else {
            None
        }
    }
}

impl Factory for BasicFactory {
    fn decode(&self, seq: &[u8]) -> Option<Event> {
        Self::decode_native(seq)
    }
}

/// Parse `name hh hh ...` into the command id followed by the listed bytes.
pub fn parse_line<F>(id_by_name: F, command: &str, line: usize) -> Result<Vec<u8>, ParseError>
where
    F: Fn(&str) -> Option<u16>,
{
    let mut tokens = command.split_whitespace();

    let Some(name) = tokens.next() else {
        return Err(ParseError::MissingName { line });
    };

    let Some(id) = id_by_name(name) else {
        return Err(ParseError::UnknownCommand {
            name: name.to_string(),
            line,
        });
    };

    let mut seq = Vec::with_capacity(event::ID_SIZE + command.len() / 3);
    serial::push_u16(&mut seq, id);

    for token in tokens {
        let digits = token.trim_start_matches("0x");
        match u8::from_str_radix(digits, 16) {
            Ok(byte) if !digits.is_empty() && digits.len() <= 2 => seq.push(byte),
            _ => {
                return Err(ParseError::InvalidByte {
                    token: token.to_string(),
                    line,
                })
            }
        }
    }

    Ok(seq)
}

pub fn print_with<'a, F>(name_by_id: F, seq: &[u8]) -> String
where
    F: Fn(u16) -> Option<&'a str>,
{
    let Some(name) = event::id_of(seq).and_then(name_by_id) else {
        return String::new();
    };

    let mut out = String::with_capacity(name.len() + seq.len() * 3);
    out.push_str(name);
    for byte in &seq[event::ID_SIZE..] {
        let _ = write!(out, " {:02x}", byte);
    }
    out
}
