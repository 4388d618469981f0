use crate::protocol::{
    event::{self, Event},
    ids,
};

/// A typed command with a fixed id and a self-describing payload.
///
/// `scan` is the structural check the factory runs before decoding: it
/// validates the embedded id and, through [`Command::payload_fits`], the
/// payload length.
pub trait Command: Sized {
    const ID: u16;

    /// Whether a payload of `len` bytes can hold this command.
    fn payload_fits(len: usize) -> bool;

    fn write_payload(&self, out: &mut Vec<u8>);

    fn read_payload(payload: &[u8]) -> Option<Self>;

    fn name() -> &'static str {
        ids::name_by_id(Self::ID).unwrap_or("")
    }

    fn scan(seq: &[u8]) -> bool {
        if event::id_of(seq) != Some(Self::ID) {
            return false;
        }
        let offset = event::payload_offset(Self::ID);
        seq.len() >= offset && Self::payload_fits(seq.len() - offset)
    }

    fn to_event(&self) -> Event {
        let mut payload = Vec::new();
        self.write_payload(&mut payload);
        Event::new(Self::ID, payload)
    }

    fn encode(&self) -> Vec<u8> {
        self.to_event().encode()
    }

    fn from_event(event: &Event) -> Option<Self> {
        if event.id != Self::ID || !Self::payload_fits(event.payload.len()) {
            return None;
        }
        Self::read_payload(&event.payload)
    }

    fn decode(seq: &[u8]) -> Option<Self> {
        if !Self::scan(seq) {
            return None;
        }
        Self::read_payload(&seq[event::payload_offset(Self::ID)..])
    }
}

/// Declares commands without payload.
macro_rules! empty_commands {
    ($($(#[$meta:meta])* $name:ident => $id:path;)*) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
            pub struct $name;

            impl Command for $name {
                const ID: u16 = $id;

                fn payload_fits(len: usize) -> bool {
                    len == 0
                }

                fn write_payload(&self, _out: &mut Vec<u8>) {}

                fn read_payload(_payload: &[u8]) -> Option<Self> {
                    Some(Self)
                }
            }
        )*
    };
}

pub(crate) use empty_commands;
