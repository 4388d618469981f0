use crate::protocol::{serial, ID_SIZE};

use super::{encoder::LENGTH_SIZE, error::DecoderError};

/// Inbound byte buffer of one connection. Peels `[len u16][id u16][payload]`
/// frames off the front and yields the `id + payload` sequence of each.
///
/// SECURITY: this buffer holds untrusted network data. A frame that declares
/// more bytes than are buffered fails the whole buffer, forcing the peer to
/// resend rather than guessing at a frame boundary.
#[derive(Default)]
pub struct Decoder {
    buffer: Vec<u8>,
    cursor: usize,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.compact();
        self.buffer.extend_from_slice(bytes);
    }

    /// Number of bytes not yet consumed
    pub fn len(&self) -> usize {
        self.buffer.len() - self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
    }

    /// Try to read the next frame. `Ok(None)` means fewer bytes than a frame
    /// header are left; they stay buffered until more data arrives.
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>, DecoderError> {
        if self.len() < LENGTH_SIZE + ID_SIZE {
            return Ok(None);
        }

        let declared = serial::rd_u16(&self.buffer, self.cursor).unwrap_or(0) as usize;
        let start = self.cursor + LENGTH_SIZE;
        let available = self.buffer.len() - start - ID_SIZE;

        if declared > available {
            self.clear();
            return Err(DecoderError::Desync {
                declared,
                available,
            });
        }

        let end = start + ID_SIZE + declared;
        let seq = self.buffer[start..end].to_vec();
        self.cursor = end;
        Ok(Some(seq))
    }

    fn compact(&mut self) {
        if self.cursor > 0 {
            self.buffer.drain(..self.cursor);
            self.cursor = 0;
        }
    }
}
