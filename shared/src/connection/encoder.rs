use crate::protocol::{serial, ID_SIZE};

use super::error::EncoderError;

/// Size of the frame length prefix.
pub const LENGTH_SIZE: usize = 2;

/// Largest payload a single frame can carry.
pub const MAX_FRAME_PAYLOAD: usize = u16::MAX as usize;

/// Append one sequence to `buf` as `[len u16][id u16][payload]`. `len`
/// counts the payload only.
pub fn append_frame(buf: &mut Vec<u8>, seq: &[u8]) -> Result<(), EncoderError> {
    if seq.len() < ID_SIZE {
        return Err(EncoderError::MissingId { len: seq.len() });
    }

    let payload_size = seq.len() - ID_SIZE;
    if payload_size > MAX_FRAME_PAYLOAD {
        return Err(EncoderError::FrameTooLarge {
            payload_size,
            max: MAX_FRAME_PAYLOAD,
        });
    }

    buf.reserve(LENGTH_SIZE + seq.len());
    serial::push_u16(buf, payload_size as u16);
    buf.extend_from_slice(seq);
    Ok(())
}

/// Length of the largest prefix of `buf` that holds only whole frames and
/// is not longer than `max`. Zero if the first frame alone exceeds `max`.
pub fn chunk_len(buf: &[u8], max: usize) -> usize {
    let mut len = 0;

    while let Some(payload_size) = serial::rd_u16(buf, len) {
        let next = len + LENGTH_SIZE + ID_SIZE + payload_size as usize;
        if next > max || next > buf.len() {
            break;
        }
        len = next;
    }

    len
}

/// Outbound chunk buffer of one connection.
#[derive(Default)]
pub struct Encoder {
    buffer: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to frame a sequence onto the outbound buffer
    pub fn try_append(&mut self, seq: &[u8]) -> Result<(), EncoderError> {
        append_frame(&mut self.buffer, seq)
    }

    /// Frame a sequence onto the outbound buffer, logging and dropping it if
    /// it cannot be framed
    pub fn append(&mut self, seq: &[u8]) {
        if let Err(err) = self.try_append(seq) {
            log::warn!("Dropping outbound sequence: {}", err);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// The next chunk of at most `max` bytes, still buffered. Empty when the
    /// buffer is empty or its first frame does not fit.
    pub fn peek_chunk(&self, max: usize) -> &[u8] {
        &self.buffer[..chunk_len(&self.buffer, max)]
    }

    /// Drop the first `len` bytes, once they were sent.
    pub fn consume(&mut self, len: usize) {
        let len = len.min(self.buffer.len());
        self.buffer.drain(..len);
    }
}
