use thiserror::Error;

/// Errors that can occur while framing outbound sequences
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncoderError {
    /// The sequence does not start with a command id
    #[error("Cannot frame a sequence of {len} bytes. At least a 2-byte command id is required")]
    MissingId { len: usize },

    /// The payload does not fit in the 16-bit length field
    #[error("Payload of {payload_size} bytes exceeds the frame limit of {max} bytes")]
    FrameTooLarge { payload_size: usize, max: usize },
}

/// Errors that can occur while peeling frames off an inbound buffer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecoderError {
    /// A frame declares more bytes than were buffered. The stream lost sync
    /// and the whole buffer was discarded (SECURITY: possibly malicious data)
    #[error("Frame declares {declared} payload bytes but only {available} are buffered. Inbound buffer discarded")]
    Desync { declared: usize, available: usize },
}
