use std::default::Default;

/// Contains Config properties shared by both ends of a channel
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Largest plain chunk put into a single datagram, in bytes. Encrypted
    /// chunks are larger by the cipher overhead.
    pub chunk_size: usize,
    /// How far beyond the queue baseline an ordered event index may reach
    /// before it is rejected as malicious.
    pub max_queue_ahead: u64,
    /// Number of missing indices that triggers a `request-events`.
    pub resend_threshold: usize,
    /// Largest number of indices requested at once.
    pub resend_batch: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1200,
            max_queue_ahead: 4096,
            resend_threshold: 1,
            resend_batch: crate::protocol::commands::REQUEST_EVENTS_MAX,
        }
    }
}
