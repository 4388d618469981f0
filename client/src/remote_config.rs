use std::default::Default;

use lockstep_shared::ChannelConfig;

/// Contains Config properties which will be used by a Remote
#[derive(Clone, Debug)]
pub struct RemoteConfig {
    /// Used to configure the channel with the host
    pub channel: ChannelConfig,
    /// Whether to offer a key exchange when connecting. Traffic is encrypted
    /// once the host replies.
    pub encrypt: bool,
    /// Local UDP port to bind. 0 picks any free port.
    pub port: u16,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            channel: ChannelConfig::default(),
            encrypt: true,
            port: 0,
        }
    }
}
