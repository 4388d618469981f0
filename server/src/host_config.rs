use std::default::Default;

use lockstep_shared::ChannelConfig;

/// Contains Config properties which will be used by the Host
#[derive(Clone, Debug)]
pub struct HostConfig {
    /// Used to configure the channel with every slot
    pub channel: ChannelConfig,
    /// Command ids accepted from slots. Empty accepts every command.
    pub allowed_commands: Vec<u16>,
    /// Duration of one simulation tick, announced with `server-clock`.
    pub tick_duration_msec: u64,
    /// Simulation seed announced with `server-seed`. Picked at random when
    /// `None`.
    pub seed: Option<u64>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            channel: ChannelConfig::default(),
            allowed_commands: Vec::new(),
            tick_duration_msec: 10,
            seed: None,
        }
    }
}
